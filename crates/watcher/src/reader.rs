//! 라인 리더 -- 체크포인트 이후의 새 라인 읽기
//!
//! [`LineReader`]는 추적 중인 물리 파일을 로테이션 체인에서 찾은 뒤,
//! 그 파일의 체크포인트 오프셋부터 활성 파일 끝까지 고정 크기 버퍼로 읽어
//! 줄 단위로 나눕니다.
//!
//! # 읽기 순서
//! ```text
//! path.i (checkpoint offset부터) → path.(i-1) (0부터) → … → path (0부터)
//! ```
//!
//! 버퍼 경계에 걸친 라인은 다음 청크와 이어 붙입니다. 로테이션으로 밀려난
//! 파일 끝의 종결되지 않은 조각은 그 파일의 마지막 라인으로 내보내며, 서로 다른
//! 파일의 조각을 합치지는 않습니다.
//!
//! 활성 파일 끝의 조각은 아직 쓰는 중일 수 있으므로 버퍼보다 짧으면 내보내지 않고,
//! 조각이 시작하는 오프셋을 반환해 다음 poll에서 다시 읽습니다. 버퍼 이상 길이의
//! 조각은 종결자를 기다리지 않고 내보냅니다.
//!
//! 블로킹 I/O를 사용하므로 비동기 컨텍스트에서는 `spawn_blocking`으로 호출합니다.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::warn;

use crate::checkpoint::{Checkpoint, FileIdentity};
use crate::error::WatcherError;
use crate::rotation::{RotationChain, read_error};

/// 한 번의 읽기 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// 읽은 라인 (오래된 것부터)
    pub lines: Vec<String>,
    /// 읽기 이후의 위치 (활성 파일 기준)
    pub checkpoint: Checkpoint,
}

/// 고정 크기 버퍼 기반 라인 리더
#[derive(Debug)]
pub struct LineReader {
    chain: RotationChain,
    buf: Vec<u8>,
}

impl LineReader {
    /// 로테이션 체인과 버퍼 크기로 리더를 생성합니다.
    pub fn new(chain: RotationChain, buffer_size: usize) -> Self {
        Self {
            chain,
            buf: vec![0; buffer_size.max(1)],
        }
    }

    /// 로테이션 체인
    pub fn chain(&self) -> &RotationChain {
        &self.chain
    }

    /// 체크포인트 이후 추가된 모든 라인을 읽습니다.
    ///
    /// I/O 에러가 나면 그때까지 읽은 내용은 버리고 에러를 반환합니다.
    pub fn read_new(&mut self, checkpoint: &Checkpoint) -> Result<ReadOutcome, WatcherError> {
        let located = self.chain.locate(checkpoint.identity)?;
        let mut lines = Vec::new();

        let size = located
            .file
            .metadata()
            .map_err(|e| read_error(&located.path, e))?
            .len();
        let mut start = checkpoint.offset;
        if size < start {
            warn!(
                path = %located.path.display(),
                offset = start,
                size,
                "file shrank below checkpoint, assuming truncation and rereading from start"
            );
            start = 0;
        }

        let mut offset = self.read_file(
            &located.file,
            &located.path,
            start,
            located.index == 0,
            &mut lines,
        )?;
        let mut identity = checkpoint.identity;

        for index in (0..located.index).rev() {
            let path = self.chain.path_at(index);
            let file = File::open(&path).map_err(|e| read_error(&path, e))?;
            let metadata = file.metadata().map_err(|e| read_error(&path, e))?;
            identity = FileIdentity::from_metadata(&metadata)?;
            offset = self.read_file(&file, &path, 0, index == 0, &mut lines)?;
        }

        if located.index > 0 {
            tracing::debug!(
                path = %self.chain.base().display(),
                from_index = located.index,
                "followed rotation to active file"
            );
        }

        Ok(ReadOutcome {
            lines,
            checkpoint: Checkpoint { offset, identity },
        })
    }

    /// 파일 하나를 `start`부터 끝까지 읽어 라인을 추가하고, 소비한 위치를 반환합니다.
    ///
    /// `active`이면 버퍼보다 짧은 끝 조각을 남겨 두고 그 시작 오프셋을 반환합니다.
    fn read_file(
        &mut self,
        file: &File,
        path: &Path,
        start: u64,
        active: bool,
        lines: &mut Vec<String>,
    ) -> Result<u64, WatcherError> {
        let mut handle = file;
        handle
            .seek(SeekFrom::Start(start))
            .map_err(|e| read_error(path, e))?;

        let mut pos = start;
        let mut pending: Vec<u8> = Vec::new();
        loop {
            let n = match handle.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_error(path, e)),
            };
            pos += n as u64;

            let mut rest = &self.buf[..n];
            while let Some(nl) = rest.iter().position(|b| *b == b'\n') {
                pending.extend_from_slice(&rest[..nl]);
                lines.push(decode(&pending));
                pending.clear();
                rest = &rest[nl + 1..];
            }
            pending.extend_from_slice(rest);
        }

        if pending.is_empty() {
            return Ok(pos);
        }
        if active && pending.len() < self.buf.len() {
            return Ok(pos - pending.len() as u64);
        }
        lines.push(decode(&pending));
        Ok(pos)
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
