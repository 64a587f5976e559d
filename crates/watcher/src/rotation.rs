//! 로테이션 체인 탐색
//!
//! logrotate 등은 활성 파일을 `path.1`로 옮기고 `path`에 새 파일을 만듭니다.
//! [`RotationChain`]은 `path`, `path.1`, …, `path.N`을 순서대로 열어
//! 마지막으로 추적하던 물리 파일(device/inode)이 지금 어느 위치에 있는지 찾습니다.
//!
//! 인덱스 0이 가장 최신, N이 가장 오래된 파일입니다.

use std::ffi::OsString;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::checkpoint::FileIdentity;
use crate::error::WatcherError;

/// 기본 로테이션 추적 깊이
pub const DEFAULT_ROTATION_DEPTH: usize = 3;

/// 감시 경로와 번호가 붙은 로테이션 형제 파일들
#[derive(Debug, Clone)]
pub struct RotationChain {
    base: PathBuf,
    depth: usize,
}

/// 탐색 결과: 추적 파일의 위치와 열린 핸들
#[derive(Debug)]
pub struct Located {
    /// 체인 내 인덱스 (0 = 활성 파일)
    pub index: usize,
    /// 해당 위치의 경로
    pub path: PathBuf,
    /// 열린 파일 핸들
    pub file: File,
}

impl RotationChain {
    /// 새 로테이션 체인을 생성합니다.
    pub fn new(base: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            base: base.into(),
            depth,
        }
    }

    /// 활성 파일 경로
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 추적 깊이
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 체인 인덱스에 해당하는 경로 (`0` → `path`, `n` → `path.n`)
    pub fn path_at(&self, index: usize) -> PathBuf {
        if index == 0 {
            return self.base.clone();
        }
        let mut name = OsString::from(self.base.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// 이전 식별자와 같은 물리 파일을 체인에서 찾습니다.
    ///
    /// 존재하지 않는 형제 파일은 건너뜁니다. 그 외 I/O 에러는 그대로 전파합니다.
    /// 깊이 안에서 찾지 못하면 [`WatcherError::RotationLost`]를 반환합니다.
    pub fn locate(&self, prior: FileIdentity) -> Result<Located, WatcherError> {
        for index in 0..=self.depth {
            let path = self.path_at(index);
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(read_error(&path, source)),
            };

            let metadata = file.metadata().map_err(|e| read_error(&path, e))?;
            if FileIdentity::from_metadata(&metadata)? == prior {
                tracing::trace!(path = %path.display(), index, "tracked file located");
                return Ok(Located { index, path, file });
            }
        }

        Err(WatcherError::RotationLost {
            path: self.base.display().to_string(),
        })
    }
}

pub(crate) fn read_error(path: &Path, source: std::io::Error) -> WatcherError {
    WatcherError::Read {
        path: path.display().to_string(),
        source,
    }
}
