//! 체크포인트 저장소 -- 감시 파일별 읽기 위치 영속화
//!
//! 감시 경로마다 `{pos, dev, ino}` JSON 레코드 하나를 상태 디렉토리에 보관합니다.
//! 파일 이름은 감시 경로의 SHA-256 16진수 문자열입니다.
//!
//! 저장은 임시 파일에 쓴 뒤 rename하여 레코드 전체를 교체합니다.
//! 레코드가 없으면 오류가 아니라 처음부터 읽는 새 시작으로 취급합니다.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::WatcherError;

/// 물리 파일 식별자 (device, inode)
///
/// 경로 이름이 바뀌어도(로테이션) 같은 파일이면 동일합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    /// device ID
    pub dev: u64,
    /// inode 번호
    pub ino: u64,
}

impl FileIdentity {
    /// 메타데이터에서 식별자를 추출합니다.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, WatcherError> {
        use std::os::unix::fs::MetadataExt;

        Ok(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// 메타데이터에서 식별자를 추출합니다.
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Result<Self, WatcherError> {
        Err(WatcherError::UnsupportedPlatform(
            "file identity requires device/inode numbers".to_owned(),
        ))
    }
}

/// 읽기 위치와 그 위치가 속한 물리 파일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// 물리 파일 내 바이트 오프셋
    pub offset: u64,
    /// 오프셋이 가리키는 물리 파일
    pub identity: FileIdentity,
}

impl Checkpoint {
    /// 파일 시작 위치의 체크포인트
    pub fn start_of(identity: FileIdentity) -> Self {
        Self {
            offset: 0,
            identity,
        }
    }
}

/// 디스크 레코드 형식
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    pos: u64,
    dev: u64,
    ino: u64,
}

impl From<&Checkpoint> for CheckpointRecord {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            pos: cp.offset,
            dev: cp.identity.dev,
            ino: cp.identity.ino,
        }
    }
}

impl From<CheckpointRecord> for Checkpoint {
    fn from(record: CheckpointRecord) -> Self {
        Self {
            offset: record.pos,
            identity: FileIdentity {
                dev: record.dev,
                ino: record.ino,
            },
        }
    }
}

/// 감시 경로 하나에 대한 체크포인트 저장소
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// 상태 디렉토리와 감시 경로로 저장소를 생성합니다.
    pub fn new(state_dir: impl AsRef<Path>, watched: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(record_name(watched.as_ref())),
        }
    }

    /// 레코드 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 저장된 체크포인트를 읽습니다. 레코드가 없으면 `None`입니다.
    pub async fn load(&self) -> Result<Option<Checkpoint>, WatcherError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.error(e)),
        };

        let record: CheckpointRecord = serde_json::from_slice(&content).map_err(|e| self.error(e))?;
        Ok(Some(record.into()))
    }

    /// 체크포인트를 저장합니다 (레코드 전체 교체).
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WatcherError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.error(e))?;
        }

        let body =
            serde_json::to_vec(&CheckpointRecord::from(checkpoint)).map_err(|e| self.error(e))?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| self.error(e))?;
        file.write_all(&body).await.map_err(|e| self.error(e))?;
        file.sync_all().await.map_err(|e| self.error(e))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.error(e))?;

        tracing::trace!(
            record = %self.path.display(),
            offset = checkpoint.offset,
            "checkpoint saved"
        );
        Ok(())
    }

    fn error(&self, reason: impl std::fmt::Display) -> WatcherError {
        WatcherError::Checkpoint {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// 감시 경로의 SHA-256 16진수 문자열
fn record_name(watched: &Path) -> String {
    format!("{:x}", Sha256::digest(watched.as_os_str().as_encoded_bytes()))
}
