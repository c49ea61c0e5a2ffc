use fastdl_manifest::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a fastdl session is already active")]
    AlreadyActive,

    #[error("no fastdl session is active")]
    NotActive,

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
