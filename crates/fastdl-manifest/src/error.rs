use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be published. The in-memory body is kept and
    /// the next flush retries.
    #[error("failed to publish manifest '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: fastdl_fs::Error,
    },
}

pub type Result<T> = std::result::Result<T, ManifestError>;
