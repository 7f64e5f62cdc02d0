use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VerifyError {
    #[error("data integrity fault: {0}")]
    DataIntegrity(String),

    #[error("invalid pham id: {0}")]
    InvalidPhamId(String),

    #[error("Starterator request failed: {0}")]
    ServerHttp(String),

    #[error("Starterator returned status {status}: {message}")]
    ServerStatus { status: u16, message: String },

    #[error("not valid JSON: {0}")]
    FormatFailure(String),

    #[error("dataset not found locally: {0}")]
    DatasetNotFound(String),

    #[error("pham id list not found at {0}; run `stv ids fetch` first")]
    MissingIdList(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl VerifyError {
    /// Malformed dataset content; the comparison for that dataset cannot run.
    pub fn is_integrity(&self) -> bool {
        matches!(self, VerifyError::DataIntegrity(_))
    }

    /// Failures of obtaining a dataset at all (transport, cache or format).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            VerifyError::ServerHttp(_)
                | VerifyError::ServerStatus { .. }
                | VerifyError::FormatFailure(_)
                | VerifyError::DatasetNotFound(_)
                | VerifyError::Filesystem(_)
        )
    }
}
