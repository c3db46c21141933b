use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether the retry controller should re-attempt the operation.
    /// Only upstream transport/timeout failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, IngestError::Upstream(_))
    }
}
