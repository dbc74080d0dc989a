/// Failure raised by an item store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("item missing from store: {0}")]
    Missing(String),
    #[error("store rejected write for {id}: {reason}")]
    Rejected { id: String, reason: String },
}

/// Failure reading the algorithm preference; always recovered by the service
#[derive(Debug, Clone, thiserror::Error)]
#[error("config read failed: {0}")]
pub struct ConfigError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Store(StoreError::Missing(_)))
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
