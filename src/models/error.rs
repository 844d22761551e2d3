use thiserror::Error;

/// Failures of the storage medium itself.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage i/o: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded. Please delete some conversations to free up space.")]
    QuotaExceeded,
    #[error("Failed to save conversations: {0}")]
    Medium(String),
    #[error("Failed to serialize conversations: {0}")]
    Serialize(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("a request is already in progress")]
    Busy,
    #[error("{0}")]
    Request(String),
}

impl From<SlotError> for StorageError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::QuotaExceeded => StorageError::QuotaExceeded,
            SlotError::Io(err) => StorageError::Medium(err.to_string()),
        }
    }
}
