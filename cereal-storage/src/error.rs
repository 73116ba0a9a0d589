use thiserror::Error;

use crate::cereal::Cereal;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Amount passed to an add or take was negative (or NaN).
    #[error("invalid argument: amount must be non-negative, got {amount}")]
    InvalidArgument { amount: f32 },
    /// A new container for `cereal` would exceed the storage capacity.
    #[error(
        "storage full: cannot allocate a container for {cereal:?} \
         ({containers} allocated, capacity {storage_capacity})"
    )]
    StorageFull {
        cereal: Cereal,
        containers: usize,
        storage_capacity: f32,
    },
    #[error("malformed storage config: {0}")]
    Config(#[from] serde_json::Error),
}

impl StorageError {
    /// Short machine-readable tag, used as the `kind` field of rejection events.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidConfiguration(_) => "invalid_configuration",
            StorageError::InvalidArgument { .. } => "invalid_argument",
            StorageError::StorageFull { .. } => "storage_full",
            StorageError::Config(_) => "config",
        }
    }
}
