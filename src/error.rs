use thiserror::Error;

/// Failures of the persistence gateway. Callers above the store degrade
/// these to a fresh pet or a logged warning; nothing reaches the user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pet record i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("pet record unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("pet store lock poisoned")]
    Poisoned,
}
