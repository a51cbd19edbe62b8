use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    Io(String),
    /// A stored snapshot did not parse. The caller is expected to purge it.
    Corrupt { key: String, reason: String },
    /// A draft could not be serialized for storage.
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "storage I/O error: {}", msg),
            StoreError::Corrupt { key, reason } => {
                write!(f, "corrupt snapshot under '{}': {}", key, reason)
            }
            StoreError::Serialize(msg) => write!(f, "cannot serialize draft: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
