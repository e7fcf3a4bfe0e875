use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid slot key '{key}': {reason}")]
    InvalidSlotKey { key: String, reason: &'static str },

    #[error("Save file for slot '{slot}' is corrupt: {source}")]
    CorruptSnapshot {
        slot:   String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pickup registry used after teardown")]
    RegistryDestroyed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SaveResult<T> = Result<T, SaveError>;
