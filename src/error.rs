//! Crate-wide error type.
//!
//! The event core never originates errors of its own. Everything here is
//! raised by a collaborator (screenshot backend, receiver, database) and
//! propagated unchanged to whoever drove the input callback.

use thiserror::Error;

/// Errors surfaced by keycat and its collaborators.
#[derive(Debug, Error)]
pub enum KeycatError {
    /// The screenshot backend failed to produce an image.
    #[error("screenshot capture failed: {0}")]
    Capture(String),

    /// An event receiver rejected or failed to handle an event.
    #[error("event receiver failed: {0}")]
    Receiver(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A mutex guarding shared state was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// A configuration value could not be interpreted.
    #[error("invalid config value {value:?} for key {key:?}")]
    Config { key: String, value: String },

    /// A stored record could not be decoded.
    #[error("corrupt record in {table}: {reason}")]
    CorruptRecord { table: &'static str, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KeycatError>;
