//! Error types for shared store operations.

/// Errors that can occur while talking to the shared store.
///
/// The gateway treats every variant as recoverable: cache reads degrade to
/// misses, cache writes are logged and dropped, and the rate limiter applies
/// its configured failure policy. No store error ever propagates to a
/// request caller as an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not obtain a connection from the pool.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// A command round-trip failed.
    #[error("Command error: {message}")]
    Command {
        /// Description of the command failure.
        message: String,
    },

    /// The stored value has an unexpected shape (e.g. non-integer counter).
    #[error("Corrupt value at {key}: {message}")]
    CorruptValue {
        /// Key holding the corrupt value.
        key: String,
        /// Description of the corruption.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Command` error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Creates a new `CorruptValue` error.
    #[must_use]
    pub fn corrupt_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a connection-level failure.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::connection("pool exhausted");
        assert_eq!(err.to_string(), "Connection error: pool exhausted");

        let err = StoreError::corrupt_value("rate_limit:1.2.3.4:a:b", "not an integer");
        assert_eq!(
            err.to_string(),
            "Corrupt value at rate_limit:1.2.3.4:a:b: not an integer"
        );
    }

    #[test]
    fn test_connection_predicate() {
        assert!(StoreError::connection("x").is_connection());
        assert!(!StoreError::command("x").is_connection());
    }
}
