use thiserror::Error;

/// Error types for the history sync pipeline.
///
/// Each variant corresponds to one class of failure the pipeline distinguishes
/// when deciding whether a run can continue with partial data.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use spotify_history_sync::{SyncError, config::DatabaseConfig};
///
/// match DatabaseConfig::from_env() {
///     Ok(config) => println!("Loading into {}", config.name),
///     Err(SyncError::Config(msg)) => eprintln!("Configuration error: {}", msg),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required configuration value is missing or invalid.
    ///
    /// Always fatal and reported before any network or disk I/O happens.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network related errors.
    ///
    /// This includes connection failures, DNS errors and failures to read a
    /// response body.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failures.
    ///
    /// # Common Causes
    /// - No cached token (the `authorize` command has never been run)
    /// - Refresh token revoked by the user
    /// - Invalid client id/secret
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Error message from the response body, or the status reason
        message: String,
    },

    /// Rate limiting from the API.
    ///
    /// The pipeline never retries, so this only records how long the API asked
    /// the caller to wait.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds the API asked to wait before the next request
        retry_after: u64,
    },

    /// Failed to parse a response or a persisted value.
    #[error("Failed to parse: {0}")]
    Parse(String),

    /// Snapshot file could not be written or read as CSV.
    #[error("Snapshot CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Relational store errors (connection, DDL or inserts).
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
