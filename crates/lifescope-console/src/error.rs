//! Error types for the observatory console binary.
//!
//! [`ConsoleError`] is the top-level error type that wraps all possible
//! failure modes during console startup.

/// Top-level error for the observatory console binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The synchronization session failed to start.
    #[error("sync error: {source}")]
    Sync {
        /// The underlying sync error.
        #[from]
        source: lifescope_sync::SyncError,
    },
}
