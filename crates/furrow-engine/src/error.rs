//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: furrow_core::config::ConfigError,
    },

    /// Catalog loading failed.
    #[error("catalog error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: furrow_world::WorldError,
    },

    /// The bootstrap run could not be created.
    #[error("bootstrap error: {source}")]
    Bootstrap {
        /// The underlying core error.
        #[from]
        source: furrow_core::CoreError,
    },

    /// The HTTP server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: furrow_observer::StartupError,
    },

    /// The server task ended abnormally.
    #[error("server task failed: {message}")]
    Task {
        /// Description of the join failure.
        message: String,
    },
}
