//! Error types for the game binary.

/// Top-level error for the game binary.
///
/// Each variant wraps one subsystem's startup failure so `main` can
/// propagate everything with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: herding_sim::ConfigError,
    },

    /// The round could not be built from the configuration.
    #[error("round error: {source}")]
    Round {
        /// The underlying simulation error.
        #[from]
        source: herding_sim::SimError,
    },

    /// The judge was configured but could not be set up.
    #[error("judge error: {source}")]
    Judge {
        /// The underlying judge error.
        #[from]
        source: herding_judge::JudgeError,
    },

    /// Presentation API server failed.
    #[error("server error: {message}")]
    Server {
        /// Description of the server failure.
        message: String,
    },
}
