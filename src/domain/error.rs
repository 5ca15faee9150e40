//! Domain error types.

/// Errors raised inside the signal engine.
///
/// Neither variant escapes [`Engine::tick`](crate::domain::engine::Engine::tick):
/// both are converted into per-strategy skips.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("insufficient history: have {have} outcomes, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("malformed strategy {strategy_id}: {reason}")]
    MalformedStrategy { strategy_id: String, reason: String },
}

/// Top-level error type for ghostsignal.
#[derive(Debug, thiserror::Error)]
pub enum GhostError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("feed error: {reason}")]
    Feed { reason: String },

    #[error("notification error: {reason}")]
    Notify { reason: String },

    #[error("failed to load strategies from {source_name}: {reason}")]
    StrategyLoad { source_name: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GhostError> for std::process::ExitCode {
    fn from(err: &GhostError) -> Self {
        let code: u8 = match err {
            GhostError::Io(_) => 1,
            GhostError::ConfigParse { .. }
            | GhostError::ConfigMissing { .. }
            | GhostError::ConfigInvalid { .. } => 2,
            GhostError::Database { .. } | GhostError::DatabaseQuery { .. } => 3,
            GhostError::StrategyLoad { .. } | GhostError::Engine(_) => 4,
            GhostError::Feed { .. } | GhostError::Notify { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
