use thiserror::Error;

/// Typed error hierarchy for BareClaw.
///
/// Used at module boundaries (provider calls, config validation, cron
/// persistence). Tool execution failures are captured as `ToolResult`s
/// rather than propagated through this type — see `tools::dispatch`.
#[derive(Debug, Error)]
pub enum BareClawError {
    #[error("policy denied: {0}")]
    Policy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("agent loop exhausted after {0} rounds")]
    Exhaustion(usize),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type BareClawResult<T> = std::result::Result<T, BareClawError>;

impl BareClawError {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BareClawError::Timeout(_) | BareClawError::Transport(_))
    }
}
