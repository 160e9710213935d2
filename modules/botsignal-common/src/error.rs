use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotSignalError {
    /// Missing or rejected credentials. Fatal before any upstream call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Auth or page fetch against the upstream source failed. Fatal to the
    /// extraction stage. Per-author profile failures are absorbed at the
    /// stage and never surface here.
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// Store write or read failed. Fatal to the current stage.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Bad request input. Surfaced to the caller, no retry.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown session or record id.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
