use thiserror::Error;

// ============================================================================
// Error Handling
// ============================================================================

/// Failures talking to the transit provider. Never escape the loaders.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("a transit mode must be selected before a route")]
    ModeNotSelected,
}

/// Errors returned by [`crate::controller::LiveMapHandle`].
#[derive(Error, Debug)]
pub enum LiveMapError {
    #[error("live map controller is no longer running")]
    ControllerGone,

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
