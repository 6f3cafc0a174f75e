use thiserror::Error;

/// Failure of a single request to an analytics provider.
///
/// Only [`ProviderError::Timeout`] is considered transient; every other
/// variant fails the request immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,

    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }
}

/// Terminal failure of one report generation branch.
///
/// In a multi-source run each branch fails independently; only when every
/// branch fails does the caller see [`GenerateError::NoSourceData`].
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid report spec: {0}")]
    InvalidSpec(String),

    #[error("no client scope could be resolved for {0}")]
    ScopeResolution(String),

    #[error("{stage} produced no data")]
    EmptyResult { stage: &'static str },

    #[error("provider request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("no analytics provider is configured")]
    NoProvider,

    #[error("no source produced data")]
    NoSourceData,
}

impl GenerateError {
    pub fn empty(stage: &'static str) -> Self {
        GenerateError::EmptyResult { stage }
    }
}
