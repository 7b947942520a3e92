use thiserror::Error;

/// Failures the map viewer can recover from at runtime.
///
/// Callers treat `Network` and `Transport` the same way (log and keep the
/// previous state); the split only exists so the log says what went wrong.
#[derive(Debug, Error)]
pub enum MapError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status} for {url}")]
    Network {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request could not be sent, or the response could not be read or decoded.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The floor-plan image is missing or could not be decoded.
    #[error("failed to load background {path}: {reason}")]
    ResourceLoad { path: String, reason: String },
}

impl MapError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MapError::Network { .. } => "network",
            MapError::Transport { .. } => "transport",
            MapError::ResourceLoad { .. } => "resource_load",
        }
    }
}
