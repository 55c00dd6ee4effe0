// Error taxonomy for upstream Sleeper access.

use thiserror::Error;

/// Failure talking to the Sleeper API.
///
/// `NotFound` is the "identifier does not resolve" category; every other
/// variant means the upstream was unavailable or returned something we could
/// not read. Callers use [`SleeperError::is_not_found`] to tell them apart.
#[derive(Debug, Error)]
pub enum SleeperError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("invalid Sleeper base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SleeperError {
    pub fn not_found(what: impl Into<String>) -> Self {
        SleeperError::NotFound { what: what.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SleeperError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished_from_status() {
        assert!(SleeperError::not_found("user alice").is_not_found());
        let status = SleeperError::Status {
            status: 503,
            url: "https://api.sleeper.app/v1/state/nfl".into(),
        };
        assert!(!status.is_not_found());
        assert_eq!(
            status.to_string(),
            "upstream returned status 503 for https://api.sleeper.app/v1/state/nfl"
        );
    }
}
