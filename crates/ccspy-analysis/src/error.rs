use std::time::Duration;

/// Why an analysis call produced no result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{var} environment variable not set")]
    CredentialMissing { var: String },

    #[error("API request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API rejected the credential (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("API rate limit reached (HTTP 429)")]
    RateLimited,

    #[error("API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected API response: {0}")]
    MalformedResponse(String),

    #[error("no interactions to analyze")]
    EmptyWindow,

    #[error("analysis task failed: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => AnalysisError::Unauthorized { status },
            429 => AnalysisError::RateLimited,
            _ => AnalysisError::Http {
                status,
                body: body.chars().take(200).collect(),
            },
        }
    }

    /// Actionable advice for the user, if there is any
    pub fn hint(&self) -> Option<String> {
        match self {
            AnalysisError::CredentialMissing { var } => {
                Some(format!("export {}='your-api-key-here'", var))
            }
            AnalysisError::Unauthorized { .. } => {
                Some("Invalid API key - check your credential".to_string())
            }
            AnalysisError::RateLimited => {
                Some("Rate limited - wait a moment and try again".to_string())
            }
            AnalysisError::Timeout(_) | AnalysisError::Transport(_) => Some(
                "Network error - check your internet connection and the API endpoint".to_string(),
            ),
            _ => None,
        }
    }
}
