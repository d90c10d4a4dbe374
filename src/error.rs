use thiserror::Error;

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failures surfaced by the catalog client. None of them are retried.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error(
        "TMDB_API_KEY is not configured. Set it in the environment or .env file and restart the server"
    )]
    Configuration,
    #[error("Failed to fetch data from TMDB: {status_text}")]
    Upstream { status: u16, status_text: String },
    #[error("TMDB API request failed: {0}")]
    Transport(String),
}

impl CatalogError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Clone, Error)]
pub enum RecommendError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("GEMINI_API_KEY is not configured. Recommendations are unavailable")]
    Configuration,
    #[error("Recommendation service returned an error: {status_text}")]
    Upstream { status: u16, status_text: String },
    #[error("Recommendation request failed: {0}")]
    Transport(String),
    #[error("Recommendation service returned no text")]
    EmptyResponse,
}

/// Reason phrase for a status, falling back to the numeric code.
pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_carries_status_text_only() {
        let err = CatalogError::Upstream {
            status: 404,
            status_text: status_text(reqwest::StatusCode::NOT_FOUND),
        };
        assert_eq!(err.to_string(), "Failed to fetch data from TMDB: Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn non_upstream_errors_have_no_status() {
        assert_eq!(CatalogError::Configuration.status(), None);
        assert_eq!(CatalogError::Transport("dns".into()).status(), None);
    }
}
