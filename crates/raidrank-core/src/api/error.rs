use thiserror::Error;

/// Failure fetching one character from the progression API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key refused for character profiles (revoked or over quota): {0}")]
    KeyRefused(String),

    #[error("API key not recognized - run `raidrank set-api-key`")]
    Unauthorized,

    #[error("No such character on that realm: {0}")]
    CharacterNotFound(String),

    #[error("Progression API request quota exhausted")]
    QuotaExhausted,

    #[error("Progression API unavailable (maintenance or outage): {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unreadable character profile: {0}")]
    InvalidResponse(String),

    #[error("API reported failure: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Longest response body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

impl ApiError {
    fn body_excerpt(body: &str) -> String {
        let chars = body.chars().count();
        if chars <= MAX_ERROR_BODY_CHARS {
            return body.to_string();
        }
        let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}... ({} chars)", excerpt, chars)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let excerpt = Self::body_excerpt(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::KeyRefused(excerpt),
            404 => ApiError::CharacterNotFound(excerpt),
            429 => ApiError::QuotaExhausted,
            500..=599 => ApiError::Unavailable(excerpt),
            _ => ApiError::InvalidResponse(format!("status {}: {}", status, excerpt)),
        }
    }

    /// Whether the next scheduled pass may well succeed for the same character.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::QuotaExhausted | ApiError::Unavailable(_) | ApiError::NetworkError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn from(status: StatusCode) -> ApiError {
        ApiError::from_status(status, "")
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(from(StatusCode::UNAUTHORIZED), ApiError::Unauthorized));
        assert!(matches!(from(StatusCode::FORBIDDEN), ApiError::KeyRefused(_)));
        assert!(matches!(from(StatusCode::NOT_FOUND), ApiError::CharacterNotFound(_)));
        assert!(matches!(from(StatusCode::TOO_MANY_REQUESTS), ApiError::QuotaExhausted));
        assert!(matches!(from(StatusCode::BAD_GATEWAY), ApiError::Unavailable(_)));
        assert!(matches!(from(StatusCode::IM_A_TEAPOT), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_transient_errors() {
        assert!(from(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(from(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!from(StatusCode::NOT_FOUND).is_transient());
        assert!(!ApiError::Rejected("Character not found.".to_string()).is_transient());
    }

    #[test]
    fn test_long_body_is_cut() {
        let body = "é".repeat(1000);
        match ApiError::from_status(StatusCode::FORBIDDEN, &body) {
            ApiError::KeyRefused(msg) => {
                assert!(msg.ends_with("... (1000 chars)"));
                assert_eq!(msg.chars().filter(|c| *c == 'é').count(), 200);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
