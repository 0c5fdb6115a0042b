/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum QuipError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// HTTP 429 kept coming back after the path's retry budget was spent.
    #[error("rate limited on {path} after {retries} retries")]
    RateLimited {
        /// Relative path that was requested.
        path: String,
        /// Configured 429 retry ceiling.
        retries: u32,
    },
    /// HTTP 503 kept coming back after the path's retry budget was spent.
    #[error("service unavailable on {path} after {retries} retries")]
    ServiceUnavailable {
        /// Relative path that was requested.
        path: String,
        /// Fixed 503 retry ceiling.
        retries: u32,
    },
    /// Non-success, non-retryable HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body could not be decoded as JSON.
    #[error("decode error: {0}")]
    Decode(String),
}

impl QuipError {
    /// Returns `true` when the call was abandoned because a retry budget ran out.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServiceUnavailable { .. }
        )
    }

    /// HTTP status behind the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::RateLimited { .. } => Some(429),
            Self::ServiceUnavailable { .. } => Some(503),
            Self::Http { status, .. } => Some(*status),
            Self::Decode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QuipError;

    #[test]
    fn exhausted_budgets_report_their_status() {
        let limited = QuipError::RateLimited {
            path: "/threads/abc".to_owned(),
            retries: 3,
        };
        let unavailable = QuipError::ServiceUnavailable {
            path: "/threads/abc".to_owned(),
            retries: 10,
        };

        assert!(limited.is_retry_exhausted());
        assert!(unavailable.is_retry_exhausted());
        assert_eq!(limited.status(), Some(429));
        assert_eq!(unavailable.status(), Some(503));
    }

    #[test]
    fn http_error_is_terminal() {
        let err = QuipError::Http {
            status: 404,
            body: "not found".to_owned(),
        };
        assert!(!err.is_retry_exhausted());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "http error 404: not found");
    }
}
