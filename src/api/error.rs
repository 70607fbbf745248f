use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not decode response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification a front end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Unreachable server, non-2xx status, bad base URL.
    Transport,
    Encode,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Transport(_) | Self::Status { .. } | Self::InvalidUrl(_) => ApiErrorKind::Transport,
            Self::Encode(_) => ApiErrorKind::Encode,
            Self::Decode(_) => ApiErrorKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_a_transport_failure() {
        let err = ApiError::Status {
            status: 503,
            url: "http://localhost:3001/ai-conversations".into(),
        };
        assert_eq!(err.kind(), ApiErrorKind::Transport);
        assert_eq!(err.to_string(), "HTTP 503 from http://localhost:3001/ai-conversations");
    }

    #[test]
    fn malformed_json_is_a_decode_failure() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert_eq!(ApiError::Decode(source).kind(), ApiErrorKind::Decode);
    }

    #[test]
    fn bad_url_is_a_transport_failure() {
        let source = url::Url::parse("::").unwrap_err();
        assert_eq!(ApiError::from(source).kind(), ApiErrorKind::Transport);
    }
}
