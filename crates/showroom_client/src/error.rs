use thiserror::Error;

/// Uniform error surface for every API interaction.
///
/// Server rejections carry the backend's `detail` string and status code;
/// the remaining variants cover the client-side failure paths that need
/// distinct handling upstream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{detail}")]
    Api { status: u16, detail: String },
    #[error("rate limit exceeded: {detail}")]
    RateLimited { detail: String },
    #[error("session expired, log in again")]
    SessionExpired,
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("no refresh token stored")]
    NoRefreshToken,
    #[error("{0}")]
    NotReady(String),
    #[error("no valid catalog urls in submission")]
    NoValidUrls,
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("malformed server response: {0}")]
    Decode(String),
    #[error("credential store error: {0}")]
    Store(String),
    #[error("superseded by a newer request")]
    Superseded,
}

impl ApiError {
    /// HTTP status of the server rejection, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

pub(crate) fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}
