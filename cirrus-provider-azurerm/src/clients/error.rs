//! Errors returned by the ARM transport

use serde::Deserialize;
use thiserror::Error;

/// Error returned by an ARM API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("unexpected status {status} with error: {code}: {message}")]
    Response {
        status: u16,
        code: String,
        message: String,
    },

    /// A long-running operation reached a terminal status other than `Succeeded`
    #[error("the long-running operation ended with status {status:?}: {code}: {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    /// Acquiring an access token failed
    #[error("obtaining an access token: {0}")]
    Authentication(String),

    /// The request could not be sent or the body could not be read
    #[error("sending request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected model
    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A URL could not be built
    #[error("building request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Response {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: message.into(),
        }
    }

    /// Build from a failed response body, falling back to the raw text
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(ErrorResponse { error: Some(detail) }) => ApiError::Response {
                status,
                code: detail.code.unwrap_or_default(),
                message: detail.message.unwrap_or_default(),
            },
            _ => ApiError::Response {
                status,
                code: String::new(),
                message: body.chars().take(200).collect(),
            },
        }
    }
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: Option<ErrorDetail>,
}

/// ARM error detail
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}
