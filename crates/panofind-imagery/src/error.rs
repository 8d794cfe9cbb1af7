use thiserror::Error;

/// Errors returned by an imagery provider.
#[derive(Debug, Error)]
pub enum ImageryError {
    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered `"status": "ERROR"` with a message.
    #[error("imagery provider error: {0}")]
    ApiError(String),

    /// The request could not be built from the given input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A depth payload was requested and came back unusable.
    #[error("malformed depth payload for panorama {pano_id}: {reason}")]
    MalformedDepth { pano_id: String, reason: String },
}

impl ImageryError {
    /// Returns `true` for errors worth retrying after a back-off delay.
    ///
    /// **Retriable:** connection failures and timeouts, HTTP 5xx and 429,
    /// and response bodies that fail to decode.
    ///
    /// **Not retriable:** other HTTP 4xx (bad input, auth), provider-reported
    /// errors, invalid requests, and malformed depth payloads, which the
    /// caller recovers from by fetching without depth.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ImageryError::Http(e) => match e.status() {
                Some(status) => {
                    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                }
                None => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            },
            ImageryError::Deserialize { .. } => true,
            ImageryError::ApiError(_)
            | ImageryError::InvalidRequest(_)
            | ImageryError::MalformedDepth { .. } => false,
        }
    }

    /// Builds a [`ImageryError::Deserialize`] from a plain message.
    pub fn malformed(context: impl Into<String>, message: &str) -> Self {
        ImageryError::Deserialize {
            context: context.into(),
            source: <serde_json::Error as serde::de::Error>::custom(message),
        }
    }
}
