#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An endpoint URL supplied by the caller could not be parsed.
    /// This is a configuration bug, not a runtime condition.
    #[error("Invalid endpoint URL {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Client configuration is incomplete or inconsistent.
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A form-urlencoded payload could not be decoded.
    #[error("Malformed form-urlencoded data: {reason}")]
    MalformedEncoding { reason: String },

    /// The response status is neither the grant's success nor its error status.
    #[error("Unexpected HTTP status: {status}")]
    UnexpectedResponse { status: u16 },

    /// The response body is not valid UTF-8 JSON object text.
    #[error("Unparseable response body (HTTP {status})")]
    UnexpectedBody { status: u16, body: String },

    /// A required field is missing from the response, or has the wrong type.
    #[error("Missing or invalid field: {field}")]
    MissingField { field: &'static str },

    /// The `error` field holds a code outside the RFC 6749 set for this endpoint.
    #[error("Unknown OAuth2 error code: {code}")]
    UnknownErrorCode { code: String },

    /// A redirect-based response carried no redirect URL.
    #[error("Response carries no redirect URL (HTTP {status})")]
    MissingRedirect { status: u16 },

    /// The `state` echoed by the authorization server differs from the one sent.
    #[error("State mismatch in authorization response")]
    StateMismatch,

    /// Network / transport error from the HTTP client.
    #[error("HTTP request failed: {0}")]
    Http(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this error means "the response matched neither the success nor
    /// the error shape of the grant". The caller decides whether to retry,
    /// log or give up; nothing here is an OAuth2 error from the server.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::MalformedEncoding { .. }
                | Error::UnexpectedResponse { .. }
                | Error::UnexpectedBody { .. }
                | Error::MissingField { .. }
                | Error::UnknownErrorCode { .. }
                | Error::MissingRedirect { .. }
        )
    }

    pub(crate) fn invalid_endpoint(endpoint: &str, reason: impl ToString) -> Self {
        Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}
