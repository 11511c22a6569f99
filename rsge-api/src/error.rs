use soap_client::SoapError;
use thiserror::Error;

/// Errors raised by the rs.ge service clients
///
/// Every variant carries a human-readable message and, when the remote side
/// supplied one, a numeric code for programmatic branching. The variants
/// follow the failure taxonomy of the services rather than the transport:
/// a negative waybill result code of `-101` is a [`RsgeError::Permission`],
/// an HTTP 401 from a REST endpoint is a [`RsgeError::Authentication`], and
/// so on.
#[derive(Debug, Error)]
pub enum RsgeError {
    /// The service could not be reached or answered with something unusable
    ///
    /// Covers DNS and connect failures, timeouts, non-2xx HTTP statuses other
    /// than 401, malformed bodies and SOAP envelopes without a Body.
    #[error("Connection error: {message}")]
    Connection { message: String, code: Option<i64> },

    /// Credentials were rejected, a token expired, or a guarded call was made
    /// before authenticating
    #[error("Authentication failed: {message}")]
    Authentication { message: String, code: Option<i64> },

    /// Attempt to modify a document owned by another account
    #[error("Permission denied: {message}")]
    Permission { message: String, code: Option<i64> },

    /// Business-level failure reported by a service endpoint
    #[error("API error: {message}")]
    Api { message: String, code: Option<i64> },

    /// Input rejected before it was sent
    #[error("Validation error: {message}")]
    Validation { message: String, code: Option<i64> },
}

impl RsgeError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), code: None }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into(), code: None }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission { message: message.into(), code: None }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api { message: message.into(), code: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), code: None }
    }

    /// Attach a numeric code to the error
    pub fn with_code(mut self, value: i64) -> Self {
        match &mut self {
            Self::Connection { code, .. }
            | Self::Authentication { code, .. }
            | Self::Permission { code, .. }
            | Self::Api { code, .. }
            | Self::Validation { code, .. } => *code = Some(value),
        }
        self
    }

    /// Numeric code reported by the service, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Connection { code, .. }
            | Self::Authentication { code, .. }
            | Self::Permission { code, .. }
            | Self::Api { code, .. }
            | Self::Validation { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message, .. }
            | Self::Authentication { message, .. }
            | Self::Permission { message, .. }
            | Self::Api { message, .. }
            | Self::Validation { message, .. } => message,
        }
    }
}

/// Type alias for results that can return an RsgeError
pub type Result<T> = std::result::Result<T, RsgeError>;

/// Every transport failure surfaces as a connection error
impl From<SoapError> for RsgeError {
    fn from(error: SoapError) -> Self {
        let status = error.status();
        let err = RsgeError::connection(error.to_string());
        match status {
            Some(status) => err.with_code(i64::from(status)),
            None => err,
        }
    }
}
