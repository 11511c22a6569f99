//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Connection, DNS or timeout failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP status; `message` holds the SOAP faultstring when the server sent one
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// HTTP 200 reply whose Body holds a `soap:Fault`
    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    /// Response body is not well-formed XML
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// Response parsed but carries no SOAP Body
    #[error("Invalid SOAP response: missing Body element")]
    MissingBody,

    /// The client was closed before the call
    #[error("SOAP session is closed")]
    Closed,
}

impl SoapError {
    /// HTTP status code for [`SoapError::Http`], `None` otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            SoapError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
