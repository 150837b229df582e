//! Error types for jrmc
//!
//! Two layers of errors live here:
//!
//! - **DispatchError**: the four failure classes of a single dispatch
//!   (validation, resolution, gate, invocation). Every stage of the pipeline
//!   returns one of these; it is turned into the `error` string of the
//!   response envelope only when the envelope is built.
//! - **Error**: everything outside a dispatch, i.e. the codec and the
//!   transports (undecodable JSON, WebSocket failures, timeouts, errors
//!   reported back by a remote peer).
//!
//! # Examples
//!
//! ```rust
//! use jrmc_core::DispatchError;
//!
//! let error = DispatchError::not_exposed("secret");
//! assert_eq!(error.to_string(), "No such method: secret!");
//! assert_eq!(error.kind(), "not_exposed");
//! ```

use thiserror::Error;

/// Result type for jrmc operations outside of dispatch
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by method bodies
///
/// Any error type converts into it with `?`, and so do `&str` and `String`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message used when a request lacks `resource` or `method`
pub const MISSING_FIELDS: &str = "resource and method are required";

/// Message used when `params` is present but not an array
pub const PARAMS_NOT_A_LIST: &str = "params must be a list";

/// Failure of one dispatch, classified by the stage that produced it
///
/// The `Display` output of each variant is exactly the text placed in the
/// `error` field of the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The envelope is malformed: missing `resource`/`method`, or `params`
    /// that is not an array.
    #[error("{0}")]
    Validation(String),

    /// A path segment's lookup failed. Holds the original, unnormalized path.
    #[error("Resource not found: {0}")]
    Resolution(String),

    /// The member is absent or was not registered as exposed.
    ///
    /// Both cases share one message so callers cannot probe for private
    /// members.
    #[error("No such method: {0}!")]
    NotExposed(String),

    /// The method ran and failed. Holds the stringified failure.
    #[error("{0}")]
    Invocation(String),
}

impl DispatchError {
    /// Validation failure for a request without `resource` or `method`
    pub fn missing_fields() -> Self {
        DispatchError::Validation(MISSING_FIELDS.to_string())
    }

    /// Validation failure for a non-array `params`
    pub fn params_not_a_list() -> Self {
        DispatchError::Validation(PARAMS_NOT_A_LIST.to_string())
    }

    /// Resolution failure for `path`
    pub fn resource_not_found(path: impl Into<String>) -> Self {
        DispatchError::Resolution(path.into())
    }

    /// Gate failure for `method`
    pub fn not_exposed(method: impl Into<String>) -> Self {
        DispatchError::NotExposed(method.into())
    }

    /// Invocation failure carrying `message`
    pub fn invocation(message: impl Into<String>) -> Self {
        DispatchError::Invocation(message.into())
    }

    /// Short, stable label of the failing stage, for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::Resolution(_) => "resolution",
            DispatchError::NotExposed(_) => "not_exposed",
            DispatchError::Invocation(_) => "invocation",
        }
    }
}

/// Errors of the codec and transport layers
///
/// A dispatch never produces one of these on its own; they appear when raw
/// text cannot be decoded, when a socket fails, or when a client receives an
/// `error` envelope from the remote side.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A dispatch failure surfaced outside the envelope
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The raw payload is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Operating system I/O failure
    #[error("IO error: {0}")]
    Io(String),

    /// The connection is no longer usable
    #[error("Connection closed")]
    ConnectionClosed,

    /// A call did not complete within its deadline
    #[error("Request timeout")]
    Timeout,

    /// The remote side answered with an `error` envelope
    #[error("{0}")]
    Remote(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            DispatchError::missing_fields().to_string(),
            "resource and method are required"
        );
        assert_eq!(
            DispatchError::params_not_a_list().to_string(),
            "params must be a list"
        );
    }

    #[test]
    fn test_resolution_message_keeps_original_path() {
        let error = DispatchError::resource_not_found("//math//nope/");
        assert_eq!(error.to_string(), "Resource not found: //math//nope/");
    }

    #[test]
    fn test_not_exposed_message() {
        let error = DispatchError::not_exposed("secret");
        assert_eq!(error.to_string(), "No such method: secret!");
    }

    #[test]
    fn test_invocation_message_is_verbatim() {
        let error = DispatchError::invocation("attempt to divide by zero");
        assert_eq!(error.to_string(), "attempt to divide by zero");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(DispatchError::missing_fields().kind(), "validation");
        assert_eq!(DispatchError::resource_not_found("/").kind(), "resolution");
        assert_eq!(DispatchError::not_exposed("x").kind(), "not_exposed");
        assert_eq!(DispatchError::invocation("boom").kind(), "invocation");
    }

    #[test]
    fn test_error_wraps_dispatch_transparently() {
        let error: Error = DispatchError::not_exposed("x").into();
        assert_eq!(error.to_string(), "No such method: x!");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        match Error::from(io_error) {
            Error::Io(msg) => assert_eq!(msg, "file not found"),
            other => panic!("Expected IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_error_display() {
        let error = Error::Remote("No such method: secret!".to_string());
        assert_eq!(error.to_string(), "No such method: secret!");
    }
}
