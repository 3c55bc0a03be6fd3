//! Error types shared by the binding layer.
//!
//! Errors fall into two groups:
//! - [`SignatureError`]: raised once, when a function is wrapped, if its parameter list can't be bound
//! - [`FnError`]: raised per request, while the body is read or arguments are bound
//!
//! User functions, plugins and extractors may fail with any error type; those are carried as
//! [`BoxError`]. The response status of a failed request is looked up with [`status_code_of`].

use crate::extract::MultipartError;
use http::StatusCode;
use std::error::Error;
use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised while binding a request to function arguments.
#[derive(Error, Debug)]
pub enum FnError {
    #[error("read request body error: {source}")]
    ReadBody { source: BoxError },

    #[error("request body exceed the limit {limit}")]
    PayloadTooLarge { limit: usize },

    #[error("invalid json body: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid multipart body: {source}")]
    Multipart {
        #[from]
        source: MultipartError,
    },

    /// displays the extractor's own message, `type_name` is kept for logs
    #[error("{source}")]
    Extract { type_name: &'static str, source: BoxError },

    #[error("extractor produced a value which is not `{type_name}`")]
    TypeMismatch { type_name: &'static str },

    #[error("encode response error: {reason}")]
    Encode { reason: String },
}

impl FnError {
    pub fn read_body<E: Into<BoxError>>(e: E) -> Self {
        Self::ReadBody { source: e.into() }
    }

    pub fn extract<E: Into<BoxError>>(type_name: &'static str, e: E) -> Self {
        Self::Extract { type_name, source: e.into() }
    }

    pub fn encode<S: ToString>(str: S) -> Self {
        Self::Encode { reason: str.to_string() }
    }

    /// The status a failed request reports when this error aborted it
    pub fn status_code(&self) -> StatusCode {
        match self {
            FnError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FnError::TypeMismatch { .. } | FnError::Encode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FnError::Extract { source, .. } => status_code_of(source.as_ref()).unwrap_or(StatusCode::BAD_REQUEST),
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors raised when a function's parameter list can't be bound.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("`Context` must be the first parameter, found at position {position}")]
    ContextNotFirst { position: usize },

    #[error("function should accept only one custom type, found at positions {first} and {second}")]
    MultipleCustom { first: usize, second: usize },

    #[error("unsupported parameter type `{type_name}` at position {position}, register an extractor or use `Json`")]
    UnsupportedParam { position: usize, type_name: &'static str },
}

/// An error with an explicit response status.
///
/// Return it (or wrap it as the `source` of another error) from a function, a plugin or an
/// extractor to choose the status of the failure response.
///
/// # Example
/// ```
/// use micro_fn::StatusError;
///
/// async fn find_user(id: u64) -> Result<String, StatusError> {
///     Err(StatusError::not_found(format!("user {id} not found")))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    status: StatusCode,
    message: String,
}

impl StatusError {
    pub fn new<S: ToString>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.to_string() }
    }

    pub fn bad_request<S: ToString>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized<S: ToString>(message: S) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden<S: ToString>(message: S) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<S: ToString>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal<S: ToString>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for StatusError {}

/// Walks the error and its `source()` chain, returning the first explicit status found.
pub fn status_code_of(err: &(dyn Error + 'static)) -> Option<StatusCode> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(status_error) = e.downcast_ref::<StatusError>() {
            return Some(status_error.status());
        }
        if let Some(fn_error) = e.downcast_ref::<FnError>() {
            return Some(fn_error.status_code());
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug)]
    #[error("login failed")]
    struct LoginError {
        #[source]
        source: StatusError,
    }

    #[test]
    fn test_status_error_direct() {
        let err = StatusError::unauthorized("who are you");
        assert_eq!(status_code_of(&err), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "who are you");
    }

    #[test]
    fn test_status_error_in_source_chain() {
        let err = LoginError { source: StatusError::forbidden("no") };
        assert_eq!(status_code_of(&err), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_boxed_status_error() {
        let err: BoxError = StatusError::not_found("gone").into();
        assert_eq!(status_code_of(err.as_ref()), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_plain_error_has_no_status() {
        let err = std::io::Error::other("boom");
        assert_eq!(status_code_of(&err), None);
    }

    #[test]
    fn test_fn_error_status() {
        assert_eq!(FnError::PayloadTooLarge { limit: 1 }.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(FnError::TypeMismatch { type_name: "u8" }.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(FnError::read_body("eof").status_code(), StatusCode::BAD_REQUEST);

        let extract = FnError::extract("Session", StatusError::unauthorized("no session"));
        assert_eq!(extract.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(extract.to_string(), "no session");
        assert_eq!(status_code_of(&extract), Some(StatusCode::UNAUTHORIZED));
    }
}
