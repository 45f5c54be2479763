use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use super::IncomingResponse;
use crate::spec::{RefError, ValidationError};

/// A response reported as an error.
///
/// - On `5xx` statuses it carries minimal information: the body is not decoded.
/// - When no response is declared for the status, it carries a detailed message.
/// - When a response is declared for a non `2xx` status, it carries the
///   decoded payload as [`swagger_result`](Self::swagger_result).
#[derive(Debug, Clone)]
pub struct HttpError {
    response: IncomingResponse,
    message: Option<String>,
    swagger_result: Option<Value>,
    cause: Option<Box<UnmarshalError>>,
}

impl HttpError {
    /// Creates an error for this response.
    pub fn new(response: IncomingResponse) -> Self {
        Self {
            response,
            message: None,
            swagger_result: None,
            cause: None,
        }
    }

    /// Adds a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the decoded payload of the response.
    #[must_use]
    pub fn with_swagger_result(mut self, result: Option<Value>) -> Self {
        self.swagger_result = result;
        self
    }

    pub(crate) fn caused_by(mut self, cause: UnmarshalError) -> Self {
        self.message = Some(cause.to_string());
        self.cause = Some(Box::new(cause));
        self
    }

    /// The status of the response.
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// The offending response.
    pub fn response(&self) -> &IncomingResponse {
        &self.response
    }

    /// The message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The decoded payload, for declared error responses.
    pub fn swagger_result(&self) -> Option<&Value> {
        self.swagger_result.as_ref()
    }
}

impl Display for HttpError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.status())?;
        if let Some(message) = &self.message {
            write!(fmt, ": {message}")?;
        }
        if let Some(result) = &self.swagger_result {
            write!(fmt, ": {result}")?;
        }
        Ok(())
    }
}

impl Error for HttpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Everything that can go wrong once a response is available.
///
/// Cloneable, so that a resolved future can deliver the same outcome to
/// every reader.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum UnmarshalError {
    /// The response status is reported as an error.
    Http(HttpError),

    /// The operation declares no response for this status, and no `default`.
    #[display(
        "Response specification matching http status_code {status} not found for operation {operation}. Either add a response specification for the status_code or use a `default` response."
    )]
    #[from(skip)]
    MatchingResponseNotFound {
        /// The received status code.
        status: u16,
        /// The operation id.
        operation: String,
    },

    /// The body is not valid JSON.
    #[display("Invalid JSON body: {_0}")]
    Json(Arc<serde_json::Error>),

    /// The body is not valid MessagePack.
    #[display("Invalid MessagePack body: {_0}")]
    MsgPack(Arc<rmpv::decode::Error>),

    /// The body does not match the declared schema.
    Validation(ValidationError),

    /// The declared schema cannot be resolved.
    Ref(RefError),
}

impl From<serde_json::Error> for UnmarshalError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(Arc::new(error))
    }
}

impl From<rmpv::decode::Error> for UnmarshalError {
    fn from(error: rmpv::decode::Error) -> Self {
        Self::MsgPack(Arc::new(error))
    }
}
