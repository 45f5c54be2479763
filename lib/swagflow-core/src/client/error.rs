use std::time::Duration;

use super::response::{HttpError, UnmarshalError};
use super::transport::TransportError;
use crate::spec::RefError;

/// Errors that can occur when using the [`SwaggerClient`](crate::SwaggerClient).
///
/// This enum covers the whole life of a client: loading the specification,
/// building requests from operations, waiting for the transport and
/// unmarshalling responses.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum SwaggerClientError {
    /// The server answered with a status that should be reported as an error.
    ///
    /// Carries the offending response, and the decoded payload when the
    /// operation declares a schema for that status.
    Http(HttpError),

    /// The transport failed before a response was available.
    Transport(TransportError),

    /// A `$ref` in the specification cannot be followed.
    Ref(RefError),

    /// The response could not be decoded, validated or converted.
    #[from(skip)]
    Unmarshal(UnmarshalError),

    /// URL parsing error, while locating the specification or building request URLs.
    UrlError(url::ParseError),

    /// I/O error while reading a specification from the file system.
    IoError(std::io::Error),

    /// JSON error while parsing a specification or serializing a request body.
    JsonValueError(serde_json::Error),

    /// HTTP protocol error from the http crate.
    HttpProtocolError(http::Error),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// Query or form serialization error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// No response arrived within the requested duration.
    ///
    /// Only the local wait is abandoned, the request may still complete.
    #[display("Timeout: no response after {timeout:?}")]
    #[from(skip)]
    Timeout {
        /// The duration waited for.
        timeout: Duration,
    },

    /// The transport requires an async runtime that is not available.
    #[display("The transport {transport} requires an async runtime, none is running")]
    #[from(skip)]
    NoAsyncRuntime {
        /// Type name of the offending transport.
        transport: &'static str,
    },

    /// The specification document is malformed.
    #[display("Invalid specification: {reason}")]
    #[from(skip)]
    InvalidSpec {
        /// Why the document was rejected.
        reason: String,
    },

    /// The specification location is neither a URL nor a usable file path.
    #[display("Invalid specification location: {location}")]
    #[from(skip)]
    InvalidSpecLocation {
        /// The location as provided by the caller.
        location: String,
    },

    /// A YAML specification could not be parsed.
    #[display("Failed to parse YAML from '{url}': {message}")]
    #[from(skip)]
    YamlError {
        /// Where the document came from.
        url: String,
        /// The parser message.
        message: String,
    },

    /// A YAML document was found but YAML support is not compiled in.
    #[display("'{url}' is a YAML document, enable the `yaml` feature to load it")]
    #[from(skip)]
    YamlUnsupported {
        /// Where the document came from.
        url: String,
    },

    /// Neither the specification nor the builder provide a URL to send requests to.
    #[display("Cannot build the API URL: {reason}")]
    #[from(skip)]
    MissingApiUrl {
        /// What was missing.
        reason: String,
    },

    /// No resource with this name exists.
    #[display("Resource {name} not found")]
    #[from(skip)]
    ResourceNotFound {
        /// The attempted name.
        name: String,
    },

    /// No operation with this name exists in the resource.
    #[display("Operation {name} not found in resource {resource}")]
    #[from(skip)]
    OperationNotFound {
        /// The resource searched.
        resource: String,
        /// The attempted name.
        name: String,
    },

    /// A required parameter was not provided and has no default.
    #[display("Missing required parameter '{name}' for operation {operation}")]
    #[from(skip)]
    MissingParameter {
        /// The operation being called.
        operation: String,
        /// The missing parameter.
        name: String,
    },

    /// A parameter was provided that the operation does not declare.
    #[display("Unknown parameter '{name}' for operation {operation}")]
    #[from(skip)]
    UnknownParameter {
        /// The operation being called.
        operation: String,
        /// The unexpected parameter.
        name: String,
    },

    /// Parameter value cannot be converted to the required format.
    #[display("Unsupported value for parameter '{name}': {message}. Got: {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// The parameter name.
        name: String,
        /// Why the value cannot be used.
        message: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },

    /// The decoded value does not fit the requested model type.
    #[display("Failed to convert result into {model} at '{path}': {error}")]
    #[from(skip)]
    ModelError {
        /// The requested Rust type.
        model: &'static str,
        /// Where in the value the conversion failed.
        path: String,
        /// The underlying serde error.
        error: serde_json::Error,
    },
}

impl From<UnmarshalError> for SwaggerClientError {
    fn from(error: UnmarshalError) -> Self {
        match error {
            UnmarshalError::Http(http) => Self::Http(http),
            other => Self::Unmarshal(other),
        }
    }
}

impl SwaggerClientError {
    /// Returns the HTTP error, if this error was raised because of the response status.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(http) => Some(http),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::client::response::IncomingResponse;

    #[test]
    fn test_swagger_client_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SwaggerClientError>();
        assert_sync::<SwaggerClientError>();
    }

    #[test]
    fn should_flatten_http_unmarshal_errors() {
        let response = IncomingResponse::new(StatusCode::BAD_GATEWAY, Default::default(), "");
        let error = SwaggerClientError::from(UnmarshalError::Http(HttpError::new(response)));

        let http = error.as_http().expect("an HTTP error");
        assert_eq!(http.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn should_name_missing_resource() {
        let error = SwaggerClientError::ResourceNotFound {
            name: "foo".to_string(),
        };

        insta::assert_snapshot!(error, @"Resource foo not found");
    }
}
