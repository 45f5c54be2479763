use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::future::ResponseCallback;
use super::operation::OperationDescriptor;
use super::response::IncomingResponse;
use crate::SwaggerClientError;

mod param;
pub use self::param::ParamStyle;

mod request;
pub(crate) use self::request::build_request;


/// Parameter values of an operation call, by parameter name.
///
/// The request body is passed like any other parameter: under its declared
/// name for Swagger 2.0, under `body` for OpenAPI 3.
///
/// ```rust
/// use swagflow_core::CallParams;
///
/// let params = CallParams::new()
///     .add_param("status", vec!["available", "pending"])
///     .add_param("limit", 10);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallParams {
    values: IndexMap<String, Value>,
}

impl CallParams {
    /// Creates an empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value with the same name.
    pub fn add_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Adds a parameter from any serializable value, typically a body model.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be represented as JSON.
    pub fn add_json_param<S: Serialize>(self, name: impl Into<String>, value: &S) -> Result<Self, SwaggerClientError> {
        let value = serde_json::to_value(value)?;
        Ok(self.add_param(name, value))
    }

    /// The value of a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Tells whether no parameter was provided.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CallParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (name, value)| params.add_param(name, value))
    }
}

/// Per-request options.
///
/// Headers are added to the client headers, callbacks run after the client
/// callbacks, and `also_return_response` overrides the client configuration.
#[derive(Clone, Default, derive_more::Debug)]
pub struct RequestOptions {
    pub(crate) headers: HeaderMap,
    #[debug(skip)]
    pub(crate) response_callbacks: Vec<ResponseCallback>,
    pub(crate) also_return_response: Option<bool>,
}

impl RequestOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to this request.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a header to this request, from strings.
    ///
    /// # Errors
    ///
    /// Fails if the name or the value is not a valid header.
    pub fn try_with_header(self, name: &str, value: &str) -> Result<Self, SwaggerClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        Ok(self.with_header(name, value))
    }

    /// Adds a callback invoked with the response of this request.
    #[must_use]
    pub fn add_response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&IncomingResponse, &OperationDescriptor) + Send + Sync + 'static,
    {
        self.response_callbacks.push(std::sync::Arc::new(callback));
        self
    }

    /// Returns the incoming response alongside the result, or not.
    #[must_use]
    pub fn also_return_response(mut self, also_return_response: bool) -> Self {
        self.also_return_response = Some(also_return_response);
        self
    }
}
