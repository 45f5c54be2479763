use std::any::type_name;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::operation::OperationDescriptor;
use super::response::{CallbackGuard, HttpError, IncomingResponse, UnmarshalError, unmarshal_response};
use super::transport::PendingRequest;
use crate::SwaggerClientError;

/// Called once per response, after decoding and before the result is returned.
///
/// Callbacks also run when decoding fails.
pub type ResponseCallback = Arc<dyn Fn(&IncomingResponse, &OperationDescriptor) + Send + Sync>;

/// The outcome of a successful call.
#[derive(Debug, Clone)]
pub enum CallOutput {
    /// The decoded result, `None` when the response declares no schema.
    Result(Option<Value>),
    /// The decoded result with the incoming response.
    WithResponse(Option<Value>, IncomingResponse),
    /// The untouched response of a raw request.
    Raw(IncomingResponse),
}

impl CallOutput {
    /// The decoded result, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Result(result) | Self::WithResponse(result, _) => result.as_ref(),
            Self::Raw(_) => None,
        }
    }

    /// The incoming response, when requested or for raw requests.
    pub fn response(&self) -> Option<&IncomingResponse> {
        match self {
            Self::Result(_) => None,
            Self::WithResponse(_, response) | Self::Raw(response) => Some(response),
        }
    }

    /// Consumes the output, keeping the decoded result.
    pub fn into_result(self) -> Option<Value> {
        match self {
            Self::Result(result) | Self::WithResponse(result, _) => result,
            Self::Raw(_) => None,
        }
    }

    /// Converts the decoded result into a Rust model.
    ///
    /// A missing result converts like `null`, so `Option<T>` and `()` work.
    ///
    /// # Errors
    ///
    /// Returns [`SwaggerClientError::ModelError`] with the path of the
    /// offending value when the conversion fails.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, SwaggerClientError> {
        let value = self.into_result().unwrap_or(Value::Null);
        serde_path_to_error::deserialize(value).map_err(|err| SwaggerClientError::ModelError {
            model: type_name::<T>(),
            path: err.path().to_string(),
            error: err.into_inner(),
        })
    }
}

/// An in-flight call.
///
/// The response is awaited with [`result`](Self::result), optionally with a
/// timeout, or by awaiting the future directly. Once the response arrived, it
/// is decoded a single time: response callbacks and validation run once, and
/// every later read returns the same outcome.
///
/// A timeout only abandons the local wait. The request keeps going, and a
/// later call to [`result`](Self::result) can still get its response.
#[derive(derive_more::Debug)]
pub struct HttpFuture {
    pending: PendingRequest,
    operation: Option<Arc<OperationDescriptor>>,
    #[debug(skip)]
    callbacks: Vec<ResponseCallback>,
    also_return_response: bool,
    outcome: OnceLock<Result<Option<Value>, UnmarshalError>>,
}

impl HttpFuture {
    pub(crate) fn new(
        pending: PendingRequest,
        operation: Arc<OperationDescriptor>,
        callbacks: Vec<ResponseCallback>,
        also_return_response: bool,
    ) -> Self {
        Self {
            pending,
            operation: Some(operation),
            callbacks,
            also_return_response,
            outcome: OnceLock::new(),
        }
    }

    /// A future for a request outside of any operation.
    ///
    /// Successful responses are returned as [`CallOutput::Raw`].
    pub fn raw(pending: PendingRequest) -> Self {
        Self {
            pending,
            operation: None,
            callbacks: Vec::new(),
            also_return_response: false,
            outcome: OnceLock::new(),
        }
    }

    /// The operation being called, `None` for raw requests.
    pub fn operation(&self) -> Option<&OperationDescriptor> {
        self.operation.as_deref()
    }

    /// Tells whether the response already arrived.
    pub fn is_resolved(&self) -> bool {
        self.pending.is_resolved()
    }

    /// Waits for the response and returns the result of the call.
    ///
    /// With `timeout`, gives up waiting after that duration.
    ///
    /// # Errors
    ///
    /// - [`SwaggerClientError::Timeout`] when no response arrived in time;
    /// - [`SwaggerClientError::Transport`] when the request failed;
    /// - [`SwaggerClientError::Http`] for error statuses;
    /// - [`SwaggerClientError::Unmarshal`] when the body cannot be decoded or validated.
    pub async fn result(&self, timeout: Option<Duration>) -> Result<CallOutput, SwaggerClientError> {
        let transport_result = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.pending.wait())
                .await
                .map_err(|_| SwaggerClientError::Timeout { timeout })?,
            None => self.pending.wait().await,
        };
        let response = transport_result
            .as_ref()
            .map_err(|err| SwaggerClientError::Transport(err.clone()))?;

        let Some(operation) = &self.operation else {
            if response.is_success() {
                return Ok(CallOutput::Raw(response.clone()));
            }
            return Err(HttpError::new(response.clone()).into());
        };

        // callbacks run after the outcome is stored
        let mut callbacks = CallbackGuard::disarmed(response, operation, &self.callbacks);
        let outcome = self.outcome.get_or_init(|| {
            debug!(operation = operation.operation_id(), status = %response.status(), "unmarshalling response");
            callbacks.arm();
            unmarshal_response(response, operation, &[])
        });
        drop(callbacks);
        let result = outcome.clone()?;

        if self.also_return_response {
            Ok(CallOutput::WithResponse(result, response.clone()))
        } else {
            Ok(CallOutput::Result(result))
        }
    }

    /// Waits for the response and converts its result into a Rust model.
    ///
    /// # Errors
    ///
    /// Same as [`result`](Self::result), plus [`SwaggerClientError::ModelError`].
    pub async fn result_as<T: DeserializeOwned>(&self, timeout: Option<Duration>) -> Result<T, SwaggerClientError> {
        self.result(timeout).await?.into_model()
    }
}

impl IntoFuture for HttpFuture {
    type Output = Result<CallOutput, SwaggerClientError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.result(None).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, HeaderValue, Method, StatusCode};
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::client::transport::{TransportError, TransportErrorKind};
    use crate::spec::{Spec, SpecConfig};

    fn operation() -> Arc<OperationDescriptor> {
        let spec = Arc::new(Spec::from_document(
            json!({
                "swagger": "2.0",
                "paths": {"/pet": {"get": {
                    "operationId": "getPet",
                    "responses": {"200": {"description": "ok", "schema": {"type": "object"}}}
                }}}
            }),
            None,
            SpecConfig::default(),
        ));
        let path_item = spec.document()["paths"]["/pet"].clone();
        Arc::new(
            OperationDescriptor::build(&spec, Method::GET, "/pet", &path_item, &path_item["get"])
                .expect("descriptor"),
        )
    }

    fn json_response(status: StatusCode, body: &'static str) -> IncomingResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        IncomingResponse::new(status, headers, body)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
        age: u8,
    }

    #[tokio::test]
    async fn should_decode_result_and_return_response() {
        let pending = PendingRequest::ready(Ok(json_response(StatusCode::OK, r#"{"name":"Rex","age":3}"#)));
        let future = HttpFuture::new(pending, operation(), Vec::new(), true);

        let output = future.result(None).await.expect("output");

        assert_eq!(output.response().map(IncomingResponse::status), Some(StatusCode::OK));
        let pet = output.into_model::<Pet>().expect("a pet");
        assert_eq!(pet, Pet { name: "Rex".to_string(), age: 3 });
    }

    #[tokio::test]
    async fn should_report_model_path() {
        let pending = PendingRequest::ready(Ok(json_response(StatusCode::OK, r#"{"name":"Rex","age":"old"}"#)));
        let future = HttpFuture::new(pending, operation(), Vec::new(), false);

        let error = future.result_as::<Pet>(None).await.expect_err("invalid model");

        let SwaggerClientError::ModelError { path, .. } = error else {
            panic!("expected a model error, got {error:?}");
        };
        assert_eq!(path, "age");
    }

    #[tokio::test]
    async fn should_unmarshal_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let callback: ResponseCallback = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &IncomingResponse, _: &OperationDescriptor| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        let pending = PendingRequest::ready(Ok(json_response(StatusCode::OK, "{}")));
        let future = HttpFuture::new(pending, operation(), vec![callback], false);

        let first = future.result(None).await.expect("first").into_result();
        let second = future.result(None).await.expect("second").into_result();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_keep_outcome_when_a_callback_panics() {
        let calls = Arc::new(AtomicUsize::new(0));
        let callback: ResponseCallback = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &IncomingResponse, _: &OperationDescriptor| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("callback failure");
                }
            })
        };
        let pending = PendingRequest::ready(Ok(json_response(StatusCode::OK, r#"{"name":"Rex"}"#)));
        let future = Arc::new(HttpFuture::new(pending, operation(), vec![callback], false));

        let first = tokio::spawn({
            let future = Arc::clone(&future);
            async move { future.result(None).await.map(CallOutput::into_result) }
        })
        .await;
        assert!(first.expect_err("callback panicked").is_panic());

        let output = future.result(None).await.expect("cached output");
        assert_eq!(output.result(), Some(&json!({"name": "Rex"})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_timeout_then_resolve() {
        let (sender, pending) = PendingRequest::channel();
        let future = HttpFuture::new(pending, operation(), Vec::new(), false);

        let error = future
            .result(Some(Duration::from_millis(100)))
            .await
            .expect_err("timeout");
        assert!(matches!(error, SwaggerClientError::Timeout { .. }));
        assert!(!future.is_resolved());

        sender.send(Ok(json_response(StatusCode::OK, r#"{"late":true}"#)));
        let output = future.result(None).await.expect("late output");
        assert_eq!(output.result(), Some(&json!({"late": true})));
    }

    #[tokio::test]
    async fn should_forward_transport_errors() {
        let pending = PendingRequest::ready(Err(TransportError::new(TransportErrorKind::Connect, "refused")));
        let future = HttpFuture::new(pending, operation(), Vec::new(), false);

        let error = future.await.expect_err("transport error");

        insta::assert_snapshot!(error, @"connection error: refused");
    }

    #[tokio::test]
    async fn should_pass_raw_responses_through() {
        let ok = HttpFuture::raw(PendingRequest::ready(Ok(json_response(StatusCode::OK, "pong"))));
        let failed = HttpFuture::raw(PendingRequest::ready(Ok(json_response(StatusCode::NOT_FOUND, ""))));

        let output = ok.await.expect("raw output");
        let error = failed.await.expect_err("raw error");

        assert_eq!(output.response().map(IncomingResponse::text), Some("pong".to_string()));
        assert_eq!(error.as_http().map(HttpError::status), Some(StatusCode::NOT_FOUND));
    }
}
