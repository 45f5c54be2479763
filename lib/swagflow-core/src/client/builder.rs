use std::path::Path;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::info;
use url::Url;

use super::future::ResponseCallback;
use super::operation::OperationDescriptor;
use super::response::IncomingResponse;
use super::transport::{HttpTransport, ReqwestTransport};
use super::{SwaggerClient, SwaggerClientError};
use crate::spec::{Loader, ResponseValidator, Spec, SpecConfig, spec_location};

/// Builder for [`SwaggerClient`] instances.
///
/// # Default Configuration
///
/// - **Transport**: [`ReqwestTransport`] with a default `reqwest` client
/// - **Configuration**: [`SpecConfig::default`], responses are validated
/// - **API URL**: taken from the specification
///
/// # Example
///
/// ```rust,no_run
/// use swagflow_core::SwaggerClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SwaggerClient::builder()
///     .with_request_header("x-api-key".parse()?, "secret".parse()?)
///     .with_validate_responses(false)
///     .load("http://petstore.swagger.io/v2/swagger.json")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct SwaggerClientBuilder<T = ReqwestTransport> {
    transport: T,
    request_headers: HeaderMap,
    config: SpecConfig,
    api_url: Option<Url>,
    #[debug(skip)]
    response_callbacks: Vec<ResponseCallback>,
    #[debug(skip)]
    validator: Option<Arc<dyn ResponseValidator>>,
}

impl Default for SwaggerClientBuilder {
    fn default() -> Self {
        Self {
            transport: ReqwestTransport::default(),
            request_headers: HeaderMap::new(),
            config: SpecConfig::default(),
            api_url: None,
            response_callbacks: Vec::new(),
            validator: None,
        }
    }
}

impl<T: HttpTransport> SwaggerClientBuilder<T> {
    /// Uses another transport.
    pub fn with_transport<U: HttpTransport>(self, transport: U) -> SwaggerClientBuilder<U> {
        let Self {
            transport: _,
            request_headers,
            config,
            api_url,
            response_callbacks,
            validator,
        } = self;
        SwaggerClientBuilder {
            transport,
            request_headers,
            config,
            api_url,
            response_callbacks,
            validator,
        }
    }

    /// Adds a header sent when loading the specification and its remote references.
    #[must_use]
    pub fn with_request_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request_headers.insert(name, value);
        self
    }

    /// Adds headers sent when loading the specification and its remote references.
    #[must_use]
    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers.extend(headers);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SpecConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables response validation.
    #[must_use]
    pub fn with_validate_responses(mut self, validate_responses: bool) -> Self {
        self.config.validate_responses = validate_responses;
        self
    }

    /// Returns the incoming response alongside every result.
    #[must_use]
    pub fn also_return_response(mut self, also_return_response: bool) -> Self {
        self.config.also_return_response = also_return_response;
        self
    }

    /// Fills declared properties missing from response payloads.
    #[must_use]
    pub fn include_missing_properties(mut self, include_missing_properties: bool) -> Self {
        self.config.include_missing_properties = include_missing_properties;
        self
    }

    /// Derives the base path from the specification URL when the document has none.
    #[must_use]
    pub fn use_spec_url_for_base_path(mut self, use_spec_url_for_base_path: bool) -> Self {
        self.config.use_spec_url_for_base_path = use_spec_url_for_base_path;
        self
    }

    /// Sends requests to this URL instead of the one described by the specification.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = Some(api_url);
        self
    }

    /// Adds a callback invoked with every response of an operation.
    #[must_use]
    pub fn add_response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&IncomingResponse, &OperationDescriptor) + Send + Sync + 'static,
    {
        self.response_callbacks.push(Arc::new(callback));
        self
    }

    /// Uses another response validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ResponseValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Loads the specification from a URL or a file path, then builds the client.
    ///
    /// # Errors
    ///
    /// Fails without an async runtime, when the location is invalid, or when
    /// the specification cannot be loaded.
    pub async fn load(self, location: &str) -> Result<SwaggerClient<T>, SwaggerClientError> {
        let url = spec_location(location)?;
        self.load_url(&url).await
    }

    /// Loads the specification from the file system, then builds the client.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_file(self, path: impl AsRef<Path>) -> Result<SwaggerClient<T>, SwaggerClientError> {
        self.load(&path.as_ref().to_string_lossy()).await
    }

    /// Loads the specification from a URL, then builds the client.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_url(self, url: &Url) -> Result<SwaggerClient<T>, SwaggerClientError> {
        ensure_runtime(&self.transport)?;
        let loaded = Loader::new(&self.transport, &self.request_headers).load(url).await?;
        let spec = Spec::from_loaded(loaded, self.config);
        self.finish(spec)
    }

    /// Builds the client from an in-memory document.
    ///
    /// `origin_url` is used for relative references and for the API URL
    /// when the document does not describe a host.
    ///
    /// # Errors
    ///
    /// Fails without an async runtime, or when the document is not a valid specification.
    pub fn build(self, document: Value, origin_url: Option<Url>) -> Result<SwaggerClient<T>, SwaggerClientError> {
        let spec = Spec::from_document(document, origin_url, self.config);
        self.finish(spec)
    }

    fn finish(self, spec: Spec) -> Result<SwaggerClient<T>, SwaggerClientError> {
        let Self {
            transport,
            request_headers: _,
            config: _,
            api_url,
            response_callbacks,
            validator,
        } = self;
        let spec = match validator {
            Some(validator) => spec.with_validator(validator),
            None => spec,
        };
        info!(origin = ?spec.origin_url(), "building client");
        SwaggerClient::assemble(spec, transport, api_url, response_callbacks)
    }
}

pub(super) fn ensure_runtime<T: HttpTransport>(transport: &T) -> Result<(), SwaggerClientError> {
    if transport.is_runtime_available() {
        Ok(())
    } else {
        Err(SwaggerClientError::NoAsyncRuntime {
            transport: std::any::type_name::<T>(),
        })
    }
}
