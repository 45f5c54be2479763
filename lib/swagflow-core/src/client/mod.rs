use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;
use url::Url;

use crate::spec::Spec;

mod builder;
pub use self::builder::SwaggerClientBuilder;

mod call;
pub use self::call::{CallParams, ParamStyle, RequestOptions};

mod error;
pub use self::error::SwaggerClientError;

mod future;
pub use self::future::{CallOutput, HttpFuture, ResponseCallback};

mod operation;
pub use self::operation::{OperationDescriptor, ParameterLocation, ParameterSpec, RequestBodySpec};

mod resource;
pub use self::resource::Resource;

pub mod response;
pub mod transport;

use self::operation::sanitize_name;
use self::transport::{HttpTransport, ReqwestTransport, TransportRequest};

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
mod tests;

/// Asynchronous client for an API described by a Swagger 2.0 or OpenAPI 3 document.
///
/// Operations are grouped into resources (see [`Resource`]). Calling an
/// operation returns an [`HttpFuture`] right away; the response is decoded
/// when the future is awaited.
///
/// # Example
///
/// ```rust,no_run
/// use swagflow_core::{CallParams, SwaggerClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SwaggerClient::from_url("http://petstore.swagger.io/v2/swagger.json").await?;
///
/// let pets = client
///     .resource("pet")?
///     .operation("findPetsByStatus")?
///     .call(CallParams::new().add_param("status", vec!["available"]))?
///     .await?
///     .into_result();
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct SwaggerClient<T = ReqwestTransport> {
    spec: Arc<Spec>,
    transport: Arc<T>,
    #[debug(skip)]
    resources: Arc<IndexMap<String, Resource>>,
    api_url: Url,
    #[debug(skip)]
    response_callbacks: Arc<Vec<ResponseCallback>>,
}

impl<T> Clone for SwaggerClient<T> {
    fn clone(&self) -> Self {
        Self {
            spec: Arc::clone(&self.spec),
            transport: Arc::clone(&self.transport),
            resources: Arc::clone(&self.resources),
            api_url: self.api_url.clone(),
            response_callbacks: Arc::clone(&self.response_callbacks),
        }
    }
}

impl SwaggerClient {
    /// Creates a builder with the default transport.
    pub fn builder() -> SwaggerClientBuilder {
        SwaggerClientBuilder::default()
    }

    /// Loads the specification from a URL or a file path with default settings.
    ///
    /// # Errors
    ///
    /// See [`SwaggerClientBuilder::load`].
    pub async fn from_url(location: &str) -> Result<Self, SwaggerClientError> {
        Self::builder().load(location).await
    }
}

impl<T: HttpTransport> SwaggerClient<T> {
    /// Creates a client from an already loaded specification.
    ///
    /// # Errors
    ///
    /// Fails without an async runtime, or when the operations cannot be read.
    pub fn from_spec(spec: Spec, transport: T) -> Result<Self, SwaggerClientError> {
        Self::assemble(spec, transport, None, Vec::new())
    }

    pub(crate) fn assemble(
        spec: Spec,
        transport: T,
        api_url: Option<Url>,
        response_callbacks: Vec<ResponseCallback>,
    ) -> Result<Self, SwaggerClientError> {
        builder::ensure_runtime(&transport)?;

        let api_url = match api_url {
            Some(api_url) => api_url,
            None => spec.api_url()?,
        };
        let spec = Arc::new(spec);
        let resources = resource::build_resources(&spec)?;
        debug!(%api_url, resources = resources.len(), "client ready");

        Ok(Self {
            spec,
            transport: Arc::new(transport),
            resources: Arc::new(resources),
            api_url,
            response_callbacks: Arc::new(response_callbacks),
        })
    }

    /// The loaded specification.
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// The URL requests are sent to.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resource names, in declaration order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Finds a resource by name, or by its sanitized name.
    ///
    /// # Errors
    ///
    /// Returns [`SwaggerClientError::ResourceNotFound`] for unknown names.
    pub fn resource(&self, name: &str) -> Result<ResourceHandle<'_, T>, SwaggerClientError> {
        let resource = self
            .resources
            .get(name)
            .or_else(|| {
                self.resources
                    .iter()
                    .find(|(key, _)| sanitize_name(key) == name)
                    .map(|(_, resource)| resource)
            })
            .ok_or_else(|| SwaggerClientError::ResourceNotFound {
                name: name.to_string(),
            })?;
        Ok(ResourceHandle {
            client: self,
            resource,
        })
    }

    /// Sends a request outside of any operation.
    ///
    /// The response is not decoded: successful responses come back as
    /// [`CallOutput::Raw`], others as [`SwaggerClientError::Http`].
    pub fn request_raw(&self, request: TransportRequest) -> HttpFuture {
        debug!(method = %request.method, url = %request.url, "raw request");
        HttpFuture::raw(self.transport.request(request))
    }

    fn call_operation(
        &self,
        operation: &Arc<OperationDescriptor>,
        params: CallParams,
        options: RequestOptions,
    ) -> Result<HttpFuture, SwaggerClientError> {
        let RequestOptions {
            headers,
            response_callbacks,
            also_return_response,
        } = options;

        let request = call::build_request(&self.api_url, operation, params, &headers)?;
        let callbacks = self
            .response_callbacks
            .iter()
            .cloned()
            .chain(response_callbacks)
            .collect();
        let also_return_response =
            also_return_response.unwrap_or(self.spec.config().also_return_response);

        let pending = self.transport.request(request);
        Ok(HttpFuture::new(
            pending,
            Arc::clone(operation),
            callbacks,
            also_return_response,
        ))
    }
}

/// A resource of a [`SwaggerClient`].
#[derive(Debug)]
pub struct ResourceHandle<'a, T> {
    client: &'a SwaggerClient<T>,
    resource: &'a Resource,
}

impl<'a, T: HttpTransport> ResourceHandle<'a, T> {
    /// The resource definition.
    pub fn resource(&self) -> &'a Resource {
        self.resource
    }

    /// Finds an operation by id, or by its sanitized id.
    ///
    /// # Errors
    ///
    /// Returns [`SwaggerClientError::OperationNotFound`] for unknown names.
    pub fn operation(&self, name: &str) -> Result<CallableOperation<'a, T>, SwaggerClientError> {
        let operation = self
            .resource
            .operation(name)
            .ok_or_else(|| SwaggerClientError::OperationNotFound {
                resource: self.resource.name().to_string(),
                name: name.to_string(),
            })?;
        Ok(CallableOperation {
            client: self.client,
            operation: Arc::clone(operation),
        })
    }
}

/// An operation bound to a client, ready to be called.
#[derive(Debug)]
pub struct CallableOperation<'a, T> {
    client: &'a SwaggerClient<T>,
    operation: Arc<OperationDescriptor>,
}

impl<T: HttpTransport> CallableOperation<'_, T> {
    /// The operation definition.
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.operation
    }

    /// Sends the request and returns the in-flight call.
    ///
    /// # Errors
    ///
    /// Fails when the parameters do not match the operation.
    pub fn call(&self, params: CallParams) -> Result<HttpFuture, SwaggerClientError> {
        self.call_with(params, RequestOptions::default())
    }

    /// Same as [`call`](Self::call), with per-request options.
    ///
    /// # Errors
    ///
    /// Fails when the parameters do not match the operation.
    pub fn call_with(&self, params: CallParams, options: RequestOptions) -> Result<HttpFuture, SwaggerClientError> {
        self.client.call_operation(&self.operation, params, options)
    }
}
