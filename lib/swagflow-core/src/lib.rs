//! # Swagflow Core
//!
//! Asynchronous client for HTTP APIs described by Swagger 2.0 or OpenAPI 3 documents.
//!
//! The specification is loaded once, from a URL or a file, and its operations
//! are grouped into resources. Calling an operation sends the request right
//! away and returns an [`HttpFuture`]; awaiting it decodes the response
//! (JSON, MessagePack or text), validates it against the declared schema and
//! hands back the result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use swagflow_core::{CallParams, SwaggerClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SwaggerClient::from_url("http://petstore.swagger.io/v2/swagger.json").await?;
//!
//! let future = client
//!     .resource("pet")?
//!     .operation("getPetById")?
//!     .call(CallParams::new().add_param("petId", 42))?;
//!
//! // Wait at most one second, the request keeps going on timeout
//! let pet = future
//!     .result(Some(std::time::Duration::from_secs(1)))
//!     .await?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Statuses outside `2xx` fail with [`SwaggerClientError::Http`]. When the
//! operation declares a schema for that status, the decoded payload is
//! available with [`HttpError::swagger_result`]:
//!
//! ```rust,no_run
//! # use swagflow_core::{CallParams, SwaggerClient};
//! # async fn example(client: SwaggerClient) -> Result<(), Box<dyn std::error::Error>> {
//! let result = client
//!     .resource("pet")?
//!     .operation("getPetById")?
//!     .call(CallParams::new().add_param("petId", 404))?
//!     .await;
//!
//! if let Err(error) = result
//!     && let Some(http) = error.as_http()
//! {
//!     println!("{}: {:?}", http.status(), http.swagger_result());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! Requests go through an [`HttpTransport`]. The default one is backed by
//! `reqwest` and needs a tokio runtime, which is checked when the client is
//! built.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod client;
pub mod spec;

pub use self::client::response::{HttpError, IncomingResponse, UnmarshalError, unmarshal_response, unmarshal_response_inner};
pub use self::client::transport::{
    HttpTransport, PendingRequest, ReqwestTransport, ResponseSender, TransportError, TransportErrorKind,
    TransportRequest, TransportResult,
};
pub use self::client::{
    CallOutput, CallParams, CallableOperation, HttpFuture, OperationDescriptor, ParamStyle, ParameterLocation,
    ParameterSpec, RequestBodySpec, RequestOptions, Resource, ResourceHandle, ResponseCallback, SwaggerClient,
    SwaggerClientBuilder, SwaggerClientError,
};
pub use self::spec::{
    JsonSchemaValidator, LoadedSpec, Loader, ResponseValidator, Spec, SpecConfig, ValidationError, load_file, load_url,
};
