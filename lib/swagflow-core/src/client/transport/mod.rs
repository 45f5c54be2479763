//! The HTTP boundary of the client.
//!
//! This layer never opens sockets itself: requests go through an
//! [`HttpTransport`], which hands back a [`PendingRequest`] for every request
//! it issues. The default implementation is [`ReqwestTransport`].

use std::fmt::Debug;

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

mod pending;
pub use self::pending::{PendingRequest, ResponseSender, TransportResult};

mod reqwest_transport;
pub use self::reqwest_transport::ReqwestTransport;

/// An asynchronous HTTP transport.
///
/// Implementations start the request and return immediately with a
/// [`PendingRequest`] that resolves once the whole response is available.
/// Blocking clients cannot implement this trait meaningfully: the only way to
/// produce a handle is [`PendingRequest::spawn`], [`PendingRequest::channel`]
/// or an already resolved [`PendingRequest::ready`].
///
/// ```rust,compile_fail
/// use swagflow_core::SwaggerClient;
///
/// // A plain std TCP stream is not an `HttpTransport`
/// let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
/// let builder = SwaggerClient::builder().with_transport(listener);
/// ```
pub trait HttpTransport: Debug + Send + Sync + 'static {
    /// Issues the request, returning a handle on the in-flight response.
    fn request(&self, request: TransportRequest) -> PendingRequest;

    /// Tells whether the runtime this transport relies on is reachable.
    ///
    /// Checked when a client is constructed. The default expects a tokio runtime.
    fn is_runtime_available(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }
}

/// A fully built HTTP request, ready to be sent by a transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

impl TransportRequest {
    /// Creates a request without headers nor body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Adds all the given headers, replacing headers with the same name.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }
}

/// Category of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TransportErrorKind {
    /// The connection could not be established.
    #[display("connection")]
    Connect,
    /// The transport gave up waiting.
    #[display("timeout")]
    Timeout,
    /// The request could not be built or sent.
    #[display("request")]
    Request,
    /// The response body could not be read.
    #[display("body")]
    Body,
    /// The transport dropped the request without resolving it.
    #[display("closed")]
    Closed,
}

/// A failure of the transport, before any response is available.
///
/// Cloneable so a resolved [`PendingRequest`] can hand the same outcome to
/// every reader.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("{kind} error: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    url: Option<Url>,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            url: None,
        }
    }

    /// Attaches the URL of the failed request.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub(crate) fn closed() -> Self {
        Self::new(
            TransportErrorKind::Closed,
            "the request was dropped before a response arrived",
        )
    }

    /// The error category.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The URL of the failed request, if known.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}
