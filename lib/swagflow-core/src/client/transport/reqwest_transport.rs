use reqwest::{Body, Request};
use tracing::debug;
use url::Url;

use super::{HttpTransport, PendingRequest, TransportError, TransportErrorKind, TransportRequest};
use crate::client::response::IncomingResponse;

/// [`HttpTransport`] backed by a [`reqwest::Client`].
///
/// Each request runs as its own task on the current tokio runtime; the whole
/// body is read before the [`PendingRequest`] resolves.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Uses a preconfigured reqwest client (timeouts, proxies, default headers...).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

impl HttpTransport for ReqwestTransport {
    fn request(&self, request: TransportRequest) -> PendingRequest {
        let client = self.client.clone();
        PendingRequest::spawn(execute(client, request))
    }
}

async fn execute(
    client: reqwest::Client,
    request: TransportRequest,
) -> Result<IncomingResponse, TransportError> {
    let TransportRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let mut request = Request::new(method, url.clone());
    *request.headers_mut() = headers;
    if let Some(body) = body {
        *request.body_mut() = Some(Body::from(body));
    }

    debug!(?request, "sending...");
    let response = client
        .execute(request)
        .await
        .map_err(|error| to_transport_error(&url, &error))?;
    debug!(?response, "...receiving");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|error| to_transport_error(&url, &error))?;

    Ok(IncomingResponse::new(status, headers, body).with_url(url))
}

fn to_transport_error(url: &Url, error: &reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Request
    };
    TransportError::new(kind, error.to_string()).with_url(url.clone())
}
