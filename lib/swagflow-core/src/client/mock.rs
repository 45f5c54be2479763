use std::sync::{Arc, Mutex};

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};

use super::response::IncomingResponse;
use super::transport::{HttpTransport, PendingRequest, TransportRequest, TransportResult};

type Handler = Arc<dyn Fn(&TransportRequest) -> TransportResult + Send + Sync>;

/// In-memory transport, answering with a handler and recording requests.
#[derive(derive_more::Debug, Clone)]
pub(crate) struct MockTransport {
    #[debug(skip)]
    handler: Handler,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    runtime_available: bool,
}

impl MockTransport {
    pub(crate) fn new(handler: impl Fn(&TransportRequest) -> TransportResult + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
            runtime_available: true,
        }
    }

    pub(crate) fn json(status: StatusCode, body: &'static str) -> Self {
        Self::new(move |_| Ok(json_response(status, body)))
    }

    pub(crate) fn without_runtime(mut self) -> Self {
        self.runtime_available = false;
        self
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl HttpTransport for MockTransport {
    fn request(&self, request: TransportRequest) -> PendingRequest {
        let result = (self.handler)(&request);
        self.requests.lock().expect("lock").push(request);
        PendingRequest::ready(result)
    }

    fn is_runtime_available(&self) -> bool {
        self.runtime_available
    }
}

pub(crate) fn json_response(status: StatusCode, body: &'static str) -> IncomingResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    IncomingResponse::new(status, headers, body)
}

pub(crate) fn init_tracing() {
    // already initialized by another test
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
