#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::info;

use swagflow_core::{SwaggerClient, SwaggerClientBuilder};

use petstore_example::{AppState, serve};

#[derive(Debug, derive_more::Deref)]
pub struct TestApp {
    #[deref]
    client: SwaggerClient,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(SwaggerClient::builder()).await
    }

    pub async fn start_with(builder: SwaggerClientBuilder) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("binding test listener")?;
        let addr = listener.local_addr().context("reading local address")?;
        info!(%addr, "launching server");
        let state = AppState::bundled().context("seeding pets")?;
        let server = tokio::spawn(async move {
            serve(listener, state).await.expect("server running");
        });

        let spec_url = format!("http://{addr}/api/openapi.json");
        let client = builder
            .load(&spec_url)
            .await
            .with_context(|| format!("loading {spec_url}"))?;

        Ok(Self {
            client,
            addr,
            server,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client(&self) -> &SwaggerClient {
        &self.client
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}
