//! A tiny petstore, documented with utoipa and exercised by the swagflow client.
#![allow(missing_docs)]
use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod errors;
mod routes;
mod state;
mod store;

pub mod pets;

pub use self::routes::ApiDoc;
pub use self::state::AppState;

/// Serves the petstore on `listener`, the API lives under `/api`.
///
/// # Errors
///
/// Fails if the listener address cannot be read, or when the server stops on an I/O error.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("reading listener address")?;
    info!("petstore ready, specification at http://{addr}/api/openapi.json");

    let app = routes::app_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    axum::serve(listener, app).await.context("serving petstore")
}
