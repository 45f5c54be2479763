use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::warn;

use crate::AppState;
use crate::pets::domain::Inventory;
use crate::pets::repository::PetRepository;

const APP_MSGPACK: &str = "application/msgpack";

const SLOW_DELAY: Duration = Duration::from_millis(300);

pub(crate) fn store_router() -> Router<AppState> {
    Router::new()
        .route("/store/inventory", get(get_inventory))
        .route("/store/slow", get(slow_ping))
}

#[utoipa::path(
    get,
    path = "/store/inventory",
    tag = "store",
    operation_id = "getInventory",
    responses((status = 200, description = "Pet count by status", body = Inventory, content_type = "application/msgpack"))
)]
pub(crate) async fn get_inventory(State(repo): State<PetRepository>) -> impl IntoResponse {
    let inventory = repo.inventory().await;
    match rmp_serde::to_vec_named(&inventory) {
        Ok(body) => ([(header::CONTENT_TYPE, APP_MSGPACK)], body).into_response(),
        Err(error) => {
            warn!(%error, "cannot encode inventory");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/store/slow",
    tag = "store",
    operation_id = "slowPing",
    responses((status = 200, description = "A late pong", body = String, content_type = "text/plain"))
)]
pub(crate) async fn slow_ping() -> &'static str {
    tokio::time::sleep(SLOW_DELAY).await;
    "pong"
}
