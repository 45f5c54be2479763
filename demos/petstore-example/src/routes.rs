use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use utoipa::OpenApi;

use crate::AppState;
use crate::errors::ApiErrorResponse;
use crate::pets::domain::{Inventory, NewPet, Pet, PetId, PetStatus};
use crate::pets::repository::PetRepository;
use crate::pets::routes::pet_router;
use crate::store::store_router;

/// The OpenAPI description of the petstore, served at `/api/openapi.json`
#[derive(OpenApi)]
#[openapi(
    info(title = "Petstore", version = "1.0.0", description = "A tiny petstore"),
    servers((url = "/api")),
    paths(
        crate::pets::routes::find_pets_by_status,
        crate::pets::routes::get_pet_by_id,
        crate::pets::routes::delete_pet,
        crate::pets::routes::add_pet,
        crate::store::get_inventory,
        crate::store::slow_ping,
    ),
    components(schemas(Pet, PetId, PetStatus, NewPet, Inventory, ApiErrorResponse)),
    tags((name = "pet", description = "Pets"), (name = "store", description = "The store"))
)]
pub struct ApiDoc;

/// The application router
pub fn app_router() -> Router<AppState> {
    let api = Router::new()
        .merge(pet_router())
        .merge(store_router())
        .route("/health", get(health))
        .route("/openapi.json", get(|| async move { Json(ApiDoc::openapi()) }));

    Router::new().nest("/api", api)
}

async fn health(State(repository): State<PetRepository>) -> impl IntoResponse {
    let inventory = repository.inventory().await;

    Json(json!({
        "status": "OK",
        "pets": inventory,
    }))
}
