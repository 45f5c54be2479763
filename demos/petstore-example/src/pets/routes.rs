use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;

use super::domain::{NewPet, Pet, PetId, PetStatus};
use super::repository::PetRepository;
use crate::AppState;
use crate::errors::{ApiErrorResponse, PetStoreError};

pub(crate) fn pet_router() -> Router<AppState> {
    Router::new()
        .route("/pet", post(add_pet))
        .route("/pet/findByStatus", get(find_pets_by_status))
        .route("/pet/{pet_id}", get(get_pet_by_id).delete(delete_pet))
}

/// Statuses from a query string like `status=sold&status=pending`.
///
/// Defaults to `available`; unknown statuses are ignored.
fn requested_statuses(query: Option<&str>) -> Vec<PetStatus> {
    let pairs = query
        .and_then(|query| serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok())
        .unwrap_or_default();
    let requested = pairs
        .iter()
        .filter(|(name, _)| name == "status")
        .flat_map(|(_, value)| value.split(','))
        .collect::<Vec<_>>();

    if requested.is_empty() {
        return vec![PetStatus::Available];
    }
    requested.into_iter().filter_map(PetStatus::parse).collect()
}

#[utoipa::path(
    get,
    path = "/pet/findByStatus",
    tag = "pet",
    operation_id = "findPetsByStatus",
    params(("status" = Option<Vec<String>>, Query, description = "Statuses to look for, `available` by default")),
    responses((status = 200, description = "Matching pets", body = Vec<Pet>))
)]
pub(crate) async fn find_pets_by_status(
    State(repo): State<PetRepository>,
    RawQuery(query): RawQuery,
) -> Json<Vec<Pet>> {
    let statuses = requested_statuses(query.as_deref());
    debug!(?statuses, "finding pets");
    Json(repo.find_by_status(&statuses).await)
}

#[utoipa::path(
    get,
    path = "/pet/{petId}",
    tag = "pet",
    operation_id = "getPetById",
    params(("petId" = i64, Path, description = "The pet id")),
    responses(
        (status = 200, description = "The pet", body = Pet),
        (status = 404, description = "No such pet", body = ApiErrorResponse)
    )
)]
pub(crate) async fn get_pet_by_id(
    State(repo): State<PetRepository>,
    Path(pet_id): Path<i64>,
) -> Result<Json<Pet>, PetStoreError> {
    let pet = repo.get(PetId(pet_id)).await?;
    Ok(Json(pet))
}

#[utoipa::path(
    delete,
    path = "/pet/{petId}",
    tag = "pet",
    operation_id = "deletePet",
    params(("petId" = i64, Path, description = "The pet id")),
    responses(
        (status = 204, description = "Pet deleted"),
        (status = 404, description = "No such pet", body = ApiErrorResponse)
    )
)]
pub(crate) async fn delete_pet(
    State(repo): State<PetRepository>,
    Path(pet_id): Path<i64>,
) -> Result<StatusCode, PetStoreError> {
    repo.delete(PetId(pet_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/pet",
    tag = "pet",
    operation_id = "addPet",
    request_body = NewPet,
    responses((status = 201, description = "Pet created", body = Pet))
)]
pub(crate) async fn add_pet(
    State(repo): State<PetRepository>,
    Json(new_pet): Json<NewPet>,
) -> impl IntoResponse {
    let pet = repo.create(new_pet).await;
    (StatusCode::CREATED, Json(pet))
}
