use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pets::domain::PetId;

/// Failures of the petstore, each mapped to a status code.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub(crate) enum PetStoreError {
    #[display("Invalid pets fixture: {_0}")]
    InvalidFixture(serde_json::Error),

    #[display("Pet {id} not found")]
    #[from(skip)]
    PetNotFound { id: PetId },

    // pet #666, always a server error
    #[display("Pet {id} is cursed")]
    #[from(skip)]
    CursedPet { id: PetId },
}

impl PetStoreError {
    fn status(&self) -> StatusCode {
        match self {
            Self::PetNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidFixture(_) | Self::CursedPet { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// What went wrong
    pub message: String,
}

impl IntoResponse for PetStoreError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
