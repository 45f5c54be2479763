use crate::pets::repository::PetRepository;

const BUNDLED_PETS: &str = include_str!("pets/db.json");

/// Shared state of the petstore handlers.
#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    repository: PetRepository,
}

impl AppState {
    /// The petstore seeded with the bundled pets.
    ///
    /// # Errors
    ///
    /// Fails if the bundled fixture is not a valid list of pets.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_fixture(BUNDLED_PETS)
    }

    /// The petstore seeded from a JSON array of pets.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not a valid list of pets.
    pub fn from_fixture(json: &str) -> anyhow::Result<Self> {
        let repository = PetRepository::from_json(json)?;
        Ok(Self { repository })
    }
}
