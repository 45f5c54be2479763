use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::domain::{Inventory, NewPet, Pet, PetId, PetStatus};
use crate::errors::PetStoreError;

const CURSED: PetId = PetId(666);

#[derive(Clone)]
pub(crate) struct PetRepository {
    data: Arc<RwLock<BTreeMap<PetId, Pet>>>,
}

impl PetRepository {
    /// Pets read from a JSON array, keyed by id.
    pub(crate) fn from_json(json: &str) -> Result<Self, PetStoreError> {
        let pets = serde_json::from_str::<Vec<Pet>>(json)?;
        let data = pets.into_iter().map(|pet| (pet.id, pet)).collect();

        Ok(Self {
            data: Arc::new(RwLock::new(data)),
        })
    }

    pub(crate) async fn find_by_status(&self, statuses: &[PetStatus]) -> Vec<Pet> {
        let data = self.data.read().await;
        data.values()
            .filter(|pet| pet.id != CURSED && statuses.contains(&pet.status))
            .cloned()
            .collect()
    }

    pub(crate) async fn get(&self, id: PetId) -> Result<Pet, PetStoreError> {
        if id == CURSED {
            return Err(PetStoreError::CursedPet { id });
        }
        let data = self.data.read().await;
        data.get(&id)
            .cloned()
            .ok_or(PetStoreError::PetNotFound { id })
    }

    pub(crate) async fn create(&self, new_pet: NewPet) -> Pet {
        let mut data = self.data.write().await;
        let id = {
            let max = data.keys().map(|it| it.0).filter(|&it| it != CURSED.0).max().unwrap_or(0);
            PetId(max + 1)
        };
        let pet = Pet {
            id,
            name: new_pet.name,
            status: new_pet.status.unwrap_or(PetStatus::Available),
            tag: new_pet.tag,
        };
        data.insert(id, pet.clone());

        pet
    }

    pub(crate) async fn delete(&self, id: PetId) -> Result<(), PetStoreError> {
        let mut data = self.data.write().await;
        data.remove(&id)
            .map(|_| ())
            .ok_or(PetStoreError::PetNotFound { id })
    }

    pub(crate) async fn inventory(&self) -> Inventory {
        let data = self.data.read().await;
        data.values()
            .filter(|pet| pet.id != CURSED)
            .fold(Inventory::default(), |mut inventory, pet| {
                match pet.status {
                    PetStatus::Available => inventory.available += 1,
                    PetStatus::Pending => inventory.pending += 1,
                    PetStatus::Sold => inventory.sold += 1,
                }
                inventory
            })
    }
}
