//! Shelter favorites over the `favorites` join collection.

use super::{ServiceError, ServiceResult};
use crate::model::now_millis;
use crate::model::pet::{Favorite, FAVORITES_COLLECTION, PETS_COLLECTION};
use crate::paging::{is_favorite, FavoritePetsPagingSource};
use crate::remote::{to_fields, DocumentStore};
use log::info;
use std::sync::Arc;

pub struct FavoriteService {
    store: Arc<dyn DocumentStore>,
}

impl FavoriteService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Adding an existing favorite is a no-op rewrite of the join record.
    pub async fn add(&self, shelter_id: &str, pet_id: &str) -> ServiceResult<()> {
        if self.store.get(PETS_COLLECTION, pet_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("pet {pet_id}")));
        }
        let favorite = Favorite {
            shelter_id: shelter_id.to_string(),
            pet_id: pet_id.to_string(),
            created_at: now_millis(),
        };
        self.store
            .set(
                FAVORITES_COLLECTION,
                &Favorite::document_id(shelter_id, pet_id),
                to_fields(&favorite)?,
            )
            .await?;
        info!("event=favorite_add module=favorite status=ok");
        Ok(())
    }

    pub async fn remove(&self, shelter_id: &str, pet_id: &str) -> ServiceResult<()> {
        self.store
            .delete(
                FAVORITES_COLLECTION,
                &Favorite::document_id(shelter_id, pet_id),
            )
            .await?;
        info!("event=favorite_remove module=favorite status=ok");
        Ok(())
    }

    /// Flips the favorite state and returns the new state.
    pub async fn toggle(&self, shelter_id: &str, pet_id: &str) -> ServiceResult<bool> {
        if self.is_favorite(shelter_id, pet_id).await? {
            self.remove(shelter_id, pet_id).await?;
            Ok(false)
        } else {
            self.add(shelter_id, pet_id).await?;
            Ok(true)
        }
    }

    pub async fn is_favorite(&self, shelter_id: &str, pet_id: &str) -> ServiceResult<bool> {
        Ok(is_favorite(self.store.as_ref(), shelter_id, pet_id).await?)
    }

    pub fn favorites_source(&self, shelter_id: &str) -> FavoritePetsPagingSource {
        FavoritePetsPagingSource::new(Arc::clone(&self.store), shelter_id)
    }
}
