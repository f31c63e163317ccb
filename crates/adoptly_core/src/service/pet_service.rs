//! Pet listing use cases.
//!
//! # Responsibility
//! - Create, edit, adopt and delete a volunteer's listings.
//! - Record shelter views and build paging sources for list screens.
//!
//! # Invariants
//! - Images are uploaded before the listing is written; a failed upload
//!   leaves no partial listing behind.
//! - Only the owning volunteer may update, adopt or delete a listing.
//! - Deleting a listing also deletes its favorites and view records.

use super::{ServiceError, ServiceResult};
use crate::model::now_millis;
use crate::model::pet::{
    Pet, PetView, FAVORITES_COLLECTION, PETS_COLLECTION, VIEWS_COLLECTION,
};
use crate::paging::{count_views, is_favorite, PetPagingSource, PetQuery};
use crate::remote::{to_fields, DocumentStore, Fields, Query};
use crate::upload::{ImageHost, ImageUpload};
use log::info;
use serde_json::Value;
use std::sync::Arc;

pub struct PetService<H: ImageHost> {
    store: Arc<dyn DocumentStore>,
    images: H,
}

impl<H: ImageHost> PetService<H> {
    pub fn new(store: Arc<dyn DocumentStore>, images: H) -> Self {
        Self { store, images }
    }

    /// Uploads `images`, then stores the listing with a generated id.
    pub async fn add_pet(&self, pet: &Pet, images: &[ImageUpload]) -> ServiceResult<Pet> {
        pet.validate()?;
        let mut created = pet.clone();
        created.images.extend(self.upload_all(images).await?);
        created.adopted = false;
        created.created_at = now_millis();

        created.id = self
            .store
            .add(PETS_COLLECTION, to_fields(&created)?)
            .await?;
        info!(
            "event=pet_add module=pet status=ok species={} images={}",
            created.species.as_str(),
            created.images.len()
        );
        Ok(created)
    }

    /// Replaces the listing fields; `new_images` are appended to its gallery.
    pub async fn update_pet(
        &self,
        owner_id: &str,
        pet: &Pet,
        new_images: &[ImageUpload],
    ) -> ServiceResult<Pet> {
        pet.validate()?;
        let stored = self.owned_pet(owner_id, &pet.id).await?;

        let mut updated = pet.clone();
        updated.owner_id = stored.owner_id;
        updated.created_at = stored.created_at;
        updated.images.extend(self.upload_all(new_images).await?);
        self.store
            .update(PETS_COLLECTION, &updated.id, to_fields(&updated)?)
            .await?;
        info!("event=pet_update module=pet status=ok");
        Ok(updated)
    }

    pub async fn mark_adopted(&self, owner_id: &str, pet_id: &str) -> ServiceResult<Pet> {
        let stored = self.owned_pet(owner_id, pet_id).await?;
        let mut patch = Fields::new();
        patch.insert("adopted".to_string(), Value::Bool(true));
        self.store.update(PETS_COLLECTION, pet_id, patch).await?;
        info!("event=pet_adopted module=pet status=ok");
        Ok(stored.adopted())
    }

    /// Deletes the listing together with its favorites and views.
    pub async fn delete_pet(&self, owner_id: &str, pet_id: &str) -> ServiceResult<()> {
        self.owned_pet(owner_id, pet_id).await?;

        let mut removed = 0usize;
        for collection in [FAVORITES_COLLECTION, VIEWS_COLLECTION] {
            let query = Query::collection(collection).where_eq("petId", pet_id);
            for doc in self.store.query(&query).await? {
                self.store.delete(collection, &doc.id).await?;
                removed += 1;
            }
        }
        self.store.delete(PETS_COLLECTION, pet_id).await?;
        info!("event=pet_delete module=pet status=ok related_removed={removed}");
        Ok(())
    }

    /// Single listing, annotated for the browsing shelter when given.
    pub async fn get_pet(&self, pet_id: &str, viewer_shelter_id: Option<&str>) -> ServiceResult<Pet> {
        let pet: Pet = self
            .store
            .get(PETS_COLLECTION, pet_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("pet {pet_id}")))?
            .decode()?;
        match viewer_shelter_id {
            Some(shelter_id) => {
                let favorite = is_favorite(self.store.as_ref(), shelter_id, pet_id).await?;
                Ok(pet.with_favorite(favorite))
            }
            None => Ok(pet),
        }
    }

    /// Records that a shelter opened the listing; repeated views collapse.
    pub async fn record_view(&self, pet_id: &str, shelter_id: &str) -> ServiceResult<()> {
        let view = PetView {
            pet_id: pet_id.to_string(),
            shelter_id: shelter_id.to_string(),
            viewed_at: now_millis(),
        };
        self.store
            .set(
                VIEWS_COLLECTION,
                &PetView::document_id(pet_id, shelter_id),
                to_fields(&view)?,
            )
            .await?;
        Ok(())
    }

    /// Distinct shelters that viewed the listing.
    pub async fn view_count(&self, pet_id: &str) -> ServiceResult<u64> {
        Ok(count_views(self.store.as_ref(), pet_id).await?)
    }

    /// Browse listing for a shelter, with favorite annotation.
    pub fn browse_source(&self, query: PetQuery, shelter_id: &str) -> PetPagingSource {
        PetPagingSource::new(Arc::clone(&self.store), query).viewed_by_shelter(shelter_id)
    }

    /// A volunteer's own listings, with view counts.
    pub fn owner_source(&self, owner_id: &str) -> PetPagingSource {
        PetPagingSource::new(Arc::clone(&self.store), PetQuery::owned_by(owner_id))
    }

    async fn owned_pet(&self, owner_id: &str, pet_id: &str) -> ServiceResult<Pet> {
        let pet: Pet = self
            .store
            .get(PETS_COLLECTION, pet_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("pet {pet_id}")))?
            .decode()?;
        if pet.owner_id != owner_id {
            return Err(ServiceError::NotOwner(format!("pet {pet_id}")));
        }
        Ok(pet)
    }

    async fn upload_all(&self, images: &[ImageUpload]) -> ServiceResult<Vec<String>> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            urls.push(self.images.upload(image).await?.url);
        }
        Ok(urls)
    }
}
