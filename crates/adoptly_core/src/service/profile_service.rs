//! Volunteer and shelter profile use cases.

use super::{require_text, ServiceError, ServiceResult};
use crate::model::user::{Shelter, Volunteer, SHELTERS_COLLECTION, VOLUNTEERS_COLLECTION};
use crate::remote::{to_fields, Direction, DocumentStore, Query, RemoteResult};
use crate::upload::{ImageHost, ImageUpload};
use log::info;
use std::sync::Arc;

/// Upper bound for the shelter directory listing.
const SHELTER_LIST_LIMIT: u32 = 200;

pub struct ProfileService<H: ImageHost> {
    store: Arc<dyn DocumentStore>,
    images: H,
}

impl<H: ImageHost> ProfileService<H> {
    pub fn new(store: Arc<dyn DocumentStore>, images: H) -> Self {
        Self { store, images }
    }

    pub async fn get_volunteer(&self, id: &str) -> ServiceResult<Volunteer> {
        self.store
            .get(VOLUNTEERS_COLLECTION, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("volunteer {id}")))?
            .decode()
            .map_err(ServiceError::from)
    }

    pub async fn get_shelter(&self, id: &str) -> ServiceResult<Shelter> {
        self.store
            .get(SHELTERS_COLLECTION, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("shelter {id}")))?
            .decode()
            .map_err(ServiceError::from)
    }

    /// Replaces the profile; a new avatar is uploaded first when given.
    pub async fn update_volunteer(
        &self,
        volunteer: &Volunteer,
        avatar: Option<&ImageUpload>,
    ) -> ServiceResult<Volunteer> {
        require_text("id", &volunteer.id)?;
        require_text("name", &volunteer.name)?;
        let mut updated = volunteer.clone();
        if let Some(avatar) = avatar {
            updated.image = Some(self.images.upload(avatar).await?.url);
        }
        self.store
            .update(VOLUNTEERS_COLLECTION, &updated.id, to_fields(&updated)?)
            .await?;
        info!("event=profile_update module=profile status=ok role=volunteer");
        Ok(updated)
    }

    pub async fn update_shelter(
        &self,
        shelter: &Shelter,
        avatar: Option<&ImageUpload>,
    ) -> ServiceResult<Shelter> {
        require_text("id", &shelter.id)?;
        require_text("name", &shelter.name)?;
        let mut updated = shelter.clone();
        if let Some(avatar) = avatar {
            updated.image = Some(self.images.upload(avatar).await?.url);
        }
        self.store
            .update(SHELTERS_COLLECTION, &updated.id, to_fields(&updated)?)
            .await?;
        info!("event=profile_update module=profile status=ok role=shelter");
        Ok(updated)
    }

    /// Shelter directory sorted by name.
    pub async fn list_shelters(&self) -> ServiceResult<Vec<Shelter>> {
        let query = Query::collection(SHELTERS_COLLECTION)
            .order_by("name", Direction::Ascending)
            .limit(SHELTER_LIST_LIMIT);
        let shelters = self
            .store
            .query(&query)
            .await?
            .iter()
            .map(|doc| doc.decode::<Shelter>())
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(shelters)
    }
}
