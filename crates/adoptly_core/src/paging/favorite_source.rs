//! Favorites of one shelter, resolved to pets.

use super::{fetch_raw_page, LoadParams, LoadResult, Page, PagingSource};
use crate::error::HasMessage;
use crate::model::pet::{Favorite, Pet, FAVORITES_COLLECTION, PETS_COLLECTION};
use crate::remote::{Direction, DocumentStore, PageCursor, Query, RemoteResult};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

/// Newest favorite first; pets deleted since favoriting are skipped.
pub struct FavoritePetsPagingSource {
    store: Arc<dyn DocumentStore>,
    shelter_id: String,
}

impl FavoritePetsPagingSource {
    pub fn new(store: Arc<dyn DocumentStore>, shelter_id: impl Into<String>) -> Self {
        Self {
            store,
            shelter_id: shelter_id.into(),
        }
    }

    fn query(&self) -> Query {
        Query::collection(FAVORITES_COLLECTION)
            .where_eq("shelterId", self.shelter_id.as_str())
            .order_by("createdAt", Direction::Descending)
    }

    async fn load_page(&self, params: &LoadParams<PageCursor>) -> RemoteResult<Page<PageCursor, Pet>> {
        let raw = fetch_raw_page(self.store.as_ref(), self.query(), params).await?;

        let mut pets = Vec::with_capacity(raw.documents.len());
        for doc in &raw.documents {
            let favorite: Favorite = doc.decode()?;
            match self.store.get(PETS_COLLECTION, &favorite.pet_id).await? {
                Some(pet_doc) => pets.push(pet_doc.decode::<Pet>()?.with_favorite(true)),
                None => debug!(
                    "event=favorite_resolve module=paging status=skipped reason=pet_missing"
                ),
            }
        }

        Ok(Page {
            data: pets,
            prev_key: None,
            next_key: raw.next_key,
        })
    }
}

#[async_trait]
impl PagingSource for FavoritePetsPagingSource {
    type Key = PageCursor;
    type Value = Pet;

    async fn load(&self, params: LoadParams<PageCursor>) -> LoadResult<PageCursor, Pet> {
        match self.load_page(&params).await {
            Ok(page) => LoadResult::Page(page),
            Err(err) => {
                warn!(
                    "event=favorite_page_load module=paging status=error first_page={} error={}",
                    params.key.is_none(),
                    err
                );
                LoadResult::Error(err.user_message())
            }
        }
    }
}
