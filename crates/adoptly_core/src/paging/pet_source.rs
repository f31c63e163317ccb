//! Paged pet listing query with favorite and view annotation passes.
//!
//! # Responsibility
//! - Build the remote pet query from owner/field filters.
//! - Apply the radius filter and per-item annotations on each page.
//!
//! # Invariants
//! - Results are ordered by `createdAt DESC` (id DESC on ties).
//! - Radius filtering never changes the continuation cursor: the cursor always
//!   points at the last raw document returned by the store.
//! - `is_favorite` is only set when a browsing shelter is known.
//! - `view_count` is only set for owner listings.

use super::{fetch_raw_page, LoadParams, LoadResult, Page, PagingSource};
use crate::error::HasMessage;
use crate::model::geo::GeoPoint;
use crate::model::pet::{
    Favorite, Gender, Pet, PetSize, Species, FAVORITES_COLLECTION, PETS_COLLECTION,
    VIEWS_COLLECTION,
};
use crate::remote::{Direction, DocumentStore, FilterOp, PageCursor, Query, RemoteResult};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// Field-equality and range filters for pet browsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetFilter {
    pub species: Option<Species>,
    pub gender: Option<Gender>,
    pub size: Option<PetSize>,
    pub min_age_months: Option<i64>,
    pub max_age_months: Option<i64>,
    pub vaccinated: Option<bool>,
    pub city: Option<String>,
    /// Adopted pets are hidden unless set.
    pub include_adopted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl RadiusFilter {
    /// Pets without a location are excluded.
    pub fn contains(&self, pet: &Pet) -> bool {
        pet.location
            .is_some_and(|location| location.distance_km(&self.center) <= self.radius_km)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetQuery {
    /// Restricts the listing to one volunteer's pets.
    pub owner_id: Option<String>,
    pub filter: PetFilter,
    pub radius: Option<RadiusFilter>,
}

impl PetQuery {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            filter: PetFilter {
                include_adopted: true,
                ..PetFilter::default()
            },
            radius: None,
        }
    }

    /// Remote query without limit/cursor.
    pub fn to_query(&self) -> Query {
        let mut query = Query::collection(PETS_COLLECTION);
        if let Some(owner_id) = &self.owner_id {
            query = query.where_eq("ownerId", owner_id.as_str());
        }

        let filter = &self.filter;
        if let Some(species) = filter.species {
            query = query.where_eq("species", species.as_str());
        }
        if let Some(gender) = filter.gender {
            query = query.where_eq("gender", gender.as_str());
        }
        if let Some(size) = filter.size {
            query = query.where_eq("size", size.as_str());
        }
        if let Some(vaccinated) = filter.vaccinated {
            query = query.where_eq("vaccinated", vaccinated);
        }
        if let Some(city) = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query = query.where_eq("city", city);
        }
        if !filter.include_adopted {
            query = query.where_eq("adopted", false);
        }
        if let Some(min) = filter.min_age_months {
            query = query.filter("ageMonths", FilterOp::GreaterThanOrEqual, min);
        }
        if let Some(max) = filter.max_age_months {
            query = query.filter("ageMonths", FilterOp::LessThanOrEqual, max);
        }

        query.order_by("createdAt", Direction::Descending)
    }
}

/// Paged pet listing for browse screens and a volunteer's own listings.
pub struct PetPagingSource {
    store: Arc<dyn DocumentStore>,
    query: PetQuery,
    viewer_shelter_id: Option<String>,
}

impl PetPagingSource {
    pub fn new(store: Arc<dyn DocumentStore>, query: PetQuery) -> Self {
        Self {
            store,
            query,
            viewer_shelter_id: None,
        }
    }

    /// Annotates each pet with whether `shelter_id` favorited it.
    pub fn viewed_by_shelter(mut self, shelter_id: impl Into<String>) -> Self {
        self.viewer_shelter_id = Some(shelter_id.into());
        self
    }

    pub fn query(&self) -> &PetQuery {
        &self.query
    }

    async fn load_page(&self, params: &LoadParams<PageCursor>) -> RemoteResult<Page<PageCursor, Pet>> {
        let raw = fetch_raw_page(self.store.as_ref(), self.query.to_query(), params).await?;

        let mut pets = raw
            .documents
            .iter()
            .map(|doc| doc.decode::<Pet>())
            .collect::<RemoteResult<Vec<_>>>()?;
        if let Some(radius) = &self.query.radius {
            pets.retain(|pet| radius.contains(pet));
        }

        let mut annotated = Vec::with_capacity(pets.len());
        for pet in pets {
            annotated.push(self.annotate(pet).await?);
        }

        Ok(Page {
            data: annotated,
            prev_key: None,
            next_key: raw.next_key,
        })
    }

    async fn annotate(&self, pet: Pet) -> RemoteResult<Pet> {
        let mut pet = pet;
        if let Some(shelter_id) = &self.viewer_shelter_id {
            let favorite = is_favorite(self.store.as_ref(), shelter_id, &pet.id).await?;
            pet = pet.with_favorite(favorite);
        }
        if self.query.owner_id.is_some() {
            let count = count_views(self.store.as_ref(), &pet.id).await?;
            pet = pet.with_view_count(count);
        }
        Ok(pet)
    }
}

#[async_trait]
impl PagingSource for PetPagingSource {
    type Key = PageCursor;
    type Value = Pet;

    async fn load(&self, params: LoadParams<PageCursor>) -> LoadResult<PageCursor, Pet> {
        match self.load_page(&params).await {
            Ok(page) => LoadResult::Page(page),
            Err(err) => {
                warn!(
                    "event=pet_page_load module=paging status=error first_page={} error={}",
                    params.key.is_none(),
                    err
                );
                LoadResult::Error(err.user_message())
            }
        }
    }
}

/// Point read in the favorites join collection.
pub(crate) async fn is_favorite(
    store: &dyn DocumentStore,
    shelter_id: &str,
    pet_id: &str,
) -> RemoteResult<bool> {
    let id = Favorite::document_id(shelter_id, pet_id);
    Ok(store.get(FAVORITES_COLLECTION, &id).await?.is_some())
}

/// Distinct shelters that opened the listing.
pub(crate) async fn count_views(store: &dyn DocumentStore, pet_id: &str) -> RemoteResult<u64> {
    store
        .count(&Query::collection(VIEWS_COLLECTION).where_eq("petId", pet_id))
        .await
}
