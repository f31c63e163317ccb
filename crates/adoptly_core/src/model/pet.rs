//! Pet listing model.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `age_months` is never negative.
//! - `location`, when set, is a valid coordinate.
//! - `is_favorite` and `view_count` are filled by paging/read paths only.

use crate::model::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Remote collection holding pet listings.
pub const PETS_COLLECTION: &str = "pets";
/// Join collection linking shelters to favorited pets.
pub const FAVORITES_COLLECTION: &str = "favorites";
/// Collection of per-shelter pet views.
pub const VIEWS_COLLECTION: &str = "views";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Other,
}

impl Species {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Bird => "bird",
            Self::Rabbit => "rabbit",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl PetSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Validation failures for pet listings.
#[derive(Debug, Clone, PartialEq)]
pub enum PetValidationError {
    EmptyName,
    EmptyOwner,
    NegativeAge(i64),
    InvalidLocation(GeoPoint),
}

impl Display for PetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "pet name cannot be empty"),
            Self::EmptyOwner => write!(f, "pet owner id cannot be empty"),
            Self::NegativeAge(age) => write!(f, "pet age cannot be negative: {age}"),
            Self::InvalidLocation(point) => write!(
                f,
                "invalid pet location ({}, {})",
                point.latitude, point.longitude
            ),
        }
    }
}

impl Error for PetValidationError {}

/// Adoptable animal listed by a volunteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: Species,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age_months: Option<i64>,
    #[serde(default)]
    pub size: Option<PetSize>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub neutered: bool,
    #[serde(default)]
    pub adopted: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(skip)]
    pub is_favorite: bool,
    #[serde(skip)]
    pub view_count: Option<u64>,
}

impl Pet {
    /// Creates an unsaved listing; `id` and `created_at` are set on insert.
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>, species: Species) -> Self {
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            name: name.into(),
            species,
            breed: None,
            gender: None,
            age_months: None,
            size: None,
            color: None,
            description: None,
            images: Vec::new(),
            location: None,
            city: None,
            vaccinated: false,
            neutered: false,
            adopted: false,
            created_at: 0,
            is_favorite: false,
            view_count: None,
        }
    }

    pub fn validate(&self) -> Result<(), PetValidationError> {
        if self.name.trim().is_empty() {
            return Err(PetValidationError::EmptyName);
        }
        if self.owner_id.trim().is_empty() {
            return Err(PetValidationError::EmptyOwner);
        }
        if let Some(age) = self.age_months {
            if age < 0 {
                return Err(PetValidationError::NegativeAge(age));
            }
        }
        if let Some(point) = self.location {
            if !point.is_valid() {
                return Err(PetValidationError::InvalidLocation(point));
            }
        }
        Ok(())
    }

    /// Copy with the favorite annotation replaced.
    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// Copy with the view-count annotation replaced.
    pub fn with_view_count(mut self, view_count: u64) -> Self {
        self.view_count = Some(view_count);
        self
    }

    /// Copy marked as adopted.
    pub fn adopted(mut self) -> Self {
        self.adopted = true;
        self
    }

    /// Cover image shown in list cells.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Join record: one shelter favorited one pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub shelter_id: String,
    pub pet_id: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Favorite {
    /// Deterministic join document id, one per (shelter, pet) pair.
    pub fn document_id(shelter_id: &str, pet_id: &str) -> String {
        join_id(shelter_id, pet_id)
    }
}

/// One shelter opening one pet listing; repeated views collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetView {
    pub pet_id: String,
    pub shelter_id: String,
    #[serde(default)]
    pub viewed_at: i64,
}

impl PetView {
    pub fn document_id(pet_id: &str, shelter_id: &str) -> String {
        join_id(pet_id, shelter_id)
    }
}

/// `{left}_{right}` with `%` and `_` escaped in both parts, so distinct
/// pairs never share an id.
fn join_id(left: &str, right: &str) -> String {
    format!("{}_{}", escape_id_part(left), escape_id_part(right))
}

fn escape_id_part(part: &str) -> String {
    part.replace('%', "%25").replace('_', "%5F")
}

#[cfg(test)]
mod tests {
    use super::{Favorite, Pet, PetValidationError, PetView, Species};
    use crate::model::geo::GeoPoint;

    #[test]
    fn serialization_uses_camel_case_and_skips_annotations() {
        let mut pet = Pet::new("vol-1", "Luna", Species::Cat).with_favorite(true);
        pet.age_months = Some(8);
        pet.created_at = 1_700_000_000_000;

        let json = serde_json::to_value(&pet).unwrap();
        assert_eq!(json["ownerId"], "vol-1");
        assert_eq!(json["species"], "cat");
        assert_eq!(json["ageMonths"], 8);
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert!(json.get("isFavorite").is_none());
        assert!(json.get("viewCount").is_none());
    }

    #[test]
    fn missing_optional_fields_decode_to_defaults() {
        let pet: Pet = serde_json::from_value(serde_json::json!({
            "ownerId": "vol-1",
            "name": "Rex",
            "species": "dog"
        }))
        .unwrap();
        assert!(pet.images.is_empty());
        assert!(!pet.adopted);
        assert_eq!(pet.cover_image(), None);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut pet = Pet::new("vol-1", "  ", Species::Dog);
        assert_eq!(pet.validate(), Err(PetValidationError::EmptyName));

        pet.name = "Rex".to_string();
        pet.age_months = Some(-1);
        assert_eq!(pet.validate(), Err(PetValidationError::NegativeAge(-1)));

        pet.age_months = Some(3);
        pet.location = Some(GeoPoint::new(100.0, 0.0));
        assert!(matches!(
            pet.validate(),
            Err(PetValidationError::InvalidLocation(_))
        ));
    }

    #[test]
    fn join_ids_stay_distinct_when_ids_contain_underscores() {
        assert_eq!(Favorite::document_id("s1", "p1"), "s1_p1");
        assert_ne!(
            Favorite::document_id("a_b", "c"),
            Favorite::document_id("a", "b_c")
        );
        assert_ne!(
            PetView::document_id("a%5F", "b"),
            PetView::document_id("a_", "b")
        );
        assert_eq!(PetView::document_id("pet_1", "s"), "pet%5F1_s");
    }
}
