//! Account roles and profile records.

use crate::model::geo::GeoPoint;
use serde::{Deserialize, Serialize};

pub const USERS_COLLECTION: &str = "users";
pub const VOLUNTEERS_COLLECTION: &str = "volunteers";
pub const SHELTERS_COLLECTION: &str = "shelters";

/// Which side of the app an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Individual listing pets for adoption.
    Volunteer,
    /// Organization browsing and adopting listed pets.
    Shelter,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::Shelter => "shelter",
        }
    }

    pub fn profile_collection(self) -> &'static str {
        match self {
            Self::Volunteer => VOLUNTEERS_COLLECTION,
            Self::Shelter => SHELTERS_COLLECTION,
        }
    }
}

/// Role document stored under `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Volunteer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            image: None,
            city: None,
            location: None,
            bio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shelter {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Shelter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            image: None,
            address: None,
            city: None,
            location: None,
            website: None,
            description: None,
        }
    }
}

/// Profile payload supplied at sign-up.
#[derive(Debug, Clone, PartialEq)]
pub enum NewProfile {
    Volunteer(Volunteer),
    Shelter(Shelter),
}

impl NewProfile {
    pub fn role(&self) -> UserRole {
        match self {
            Self::Volunteer(_) => UserRole::Volunteer,
            Self::Shelter(_) => UserRole::Shelter,
        }
    }
}
