//! Core data layer for the Adoptly pet-adoption client.
//! Domain records, remote store access, paging, the chat cache and use cases.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod paging;
pub mod remote;
pub mod repo;
pub mod resource;
pub mod service;
pub mod upload;

pub use auth::{AuthError, AuthProvider, AuthSession, FirebaseAuth};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use error::{HasMessage, MessageId};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::chat::Chat;
pub use model::geo::GeoPoint;
pub use model::pet::{Favorite, Gender, Pet, PetSize, PetView, Species};
pub use model::post::Post;
pub use model::user::{NewProfile, Shelter, UserAccount, UserRole, Volunteer};
pub use paging::{
    FavoritePetsPagingSource, LoadParams, LoadResult, LoadState, Page, Pager, PagingSource,
    PetFilter, PetPagingSource, PetQuery, PostPagingSource, RadiusFilter,
};
pub use remote::{DocumentStore, FirestoreStore, MemoryStore, RemoteError};
pub use repo::chat_repo::{ChatRepository, RepoError, RepoResult, SqliteChatRepository};
pub use resource::{track, Resource};
pub use service::{ServiceError, ServiceResult};
pub use upload::{ImageHost, ImageUpload, ImgBbClient, UploadError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
