use adoptly_core::config::PagingConfig;
use adoptly_core::model::pet::{Favorite, PetView, FAVORITES_COLLECTION, PETS_COLLECTION, VIEWS_COLLECTION};
use adoptly_core::model::post::{Post, POSTS_COLLECTION};
use adoptly_core::remote::{to_fields, Document, Fields, Query, RemoteError, RemoteResult};
use adoptly_core::{
    DocumentStore, FavoritePetsPagingSource, GeoPoint, LoadParams, LoadResult, LoadState,
    MemoryStore, Pager, PagingSource, Pet, PetFilter, PetPagingSource, PetQuery,
    PostPagingSource, RadiusFilter, Species, UserRole,
};
use async_trait::async_trait;
use std::sync::Arc;

const CAIRO: GeoPoint = GeoPoint {
    latitude: 30.0444,
    longitude: 31.2357,
};
const ALEXANDRIA: GeoPoint = GeoPoint {
    latitude: 31.2001,
    longitude: 29.9187,
};

/// Store whose every call fails like an offline device.
struct OfflineStore;

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn get(&self, _: &str, _: &str) -> RemoteResult<Option<Document>> {
        Err(offline())
    }
    async fn set(&self, _: &str, _: &str, _: Fields) -> RemoteResult<()> {
        Err(offline())
    }
    async fn add(&self, _: &str, _: Fields) -> RemoteResult<String> {
        Err(offline())
    }
    async fn update(&self, _: &str, _: &str, _: Fields) -> RemoteResult<()> {
        Err(offline())
    }
    async fn delete(&self, _: &str, _: &str) -> RemoteResult<()> {
        Err(offline())
    }
    async fn query(&self, _: &Query) -> RemoteResult<Vec<Document>> {
        Err(offline())
    }
    async fn count(&self, _: &Query) -> RemoteResult<u64> {
        Err(offline())
    }
}

fn offline() -> RemoteError {
    RemoteError::Transport("network unreachable".to_string())
}

async fn seed_pet(store: &MemoryStore, index: i64, owner: &str, location: Option<GeoPoint>) -> String {
    let id = format!("pet-{index:02}");
    let mut pet = Pet::new(owner, format!("Pet {index}"), Species::Dog);
    pet.created_at = index;
    pet.location = location;
    store
        .set(PETS_COLLECTION, &id, to_fields(&pet).unwrap())
        .await
        .unwrap();
    id
}

async fn seed_favorite(store: &MemoryStore, shelter_id: &str, pet_id: &str, created_at: i64) {
    let favorite = Favorite {
        shelter_id: shelter_id.to_string(),
        pet_id: pet_id.to_string(),
        created_at,
    };
    store
        .set(
            FAVORITES_COLLECTION,
            &Favorite::document_id(shelter_id, pet_id),
            to_fields(&favorite).unwrap(),
        )
        .await
        .unwrap();
}

fn first_page<V>(result: LoadResult<adoptly_core::remote::PageCursor, V>) -> (Vec<V>, bool) {
    match result {
        LoadResult::Page(page) => {
            assert!(page.prev_key.is_none());
            (page.data, page.next_key.is_some())
        }
        LoadResult::Error(message) => panic!("unexpected load error: {message}"),
    }
}

fn params(load_size: u32) -> LoadParams<adoptly_core::remote::PageCursor> {
    LoadParams {
        key: None,
        load_size,
    }
}

#[tokio::test]
async fn pager_walks_listing_newest_first_until_end() {
    let store = Arc::new(MemoryStore::new());
    for index in 1..=25 {
        seed_pet(&store, index, "vol-1", None).await;
    }

    let source = PetPagingSource::new(store, PetQuery::default());
    let mut pager = Pager::new(source, PagingConfig::new(5));

    pager.refresh().await;
    assert_eq!(pager.items().len(), 15);
    assert_eq!(pager.items()[0].id, "pet-25");
    assert_eq!(pager.items()[14].id, "pet-11");

    pager.load_next().await;
    pager.load_next().await;
    assert_eq!(pager.items().len(), 25);
    assert!(!pager.is_end_reached());

    let state = pager.load_next().await;
    assert_eq!(
        state,
        LoadState::NotLoading {
            end_of_pagination_reached: true
        }
    );
    let created: Vec<i64> = pager.items().iter().map(|pet| pet.created_at).collect();
    let mut expected: Vec<i64> = (1..=25).collect();
    expected.reverse();
    assert_eq!(created, expected);
}

#[tokio::test]
async fn browse_page_is_annotated_with_shelter_favorites() {
    let store = Arc::new(MemoryStore::new());
    for index in 1..=4 {
        seed_pet(&store, index, "vol-1", None).await;
    }
    seed_favorite(&store, "shelter-1", "pet-02", 10).await;
    seed_favorite(&store, "shelter-2", "pet-03", 11).await;

    let source = PetPagingSource::new(store, PetQuery::default()).viewed_by_shelter("shelter-1");
    let (pets, has_next) = first_page(source.load(params(10)).await);

    assert!(!has_next);
    let favorites: Vec<(&str, bool)> = pets
        .iter()
        .map(|pet| (pet.id.as_str(), pet.is_favorite))
        .collect();
    assert_eq!(
        favorites,
        vec![
            ("pet-04", false),
            ("pet-03", false),
            ("pet-02", true),
            ("pet-01", false)
        ]
    );
    assert!(pets.iter().all(|pet| pet.view_count.is_none()));
}

#[tokio::test]
async fn owner_listing_counts_distinct_shelter_views() {
    let store = Arc::new(MemoryStore::new());
    let mine = seed_pet(&store, 1, "vol-1", None).await;
    seed_pet(&store, 2, "vol-2", None).await;
    for shelter in ["s1", "s2", "s1"] {
        let view = PetView {
            pet_id: mine.clone(),
            shelter_id: shelter.to_string(),
            viewed_at: 1,
        };
        store
            .set(
                VIEWS_COLLECTION,
                &PetView::document_id(&mine, shelter),
                to_fields(&view).unwrap(),
            )
            .await
            .unwrap();
    }

    let source = PetPagingSource::new(store, PetQuery::owned_by("vol-1"));
    let (pets, _) = first_page(source.load(params(10)).await);

    assert_eq!(pets.len(), 1);
    assert_eq!(pets[0].id, mine);
    assert_eq!(pets[0].view_count, Some(2));
}

#[tokio::test]
async fn field_filters_hide_adopted_and_other_species() {
    let store = Arc::new(MemoryStore::new());
    seed_pet(&store, 1, "vol-1", None).await;
    let mut cat = Pet::new("vol-1", "Mishmish", Species::Cat);
    cat.created_at = 2;
    store
        .set(PETS_COLLECTION, "cat", to_fields(&cat).unwrap())
        .await
        .unwrap();
    let adopted_cat = cat.clone().adopted();
    store
        .set(PETS_COLLECTION, "adopted-cat", to_fields(&adopted_cat).unwrap())
        .await
        .unwrap();

    let query = PetQuery {
        filter: PetFilter {
            species: Some(Species::Cat),
            ..PetFilter::default()
        },
        ..PetQuery::default()
    };
    let (pets, _) = first_page(PetPagingSource::new(store, query).load(params(10)).await);
    let ids: Vec<&str> = pets.iter().map(|pet| pet.id.as_str()).collect();
    assert_eq!(ids, vec!["cat"]);
}

#[tokio::test]
async fn radius_filter_applies_per_page_and_keeps_cursor() {
    let store = Arc::new(MemoryStore::new());
    // Six far-away pets are the newest, two nearby pets are older.
    for index in 3..=8 {
        seed_pet(&store, index, "vol-1", Some(ALEXANDRIA)).await;
    }
    seed_pet(&store, 1, "vol-1", Some(CAIRO)).await;
    seed_pet(&store, 2, "vol-1", Some(CAIRO)).await;
    seed_pet(&store, 0, "vol-1", None).await;

    let query = PetQuery {
        radius: Some(RadiusFilter {
            center: CAIRO,
            radius_km: 50.0,
        }),
        ..PetQuery::default()
    };
    let source = PetPagingSource::new(store, query);

    let (first, has_next) = first_page(source.load(params(6)).await);
    assert!(first.is_empty());
    assert!(has_next);

    let mut pager = Pager::new(source, PagingConfig::new(2));
    pager.refresh().await;
    let ids: Vec<&str> = pager.items().iter().map(|pet| pet.id.as_str()).collect();
    assert_eq!(ids, vec!["pet-02", "pet-01"]);
}

#[tokio::test]
async fn remote_failure_becomes_terminal_page_error() {
    let source = PetPagingSource::new(Arc::new(OfflineStore), PetQuery::default());
    match source.load(params(10)).await {
        LoadResult::Error(message) => {
            assert_eq!(message, "Please check your internet connection.")
        }
        LoadResult::Page(_) => panic!("offline store must not produce a page"),
    }

    let mut pager = Pager::new(source, PagingConfig::new(5));
    assert!(matches!(pager.refresh().await, LoadState::Error(_)));
    assert!(pager.items().is_empty());
}

#[tokio::test]
async fn favorites_source_resolves_pets_and_skips_deleted_ones() {
    let store = Arc::new(MemoryStore::new());
    let kept = seed_pet(&store, 1, "vol-1", None).await;
    let newer = seed_pet(&store, 2, "vol-1", None).await;
    seed_favorite(&store, "shelter-1", &kept, 100).await;
    seed_favorite(&store, "shelter-1", &newer, 200).await;
    seed_favorite(&store, "shelter-1", "pet-gone", 300).await;
    seed_favorite(&store, "shelter-2", &kept, 400).await;

    let source = FavoritePetsPagingSource::new(store, "shelter-1");
    let (pets, has_next) = first_page(source.load(params(3)).await);

    let ids: Vec<&str> = pets.iter().map(|pet| pet.id.as_str()).collect();
    assert_eq!(ids, vec![newer.as_str(), kept.as_str()]);
    assert!(pets.iter().all(|pet| pet.is_favorite));
    // Three raw favorites filled the page, so pagination continues.
    assert!(has_next);
}

#[tokio::test]
async fn post_feed_is_newest_first_with_author_filter() {
    let store = Arc::new(MemoryStore::new());
    for (id, author, created_at) in [("p1", "a", 1), ("p2", "b", 2), ("p3", "a", 3)] {
        let post = Post {
            id: String::new(),
            author_id: author.to_string(),
            author_name: author.to_uppercase(),
            author_image: None,
            author_role: UserRole::Volunteer,
            content: format!("post {id}"),
            image: None,
            created_at,
        };
        store
            .set(POSTS_COLLECTION, id, to_fields(&post).unwrap())
            .await
            .unwrap();
    }

    let feed: Arc<dyn DocumentStore> = store;
    let (all, _) = first_page(PostPagingSource::new(Arc::clone(&feed)).load(params(10)).await);
    let ids: Vec<&str> = all.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p2", "p1"]);

    let (mine, _) = first_page(
        PostPagingSource::new(feed)
            .by_author("a")
            .load(params(10))
            .await,
    );
    let ids: Vec<&str> = mine.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p1"]);
}
