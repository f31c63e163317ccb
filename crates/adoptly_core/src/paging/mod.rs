//! Cursor-based paging over the document store.
//!
//! # Responsibility
//! - Define the `PagingSource` contract producing sequential chunks.
//! - Drive sources incrementally through `Pager` for list UIs.
//!
//! # Invariants
//! - A page returns a `next_key` only when the raw query filled `load_size`;
//!   a short page ends pagination.
//! - Sources never retry; a failed load is reported once as
//!   `LoadResult::Error` and the caller decides whether to refresh.
//! - `prev_key` is always `None` (lists only grow forward).

use crate::config::PagingConfig;
use crate::remote::{Document, DocumentStore, PageCursor, Query, RemoteResult};
use async_trait::async_trait;
use log::debug;

mod favorite_source;
mod pet_source;
mod post_source;

pub use favorite_source::FavoritePetsPagingSource;
pub use pet_source::{PetFilter, PetPagingSource, PetQuery, RadiusFilter};
pub(crate) use pet_source::{count_views, is_favorite};
pub use post_source::PostPagingSource;

/// Pages skipped in one `load_next` call when client-side filtering empties them.
const MAX_EMPTY_PAGE_SKIPS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadParams<K> {
    /// `None` for the first (refresh) load.
    pub key: Option<K>,
    pub load_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<K, V> {
    pub data: Vec<V>,
    pub prev_key: Option<K>,
    pub next_key: Option<K>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult<K, V> {
    Page(Page<K, V>),
    /// Terminal failure with a user-facing message.
    Error(String),
}

/// Producer of sequential chunks of remote query results.
#[async_trait]
pub trait PagingSource: Send + Sync {
    type Key: Clone + Send + Sync;
    type Value: Send;

    async fn load(&self, params: LoadParams<Self::Key>) -> LoadResult<Self::Key, Self::Value>;
}

/// Raw query page plus its continuation cursor.
pub(crate) struct RawPage {
    pub documents: Vec<Document>,
    pub next_key: Option<PageCursor>,
}

/// Runs `query` for one page starting after `params.key`.
pub(crate) async fn fetch_raw_page(
    store: &dyn DocumentStore,
    query: Query,
    params: &LoadParams<PageCursor>,
) -> RemoteResult<RawPage> {
    let query = query
        .limit(params.load_size)
        .start_after(params.key.clone());
    let documents = store.query(&query).await?;

    let full_page = params.load_size > 0 && documents.len() >= params.load_size as usize;
    let next_key = if full_page {
        documents
            .last()
            .map(|last| PageCursor::from_document(last, &query.order_by))
    } else {
        None
    };
    debug!(
        "event=page_fetch module=paging status=ok collection={} rows={} has_next={}",
        query.collection,
        documents.len(),
        next_key.is_some()
    );
    Ok(RawPage {
        documents,
        next_key,
    })
}

/// Load state exposed to list UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoading { end_of_pagination_reached: bool },
    Error(String),
}

/// Accumulates pages from a source: refresh, append, prefetch decisions.
pub struct Pager<S: PagingSource> {
    source: S,
    config: PagingConfig,
    items: Vec<S::Value>,
    next_key: Option<S::Key>,
    loaded_once: bool,
    end_reached: bool,
}

impl<S: PagingSource> Pager<S> {
    pub fn new(source: S, config: PagingConfig) -> Self {
        Self {
            source,
            config,
            items: Vec::new(),
            next_key: None,
            loaded_once: false,
            end_reached: false,
        }
    }

    pub fn items(&self) -> &[S::Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<S::Value> {
        self.items
    }

    pub fn is_end_reached(&self) -> bool {
        self.end_reached
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drops loaded items and fetches the first `initial_load_size` rows.
    ///
    /// On error the previously loaded items are kept.
    pub async fn refresh(&mut self) -> LoadState {
        let params = LoadParams {
            key: None,
            load_size: self.config.initial_load_size(),
        };
        match self.source.load(params).await {
            LoadResult::Page(page) => {
                self.items = page.data;
                self.loaded_once = true;
                self.apply_next_key(page.next_key);
                self.skip_empty_pages().await
            }
            LoadResult::Error(message) => LoadState::Error(message),
        }
    }

    /// Appends the next page; the first call behaves like `refresh`.
    pub async fn load_next(&mut self) -> LoadState {
        if !self.loaded_once {
            return self.refresh().await;
        }
        if self.end_reached {
            return self.idle_state();
        }
        match self.append_page().await {
            Ok(_) => self.skip_empty_pages().await,
            Err(message) => LoadState::Error(message),
        }
    }

    /// Whether showing the item at `visible_index` should trigger `load_next`.
    pub fn should_prefetch(&self, visible_index: usize) -> bool {
        if self.end_reached {
            return false;
        }
        if !self.loaded_once {
            return true;
        }
        let remaining = self.items.len().saturating_sub(visible_index + 1);
        remaining < self.config.effective_prefetch_distance() as usize
    }

    async fn append_page(&mut self) -> Result<usize, String> {
        let params = LoadParams {
            key: self.next_key.clone(),
            load_size: self.config.page_size,
        };
        match self.source.load(params).await {
            LoadResult::Page(page) => {
                let appended = page.data.len();
                self.items.extend(page.data);
                self.apply_next_key(page.next_key);
                Ok(appended)
            }
            LoadResult::Error(message) => Err(message),
        }
    }

    async fn skip_empty_pages(&mut self) -> LoadState {
        // Client-side filters can empty a page while more rows remain.
        let mut skips = 0;
        while self.items.is_empty() && !self.end_reached && skips < MAX_EMPTY_PAGE_SKIPS {
            if let Err(message) = self.append_page().await {
                return LoadState::Error(message);
            }
            skips += 1;
        }
        self.idle_state()
    }

    fn apply_next_key(&mut self, next_key: Option<S::Key>) {
        self.end_reached = next_key.is_none();
        self.next_key = next_key;
    }

    fn idle_state(&self) -> LoadState {
        LoadState::NotLoading {
            end_of_pagination_reached: self.end_reached,
        }
    }
}
