//! Community feed paging.

use super::{fetch_raw_page, LoadParams, LoadResult, Page, PagingSource};
use crate::error::HasMessage;
use crate::model::post::{Post, POSTS_COLLECTION};
use crate::remote::{Direction, DocumentStore, PageCursor, Query, RemoteResult};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct PostPagingSource {
    store: Arc<dyn DocumentStore>,
    author_id: Option<String>,
}

impl PostPagingSource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            author_id: None,
        }
    }

    /// Restricts the feed to one author's posts.
    pub fn by_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    fn query(&self) -> Query {
        let query = Query::collection(POSTS_COLLECTION);
        let query = match &self.author_id {
            Some(author_id) => query.where_eq("authorId", author_id.as_str()),
            None => query,
        };
        query.order_by("createdAt", Direction::Descending)
    }

    async fn load_page(&self, params: &LoadParams<PageCursor>) -> RemoteResult<Page<PageCursor, Post>> {
        let raw = fetch_raw_page(self.store.as_ref(), self.query(), params).await?;
        let posts = raw
            .documents
            .iter()
            .map(|doc| doc.decode::<Post>())
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(Page {
            data: posts,
            prev_key: None,
            next_key: raw.next_key,
        })
    }
}

#[async_trait]
impl PagingSource for PostPagingSource {
    type Key = PageCursor;
    type Value = Post;

    async fn load(&self, params: LoadParams<PageCursor>) -> LoadResult<PageCursor, Post> {
        match self.load_page(&params).await {
            Ok(page) => LoadResult::Page(page),
            Err(err) => {
                warn!(
                    "event=post_page_load module=paging status=error first_page={} error={}",
                    params.key.is_none(),
                    err
                );
                LoadResult::Error(err.user_message())
            }
        }
    }
}
