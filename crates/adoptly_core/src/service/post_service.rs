//! Community feed use cases.

use super::account_service::SignedInUser;
use super::{require_text, ServiceError, ServiceResult};
use crate::model::now_millis;
use crate::model::post::{Post, POSTS_COLLECTION};
use crate::paging::PostPagingSource;
use crate::remote::{to_fields, DocumentStore};
use crate::upload::{ImageHost, ImageUpload};
use log::info;
use std::sync::Arc;

/// Author details copied onto each post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostAuthor {
    pub name: String,
    pub image: Option<String>,
}

pub struct PostService<H: ImageHost> {
    store: Arc<dyn DocumentStore>,
    images: H,
}

impl<H: ImageHost> PostService<H> {
    pub fn new(store: Arc<dyn DocumentStore>, images: H) -> Self {
        Self { store, images }
    }

    /// Publishes a post; the optional image is uploaded first.
    pub async fn create_post(
        &self,
        user: &SignedInUser,
        author: &PostAuthor,
        content: &str,
        image: Option<&ImageUpload>,
    ) -> ServiceResult<Post> {
        require_text("content", content)?;
        let image = match image {
            Some(upload) => Some(self.images.upload(upload).await?.url),
            None => None,
        };

        let mut post = Post {
            id: String::new(),
            author_id: user.user_id().to_string(),
            author_name: author.name.clone(),
            author_image: author.image.clone(),
            author_role: user.role,
            content: content.trim().to_string(),
            image,
            created_at: now_millis(),
        };
        post.id = self.store.add(POSTS_COLLECTION, to_fields(&post)?).await?;
        info!(
            "event=post_create module=post status=ok with_image={}",
            post.image.is_some()
        );
        Ok(post)
    }

    /// Deletes a post written by `user_id`.
    pub async fn delete_post(&self, user_id: &str, post_id: &str) -> ServiceResult<()> {
        let post: Post = self
            .store
            .get(POSTS_COLLECTION, post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {post_id}")))?
            .decode()?;
        if !post.is_authored_by(user_id) {
            return Err(ServiceError::NotOwner(format!("post {post_id}")));
        }
        self.store.delete(POSTS_COLLECTION, post_id).await?;
        info!("event=post_delete module=post status=ok");
        Ok(())
    }

    pub fn feed_source(&self) -> PostPagingSource {
        PostPagingSource::new(Arc::clone(&self.store))
    }

    pub fn author_source(&self, author_id: &str) -> PostPagingSource {
        PostPagingSource::new(Arc::clone(&self.store)).by_author(author_id)
    }
}
