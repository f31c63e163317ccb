//! Community feed post.

use crate::model::user::UserRole;
use serde::{Deserialize, Serialize};

pub const POSTS_COLLECTION: &str = "posts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_image: Option<String>,
    pub author_role: UserRole,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl Post {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}
