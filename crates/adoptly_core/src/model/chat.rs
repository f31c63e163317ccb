//! Locally cached conversation entry.
//!
//! # Invariants
//! - `id` is assigned by the local store; `0` means "not yet inserted".
//! - `peer_id` identifies the remote user; at most one row per peer is kept by
//!   `ChatService`, though the table itself does not enforce it.

use serde::{Deserialize, Serialize};

/// Row of the local chat history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub peer_id: String,
    pub peer_name: String,
    pub peer_image: Option<String>,
    pub peer_phone: Option<String>,
    pub last_message: Option<String>,
    /// Unix epoch milliseconds of the last interaction.
    pub updated_at: i64,
}

impl Chat {
    pub fn new(peer_id: impl Into<String>, peer_name: impl Into<String>, updated_at: i64) -> Self {
        Self {
            id: 0,
            peer_id: peer_id.into(),
            peer_name: peer_name.into(),
            peer_image: None,
            peer_phone: None,
            last_message: None,
            updated_at,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}
