//! Chat history use cases over the local cache.
//!
//! # Invariants
//! - `record_conversation` keeps one row per peer: an existing row is
//!   refreshed in place, otherwise a new row is inserted.

use super::{require_text, ServiceResult};
use crate::model::chat::Chat;
use crate::model::now_millis;
use crate::repo::chat_repo::ChatRepository;
use log::info;

/// Peer snapshot captured when a conversation is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPeer {
    pub peer_id: String,
    pub peer_name: String,
    pub peer_image: Option<String>,
    pub peer_phone: Option<String>,
}

pub struct ChatService<R: ChatRepository> {
    repo: R,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Upserts the peer's row with `updated_at = now`.
    pub fn record_conversation(
        &self,
        peer: &ChatPeer,
        last_message: Option<&str>,
    ) -> ServiceResult<Chat> {
        self.record_conversation_at(peer, last_message, now_millis())
    }

    pub fn record_conversation_at(
        &self,
        peer: &ChatPeer,
        last_message: Option<&str>,
        updated_at: i64,
    ) -> ServiceResult<Chat> {
        require_text("peer_id", &peer.peer_id)?;

        let existing = self.repo.find_by_peer(&peer.peer_id)?;
        let mut chat = existing
            .clone()
            .unwrap_or_else(|| Chat::new(peer.peer_id.as_str(), peer.peer_name.as_str(), updated_at));
        chat.peer_name = peer.peer_name.clone();
        if peer.peer_image.is_some() {
            chat.peer_image = peer.peer_image.clone();
        }
        if peer.peer_phone.is_some() {
            chat.peer_phone = peer.peer_phone.clone();
        }
        if let Some(message) = last_message {
            chat.last_message = Some(message.to_string());
        }
        chat.updated_at = updated_at;

        if existing.is_some() {
            self.repo.update_chat(&chat)?;
            info!("event=chat_record module=chat status=ok action=update");
        } else {
            chat.id = self.repo.insert_chat(&chat)?;
            info!("event=chat_record module=chat status=ok action=insert");
        }
        Ok(chat)
    }

    /// Most recent first.
    pub fn list_chats(&self) -> ServiceResult<Vec<Chat>> {
        Ok(self.repo.list_chats()?)
    }

    pub fn delete_chat(&self, id: i64) -> ServiceResult<()> {
        self.repo.delete_chat(id)?;
        info!("event=chat_delete module=chat status=ok");
        Ok(())
    }
}
