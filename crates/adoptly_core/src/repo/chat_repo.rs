//! Chat history cache contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/update/query/delete over the local `chats` table.
//! - Reject connections that were not bootstrapped through `db::open_db*`.
//!
//! # Invariants
//! - `list_chats` is ordered by `updated_at DESC, id DESC`.
//! - Update and delete of a missing row return `RepoError::NotFound`.
//! - Inserted rows always receive a fresh store-assigned id.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::error::{HasMessage, MessageId};
use crate::model::chat::Chat;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CHAT_SELECT_SQL: &str = "SELECT
    id,
    peer_id,
    peer_name,
    peer_image,
    peer_phone,
    last_message,
    updated_at
FROM chats";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(i64),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "chat not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid chat data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "chat cache connection is at schema {actual_version}, expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl HasMessage for RepoError {
    fn message_id(&self) -> MessageId {
        match self {
            Self::NotFound(_) => MessageId::NotFound,
            Self::InvalidData(_) => MessageId::InvalidInput,
            Self::Db(_) | Self::UninitializedConnection { .. } => MessageId::LocalStorage,
        }
    }
}

/// Local chat history store.
pub trait ChatRepository {
    /// Inserts a new row and returns its assigned id. `chat.id` is ignored.
    fn insert_chat(&self, chat: &Chat) -> RepoResult<i64>;
    /// Replaces every column of the row identified by `chat.id`.
    fn update_chat(&self, chat: &Chat) -> RepoResult<()>;
    /// All cached chats, most recent first.
    fn list_chats(&self) -> RepoResult<Vec<Chat>>;
    /// Removes one row by id.
    fn delete_chat(&self, id: i64) -> RepoResult<()>;
    fn get_chat(&self, id: i64) -> RepoResult<Option<Chat>>;
    /// Most recent row for one remote peer.
    fn find_by_peer(&self, peer_id: &str) -> RepoResult<Option<Chat>>;
}

/// SQLite-backed chat history store.
pub struct SqliteChatRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChatRepository<'conn> {
    /// Wraps a connection returned by `db::open_db` / `db::open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl ChatRepository for SqliteChatRepository<'_> {
    fn insert_chat(&self, chat: &Chat) -> RepoResult<i64> {
        validate_chat(chat)?;

        self.conn.execute(
            "INSERT INTO chats (
                peer_id,
                peer_name,
                peer_image,
                peer_phone,
                last_message,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                chat.peer_id.as_str(),
                chat.peer_name.as_str(),
                chat.peer_image.as_deref(),
                chat.peer_phone.as_deref(),
                chat.last_message.as_deref(),
                chat.updated_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=chat_insert module=repo status=ok chat_id={id}");
        Ok(id)
    }

    fn update_chat(&self, chat: &Chat) -> RepoResult<()> {
        validate_chat(chat)?;

        let changed = self.conn.execute(
            "UPDATE chats
             SET
                peer_id = ?1,
                peer_name = ?2,
                peer_image = ?3,
                peer_phone = ?4,
                last_message = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                chat.peer_id.as_str(),
                chat.peer_name.as_str(),
                chat.peer_image.as_deref(),
                chat.peer_phone.as_deref(),
                chat.last_message.as_deref(),
                chat.updated_at,
                chat.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(chat.id));
        }
        Ok(())
    }

    fn list_chats(&self) -> RepoResult<Vec<Chat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHAT_SELECT_SQL} ORDER BY updated_at DESC, id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut chats = Vec::new();
        while let Some(row) = rows.next()? {
            chats.push(parse_chat_row(row)?);
        }
        Ok(chats)
    }

    fn delete_chat(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM chats WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        debug!("event=chat_delete module=repo status=ok chat_id={id}");
        Ok(())
    }

    fn get_chat(&self, id: i64) -> RepoResult<Option<Chat>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHAT_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_chat_row(row)))
            .optional()?;
        row.transpose()
    }

    fn find_by_peer(&self, peer_id: &str) -> RepoResult<Option<Chat>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHAT_SELECT_SQL} WHERE peer_id = ?1 ORDER BY updated_at DESC, id DESC LIMIT 1;"
        ))?;
        let row = stmt
            .query_row([peer_id], |row| Ok(parse_chat_row(row)))
            .optional()?;
        row.transpose()
    }
}

fn validate_chat(chat: &Chat) -> RepoResult<()> {
    if chat.peer_id.trim().is_empty() {
        return Err(RepoError::InvalidData("peer_id cannot be empty".to_string()));
    }
    if chat.updated_at < 0 {
        return Err(RepoError::InvalidData(format!(
            "updated_at cannot be negative: {}",
            chat.updated_at
        )));
    }
    Ok(())
}

fn parse_chat_row(row: &Row<'_>) -> RepoResult<Chat> {
    Ok(Chat {
        id: row.get("id")?,
        peer_id: row.get("peer_id")?,
        peer_name: row.get("peer_name")?,
        peer_image: row.get("peer_image")?,
        peer_phone: row.get("peer_phone")?,
        last_message: row.get("last_message")?,
        updated_at: row.get("updated_at")?,
    })
}
