//! Flat domain records mirroring the remote document schema.
//!
//! # Responsibility
//! - Define the records exchanged with the document store and the UI.
//! - Keep serialized field names identical to the remote schema (camelCase).
//!
//! # Invariants
//! - Client-only annotations (`is_favorite`, `view_count`) are never serialized.
//! - Document ids are carried in `id` but are not part of the stored fields.

pub mod chat;
pub mod geo;
pub mod pet;
pub mod post;
pub mod user;

/// Current wall clock in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
