//! Local persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the narrow CRUD contract for cached chat history.
//! - Keep SQL details inside the local storage boundary.

pub mod chat_repo;
