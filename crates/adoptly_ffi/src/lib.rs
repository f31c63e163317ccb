//! Flutter-facing bindings for `adoptly_core`.

pub mod api;
