//! Session- and team-scoped resources.
//!
//! Thin write-through operations over the [`Gateway`](crate::gateway::Gateway).
//! Nothing here caches: every call reads or writes durable rows.

pub mod capability;
pub mod inv_item;
pub mod news;
pub mod piece;
pub mod plan;
pub mod shop_item;
