//! Catalog domain model.
//!
//! # Responsibility
//! - Define data structures shared by the store and its callers.
//!
//! # Invariants
//! - Every movie is identified by a stable `MovieId`.
//! - Genre sets are always handled in sorted order.

pub mod movie;
