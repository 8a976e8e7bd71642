//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from callers such as an HTTP layer.
//!
//! # Invariants
//! - Repository writes enforce `Movie::validate()` before persistence.
//! - "No such row" is reported as `None`/`false`, never as an error.

pub mod movie_repo;
