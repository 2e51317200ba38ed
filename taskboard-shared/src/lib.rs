//! # Taskboard Shared Library
//!
//! Domain logic for the Taskboard API: models, persistence, access control,
//! ordering of columns and tasks, and the [`service::Kanban`] facade the
//! HTTP layer calls into.
//!
//! ## Module Organization
//!
//! - `models`: Row types and their SQL
//! - `store`: Persistence ports with PostgreSQL and in-memory adapters
//! - `access`: Board roles and existence hiding
//! - `ordering`: Dense position management for columns and tasks
//! - `service`: Board, share, column, task, and label operations
//! - `auth`: Passwords, bearer tokens, and request authentication
//! - `db`: Connection pool and migrations
//! - `error`: The error taxonomy shared by all operations

pub mod access;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod ordering;
pub mod retry;
pub mod service;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
