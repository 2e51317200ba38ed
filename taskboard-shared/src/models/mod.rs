/// Database models for Taskboard
///
/// Each model owns the SQL for its table. The PostgreSQL store adapter
/// composes these calls into transactions; the in-memory adapter reuses the
/// same structs.
///
/// # Models
///
/// - `user`: accounts and login identities
/// - `board`: top-level containers with a single owner
/// - `share`: per-user roles on boards owned by someone else
/// - `column`: ordered lanes within a board
/// - `task`: ordered cards within a column
/// - `label`: board-scoped tags and their task links

pub mod board;
pub mod column;
pub mod label;
pub mod share;
pub mod task;
pub mod user;
