/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `boards`: Board CRUD
/// - `shares`: Board sharing and collaborator listing
/// - `columns`: Column CRUD and reordering
/// - `tasks`: Task CRUD, moves, assignment, due dates
/// - `labels`: Label CRUD and task label links

pub mod auth;
pub mod boards;
pub mod columns;
pub mod health;
pub mod labels;
pub mod shares;
pub mod tasks;
