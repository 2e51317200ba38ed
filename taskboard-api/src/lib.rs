//! # Taskboard API Server Library
//!
//! HTTP surface for the Taskboard service. Domain logic lives in
//! `taskboard-shared`; this crate wires it to axum.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
