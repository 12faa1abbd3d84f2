//! # Taskboard API Server Library
//!
//! HTTP surface of the Taskboard backend. Handlers are thin: they parse
//! the request, call a use case from `taskboard_shared::services` and map
//! the result onto a status code and camelCase JSON body.
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
