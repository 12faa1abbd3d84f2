//! # Taskboard Shared Library
//!
//! Domain core of the Taskboard project-management backend: data models,
//! role-based authorization, the task position reindexer and the use case
//! services, plus the repository adapters they run against.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Role-based authorization decisions
//! - `reindex`: Dense task position planning and application
//! - `store`: Transactional repository boundary (PostgreSQL and in-process)
//! - `services`: Project, task and user use cases
//! - `db`: Connection pooling and migrations
//! - `error`: Service error taxonomy
//! - `pagination`: Limit/offset normalization

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod reindex;
pub mod services;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
