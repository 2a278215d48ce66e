//! # Taskdesk Shared Library
//!
//! This crate contains the data layer and authentication primitives used by
//! the Taskdesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, session tokens, tasks)
//! - `auth`: Password hashing, session tokens and bearer authentication
//! - `avatar`: Avatar upload validation and PNG normalization
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod avatar;
pub mod db;
pub mod models;

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
