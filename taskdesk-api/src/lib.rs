//! # Taskdesk API Server Library
//!
//! This library provides the HTTP surface of Taskdesk: user accounts with
//! bearer sessions, profile avatars and per-user task lists.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON error rejections
//! - `middleware`: Response middleware
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
