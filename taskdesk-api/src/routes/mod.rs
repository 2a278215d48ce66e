/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Liveness and database connectivity
/// - `users`: Registration, login, sessions and the caller's profile
/// - `avatar`: Profile picture upload, download and removal
/// - `tasks`: The caller's tasks

pub mod avatar;
pub mod health;
pub mod tasks;
pub mod users;

use serde::Serialize;

/// Plain acknowledgement body for operations with nothing else to return
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
