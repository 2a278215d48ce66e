/// Middleware modules for the API server
///
/// - `security`: Security response headers
///
/// Bearer authentication lives in `app` because it needs the application
/// state.

pub mod security;
