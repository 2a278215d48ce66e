/// Database models for Taskdesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, profile fields and the avatar blob
/// - `session`: Active session tokens, one row per logged-in device
/// - `task`: Tasks, always read and written scoped to their owner
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::user::{User, CreateUser};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Jess".to_string(),
///     email: "jess@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     age: 27,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod session;
pub mod task;
pub mod user;
