/// Authentication utilities
///
/// This module provides the authentication primitives for Taskdesk:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password rules
/// - [`jwt`]: Signed session token generation and validation
/// - [`middleware`]: Bearer token resolution against the active session list
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
/// use taskdesk_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_secret")?;
/// assert!(verify_password("user_secret", &hash)?);
///
/// // Session token generation
/// let claims = Claims::new(Uuid::new_v4(), chrono::Duration::days(7))?;
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
