pub mod extractors;
pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

// Re-export necessary items
pub use extractors::RequestContext;
pub use middleware::{authenticate, IdentityMiddleware};
pub use token::{bearer_token, AccessToken};

/// Response body of a successful registration: the new user's public profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
}

/// Response body of a successful login.
/// The token is opaque; clients resend it as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}
