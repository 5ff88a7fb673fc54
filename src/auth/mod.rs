pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::{CurrentUser, RequestContext};
pub use middleware::SessionMiddleware;
pub use password::{hash_password, verify_password};
pub use session::{generate_token, SessionSettings};

/// The login form.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// The registration form.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Must be a valid email; the same check collaborator entries get.
    #[serde(default)]
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    /// Display name.
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default, rename = "passwordConfirmation")]
    pub password_confirmation: String,
}

impl RegisterRequest {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirmation
    }
}
