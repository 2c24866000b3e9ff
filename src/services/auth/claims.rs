use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Identity carried inside a token.
///
/// - `sub` is the user id (UUID)
/// - `email` is informational and never used for authorization
/// - `exp` is Unix seconds; the token is invalid once `now >= exp`
///
/// Values handed to request handlers always come out of `TokenCodec::decode`,
/// so a `Claims` seen downstream of authentication is already verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    pub fn new(subject: Uuid, email: impl Into<String>, role: Role, expires_at: i64) -> Self {
        Self {
            subject,
            email: email.into(),
            role,
            expires_at,
        }
    }
}
