//! JWT Claims structure

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims
///
/// `sub` carries the username for display and logging; `uid` is the owning
/// user id every scoped query is keyed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User id
    pub uid: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp); 0 until `JwtService` fills it in
    pub exp: i64,
}

impl Claims {
    /// Create claims for a user; expiration is set when the token is signed
    ///
    /// ```
    /// use dialer_auth::Claims;
    ///
    /// let claims = Claims::new(7, "ada");
    /// assert_eq!(claims.user_id(), 7);
    /// assert_eq!(claims.exp, 0);
    /// ```
    pub fn new(user_id: i64, username: &str) -> Self {
        Self {
            sub: username.to_string(),
            uid: user_id,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims expiring `expires_in_secs` from now
    pub fn with_expiration(user_id: i64, username: &str, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            sub: username.to_string(),
            uid: user_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    pub fn username(&self) -> &str {
        &self.sub
    }

    pub fn user_id(&self) -> i64 {
        self.uid
    }
}
