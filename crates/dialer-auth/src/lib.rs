//! Authentication for the autodialer
//!
//! This crate provides JWT-based authentication, password hashing with Argon2,
//! and an Actix-web extractor resolving the owning user of a request.
//!
//! # Examples
//!
//! ## Creating a JWT token
//!
//! ```no_run
//! use dialer_auth::{Claims, JwtService};
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let token = jwt_service.create_token(&Claims::new(1, "ada"))?;
//! # Ok::<(), dialer_core::error::AppError>(())
//! ```
//!
//! ## Password hashing
//!
//! ```no_run
//! use dialer_auth::PasswordService;
//!
//! let password_service = PasswordService::new();
//! let hash = password_service.hash_password("secure_password")?;
//! assert!(password_service.verify_password("secure_password", &hash)?);
//! # Ok::<(), dialer_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AuthenticatedUser, TOKEN_COOKIE};
pub use password::PasswordService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_jwt_and_password() {
        let password_service = PasswordService::new();
        let jwt_service = JwtService::new("test-secret-key-12345", 3600);

        let hash = password_service.hash_password("my_secure_password").unwrap();
        assert!(password_service
            .verify_password("my_secure_password", &hash)
            .unwrap());

        let token = jwt_service.create_token_for_user(5, "testuser").unwrap();
        let user = AuthenticatedUser::from(jwt_service.validate_token(&token).unwrap());

        assert_eq!(user.user_id, 5);
        assert_eq!(user.username, "testuser");
    }
}
