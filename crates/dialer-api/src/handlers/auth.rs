//! Authentication handlers
//!
//! HTTP handlers for authentication endpoints.

use crate::dto::auth::{LoginRequest, LoginResponse, SignupRequest};
use crate::dto::{ApiResponse, MessageResponse};
use crate::state::AppState;
use actix_web::{cookie::Cookie, web, HttpResponse};
use dialer_auth::{AuthenticatedUser, JwtService, PasswordService, TOKEN_COOKIE};
use dialer_core::models::{NewUser, UserInfo};
use dialer_core::AppError;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

/// Signup endpoint
///
/// POST /api/v1/auth/signup
#[instrument(skip(state, password_service, req))]
pub async fn signup(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Signup validation failed: {}", e);
        AppError::from(e)
    })?;

    let username = req.username.trim();
    debug!(username = %username, "Processing signup request");

    let password_hash = password_service.hash_password(&req.password)?;
    let user = state
        .users
        .create(&NewUser {
            username: username.to_string(),
            email: req.email.clone(),
            password_hash,
        })
        .await?;

    info!(username = %user.username, id = user.id, "User signed up");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        UserInfo::from(&user),
        "User created successfully",
    )))
}

/// Login endpoint
///
/// POST /api/v1/auth/login
#[instrument(skip(state, jwt_service, password_service, req))]
pub async fn login(
    state: web::Data<AppState>,
    jwt_service: web::Data<Arc<JwtService>>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let username = req.username.trim();
    debug!(username = %username, "Processing login request");

    let user = state.users.find_by_username(username).await?.ok_or_else(|| {
        info!(username = %username, "Login failed: user not found");
        AppError::InvalidCredentials
    })?;

    if !user.can_login() {
        warn!(username = %username, "Login failed: user is inactive");
        return Err(AppError::InvalidCredentials);
    }

    let password_valid = password_service
        .verify_password(&req.password, &user.password_hash)
        .map_err(|e| {
            error!("Password verification error: {}", e);
            AppError::Internal("Password verification failed".to_string())
        })?;

    if !password_valid {
        info!(username = %username, "Login failed: invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if let Err(e) = state.users.update_last_login(user.id).await {
        warn!("Failed to update last login for user {}: {}", user.id, e);
    }

    let token = jwt_service.create_token_for_user(user.id, &user.username)?;
    let expires_in = jwt_service.expiration_secs();

    info!(username = %username, "Login successful");

    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .max_age(actix_web::cookie::time::Duration::seconds(expires_in))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::success(LoginResponse::new(
            token,
            expires_in,
            UserInfo::from(&user),
        ))))
}

/// Logout endpoint
///
/// POST /api/v1/auth/logout
pub async fn logout(user: AuthenticatedUser) -> HttpResponse {
    info!(username = %user.username, "User logged out");

    let cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(actix_web::cookie::time::Duration::seconds(0))
        .finish();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("Logged out successfully"))
}

/// Get current user info
///
/// GET /api/v1/auth/me
#[instrument(skip(state, user))]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let db_user = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserInfo::from(&db_user))))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(me)),
    );
}
