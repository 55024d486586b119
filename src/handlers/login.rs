use axum::{http::StatusCode, Json};
use tracing::{error, info};

use crate::config;
use crate::db::dbtasks;
use crate::models::{ErrorResponse, LoginRequest, LoginResponse};
use crate::services::auth_service;

/// Exchange credentials for a signed token
pub async fn login(
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<ErrorResponse>)> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(ErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "email and password are required",
        ));
    }

    let db = match dbtasks::get_db() {
        Some(db) => db,
        None => {
            error!("Database not initialized");
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    let user = match db.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(ErrorResponse::with_status(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => {
            error!("Failed to look up email '{}': {}", email, e);
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    if !auth_service::verify_password(&request.password, &user.password_hash) {
        return Err(ErrorResponse::with_status(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let identity = user.identity();
    let token = match auth_service::issue_jwt(&identity, &config::get_config().jwt_secret) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to issue token for {}: {}", identity.email, e);
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    info!("{} logged in", identity.email);
    Ok((StatusCode::OK, Json(LoginResponse { token, user: identity })))
}
