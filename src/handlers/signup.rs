use axum::{http::StatusCode, Json};
use tracing::{error, info};

use crate::db::dbtasks;
use crate::models::{ErrorResponse, SignupRequest, SignupResponse};
use crate::services::auth_service;

/// Create a new account
pub async fn signup(
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, Json<ErrorResponse>)> {
    let full_name = request.full_name.trim();
    let email = request.email.trim().to_lowercase();
    if full_name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "fullName, email, and password are required",
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

    match db.find_user_by_email(&email).await {
        Ok(Some(_)) => {
            return Err(ErrorResponse::with_status(StatusCode::CONFLICT, "Email already in use"));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up email '{}': {}", email, e);
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    }

    let password_hash = match auth_service::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    let user = match db.create_user(full_name, &email, &password_hash).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to create user '{}': {}", email, e);
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    info!("Account created for {}", user.email);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
        }),
    ))
}
