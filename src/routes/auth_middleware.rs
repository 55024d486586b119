use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::{debug, error};

use crate::config;
use crate::services::auth_service::{get_auth_token, validate_jwt};

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    // 1. Get the auth token from the request
    let token = match get_auth_token(req.headers()) {
        Ok(token) => token,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // 2. Validate the token
    let config = config::get_config();
    let token_data = match validate_jwt(&token, &config.jwt_secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Pin the verified identity onto the request for downstream handlers
    let identity = token_data.claims.identity();
    debug!("Request authenticated as {}", identity.email);
    req.extensions_mut().insert(identity);

    // Token is valid, proceed to next middleware/handler
    Ok(next.run(req).await)
}
