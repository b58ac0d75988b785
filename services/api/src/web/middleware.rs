//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting the admin console routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::auth::session_token;
use crate::web::state::AppState;

/// Middleware that validates the staff session cookie and extracts the principal.
///
/// If valid, inserts the principal into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized. Student identities never
/// pass here: content management is staff-only.
pub async fn require_staff(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the session token from the cookie header
    let token = session_token(req.headers())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Resolve the principal behind the token
    let principal = state
        .auth
        .current_user(&token)
        .await
        .map_err(|e| {
            error!("Failed to validate staff session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Insert the principal into request extensions
    req.extensions_mut().insert(principal);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
