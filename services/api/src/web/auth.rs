//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: staff email login, student PIN and quick-start
//! login, demo login, logout, and session resolution. All of them are thin
//! wrappers over the core auth resolver.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;
use wordsprout_core::auth::LoginFailure;
use wordsprout_core::domain::{Principal, Role};

use crate::web::state::AppState;

/// Validation failures are caught before any collaborator call.
const MSG_MISSING_FIELDS: &str = "Vui lòng nhập đầy đủ thông tin";

const SESSION_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PinLoginRequest {
    pub pin: String,
}

#[derive(Deserialize, ToSchema)]
pub struct QuickLoginRequest {
    pub name: String,
    pub class_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DemoLoginRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct MeQuery {
    /// The route the client is currently on; drives the login-route redirect.
    pub path: Option<String>,
}

/// The wire shape of a resolved principal.
#[derive(Serialize, ToSchema)]
pub struct PrincipalDto {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub is_guest: bool,
}

impl From<&Principal> for PrincipalDto {
    fn from(principal: &Principal) -> Self {
        let role = role_name(principal.role()).to_string();
        match principal {
            Principal::Admin(p) | Principal::Teacher(p) | Principal::Parent(p) => Self {
                role,
                id: Some(p.id),
                display_name: p.display_name.clone(),
                email: Some(p.email.clone()),
                class_name: None,
                is_guest: false,
            },
            Principal::Student(p) => Self {
                role,
                id: Some(p.id),
                display_name: p.display_name.clone(),
                email: None,
                class_name: p.class_name.clone(),
                is_guest: false,
            },
            Principal::Guest(p) => Self {
                role,
                id: None,
                display_name: p.display_name.clone(),
                email: None,
                class_name: p.class_name.clone(),
                is_guest: true,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub principal: PrincipalDto,
    pub redirect_to: String,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<PrincipalDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub redirect_to: String,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Teacher => "teacher",
        Role::Parent => "parent",
        Role::Student => "student",
        Role::Guest => "guest",
    }
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

/// Parses the staff session token out of the Cookie header, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
}

fn session_cookie(token: &str) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token, SESSION_COOKIE_MAX_AGE_SECS
    )
}

fn cleared_session_cookie() -> String {
    "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0".to_string()
}

fn failure_response(failure: &LoginFailure) -> (StatusCode, String) {
    let status = match failure {
        LoginFailure::InvalidCredentials | LoginFailure::InvalidPin => StatusCode::UNAUTHORIZED,
        LoginFailure::Unavailable(detail) => {
            error!("Auth collaborator failure: {}", detail);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, failure.user_message().to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Staff login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS.to_string()));
    }

    let success = state
        .resolver
        .login_with_email(req.email.trim(), &req.password)
        .await
        .map_err(|f| failure_response(&f))?;

    info!("Staff login: {}", success.principal.display_name());
    let token = success.token.as_deref().unwrap_or_default();
    let response = AuthResponse {
        principal: PrincipalDto::from(&success.principal),
        redirect_to: success.redirect_to.to_string(),
    };
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(token))],
        Json(response),
    ))
}

/// POST /auth/pin-login - Student login with a 4-digit PIN
#[utoipa::path(
    post,
    path = "/auth/pin-login",
    request_body = PinLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing PIN"),
        (status = 401, description = "No student with that PIN")
    )
)]
pub async fn pin_login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PinLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.pin.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS.to_string()));
    }

    let success = state
        .resolver
        .login_with_pin(req.pin.trim())
        .await
        .map_err(|f| failure_response(&f))?;

    info!("Student PIN login: {}", success.principal.display_name());
    Ok(Json(AuthResponse {
        principal: PrincipalDto::from(&success.principal),
        redirect_to: success.redirect_to.to_string(),
    }))
}

/// POST /auth/quick-login - Student quick start by name and class
#[utoipa::path(
    post,
    path = "/auth/quick-login",
    request_body = QuickLoginRequest,
    responses(
        (status = 200, description = "Logged in as a registered student or as a guest", body = AuthResponse),
        (status = 400, description = "Missing name"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn quick_login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuickLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS.to_string()));
    }

    let success = state
        .resolver
        .quick_login(req.name.trim(), req.class_name.as_deref())
        .await
        .map_err(|f| failure_response(&f))?;

    info!(
        "Quick login: {} (guest: {})",
        success.principal.display_name(),
        success.principal.is_guest()
    );
    Ok(Json(AuthResponse {
        principal: PrincipalDto::from(&success.principal),
        redirect_to: success.redirect_to.to_string(),
    }))
}

/// POST /auth/demo-login - Canned per-role login, for auth-provider outages
#[utoipa::path(
    post,
    path = "/auth/demo-login",
    request_body = DemoLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Demo login is disabled")
    )
)]
pub async fn demo_login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DemoLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !state.config.demo_login_enabled {
        return Err((
            StatusCode::FORBIDDEN,
            "Demo login is disabled".to_string(),
        ));
    }

    let role = match req.role.as_str() {
        "admin" => Role::Admin,
        "teacher" => Role::Teacher,
        "parent" => Role::Parent,
        "student" => Role::Student,
        "guest" => Role::Guest,
        other => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unknown role '{}'", other),
            ))
        }
    };

    let success = state
        .resolver
        .demo_login(role)
        .await
        .map_err(|f| failure_response(&f))?;

    Ok(Json(AuthResponse {
        principal: PrincipalDto::from(&success.principal),
        redirect_to: success.redirect_to.to_string(),
    }))
}

/// POST /auth/logout - Clear the session for every role
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_token(&headers);
    let redirect_to = state.resolver.logout(token).await.map_err(|e| {
        error!("Failed to clear session: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to logout".to_string(),
        )
    })?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(LogoutResponse {
            redirect_to: redirect_to.to_string(),
        }),
    ))
}

/// GET /auth/me - Resolve the current identity
#[utoipa::path(
    get,
    path = "/auth/me",
    params(
        ("path" = Option<String>, Query, description = "The client route, used to decide login-route redirects")
    ),
    responses(
        (status = 200, description = "The resolved identity, if any", body = MeResponse)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MeQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_token(&headers);
    let snapshot = state
        .resolver
        .check_auth(token, query.path.as_deref().unwrap_or(""))
        .await
        .map_err(|e| {
            error!("Failed to resolve session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to resolve session".to_string(),
            )
        })?;

    Ok(Json(MeResponse {
        principal: snapshot.principal.as_ref().map(PrincipalDto::from),
        redirect_to: snapshot.redirect_to.map(str::to_string),
    }))
}
