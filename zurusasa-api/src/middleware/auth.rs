use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zurusasa_catalog::UserRole;
use zurusasa_core::{SessionContext, ViewMode};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

/// Header the client sends when a host switches to the guest view
pub const VIEW_MODE_HEADER: &str = "x-view-mode";

// ============================================================================
// JWT Claims
// ============================================================================

/// Access token claims issued by the hosted auth service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppMetadata {
    pub role: Option<String>,
}

impl SessionClaims {
    pub fn into_session(self) -> Result<SessionContext, AppError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
        // Unknown roles fall back to guest.
        let role = self
            .app_metadata
            .role
            .as_deref()
            .and_then(|r| r.parse::<UserRole>().ok())
            .unwrap_or_default();
        Ok(SessionContext::new(user_id, self.email, role))
    }
}

pub fn decode_session(auth: &AuthConfig, token: &str) -> Result<SessionContext, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[auth.audience.as_str()]);

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    token_data.claims.into_session()
}

fn session_from_headers(auth: &AuthConfig, headers: &HeaderMap) -> Result<Option<SessionContext>, AppError> {
    let bearer = match headers.typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer,
        None => return Ok(None),
    };
    let session = decode_session(auth, bearer.token())?;

    let view_mode = match headers.get(VIEW_MODE_HEADER).and_then(|h| h.to_str().ok()) {
        Some("guest") => ViewMode::Guest,
        Some("host") => ViewMode::Host,
        _ => session.view_mode,
    };
    Ok(Some(session.with_view_mode(view_mode)))
}

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a valid bearer token and injects the session.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = session_from_headers(&state.auth, req.headers())?
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Injects the session when a token is present. An invalid token is still
/// rejected; a missing one is left for the handler to deal with.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(session) = session_from_headers(&state.auth, req.headers())? {
        req.extensions_mut().insert(session);
    }
    Ok(next.run(req).await)
}

pub fn require_host(session: &SessionContext) -> Result<(), AppError> {
    if session.is_host() {
        Ok(())
    } else {
        Err(AppError::AuthorizationError("Host account required".to_string()))
    }
}
