//! Authentication middleware
//!
//! Verifies JWT bearer tokens and exposes the actor's identity and role to
//! handlers. Tokens are minted elsewhere; this service only checks them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{Capability, Role};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Capability guard used at the top of every workflow operation
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        self.role.require(capability).map_err(AppError::from)
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Sign a token for the given actor. Used by tooling and tests; login is
/// handled by a separate identity service.
pub fn encode_jwt(user_id: Uuid, role: Role, secret: &str, ttl_secs: i64) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthUser, String> {
    let token = match header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err("Missing or invalid Authorization header".to_string()),
    };

    let claims = decode_jwt(token, secret)?;

    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token".to_string())?;
    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| "Invalid role in token".to_string())?;

    Ok(AuthUser { user_id, role })
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match authenticate(header, &state.config.jwt.secret) {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(msg) => {
            tracing::debug!("Rejected request: {}", msg);
            AppError::Unauthorized(msg).into_response()
        }
    }
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (axum::http::StatusCode, axum::Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    axum::Json(ErrorResponse {
                        error: ErrorDetail::new("UNAUTHORIZED", "Authentication required"),
                    }),
                )
            })
    }
}
