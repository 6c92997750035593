use crate::{app_state::SharedState, error::ApiError, role::Role, settings::Settings, user::User};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const MANAGERS: &[Role] = &[Role::SuperAdmin, Role::ProjectManager];
pub const EVERYONE: &[Role] = &[Role::SuperAdmin, Role::ProjectManager, Role::Developer];
pub const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];
pub const PROJECT_MEMBERS: &[Role] = &[Role::ProjectManager, Role::Developer];

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// The caller, as resolved by `auth_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

fn issue(user: &User, secret: &str, minutes: u64) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiry = now + Duration::minutes(minutes as i64);

    let claims = Claims {
        sub: user.id,
        role: user.role,
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn create_token(user: &User, settings: &Settings) -> Result<String, jsonwebtoken::errors::Error> {
    issue(user, &settings.jwt_secret, settings.jwt_expiration_in_minutes)
}

pub fn create_refresh_token(user: &User, settings: &Settings) -> Result<String, jsonwebtoken::errors::Error> {
    issue(user, &settings.jwt_refresh_secret, settings.jwt_refresh_expiration_in_minutes)
}

pub fn verify_token(token: &str, settings: &Settings) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, &settings.jwt_secret)
}

pub fn verify_refresh_token(token: &str, settings: &Settings) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, &settings.jwt_refresh_secret)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to perform this action"))
    }
}

pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(h) if !h.is_empty() => h,
        _ => return Err(ApiError::unauthorized("You are not authorized")),
    };

    let claims = verify_token(token, &state.settings)
        .map_err(|_| ApiError::unauthorized("Invalid token"))?;

    let user = state
        .data_context
        .get::<User>(claims.sub)?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if user.is_blocked {
        return Err(ApiError::forbidden("Your account has been blocked"));
    }
    if !user.is_active {
        return Err(ApiError::forbidden("Your account has been suspended"));
    }

    debug!(user_id = %user.id, role = %user.role, "authenticated request");
    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });
    Ok(next.run(request).await)
}
