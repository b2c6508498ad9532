use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use atelier_db::Database;
use atelier_media::MediaStore;
use atelier_types::api::{AuthResponse, Claims, LoginRequest, MeResponse, RegisterRequest};
use atelier_types::models::User;

use crate::error::ApiError;

/// Tokens expire after a week.
const TOKEN_TTL_DAYS: i64 = 7;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub media: Arc<dyn MediaStore>,
}

/// Runs blocking store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest("Username must be 3-32 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("Password must be at least 8 characters".into()));
    }

    let (username, email) = (req.username.clone(), req.email.clone());
    let taken = run_blocking(&state, move |s| Ok(s.db.user_exists(&username, &email)?)).await?;
    if taken {
        return Err(ApiError::Conflict("User already exists"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })?
        .to_string();

    let user = User {
        id: Uuid::new_v4(),
        username: req.username,
        email: req.email,
        role: req.role.unwrap_or_default(),
    };

    // the pre-check above can race another registration; the UNIQUE index decides
    let row = user.clone();
    let created = run_blocking(&state, move |s| {
        Ok(s.db.create_user(&row.id.to_string(), &row.username, &row.email, &password_hash, row.role)?)
    })
    .await?;
    if !created {
        return Err(ApiError::Conflict("User already exists"));
    }

    let token = create_token(&state.jwt_secret, &user).map_err(|e| {
        error!("Token creation failed: {}", e);
        ApiError::Internal
    })?;

    info!("Registered {} ({})", user.username, user.role);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.clone();
    let row = run_blocking(&state, move |s| Ok(s.db.get_user_by_email(&email)?))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&row.password).map_err(|e| {
        error!("Stored hash for {} is unreadable: {}", row.id, e);
        ApiError::Internal
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user = User::from(row);
    let token = create_token(&state.jwt_secret, &user).map_err(|e| {
        error!("Token creation failed: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user,
    })
}

pub(crate) fn create_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
