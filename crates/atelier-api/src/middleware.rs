use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use atelier_engagement::EngagementError;
use atelier_types::api::Claims;
use atelier_types::models::User;

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;

/// Resolves the bearer token to a current [`User`] and stores it in the
/// request extensions. Role and existence come from the store, not the token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(EngagementError::Unauthenticated("No token"))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| EngagementError::InvalidToken)?;

    let user_id = token_data.claims.sub.to_string();
    let row = run_blocking(&state, move |s| Ok(s.db.get_user_by_id(&user_id)?))
        .await?
        .ok_or(EngagementError::Unauthenticated("User no longer exists"))?;

    req.extensions_mut().insert(User::from(row));
    Ok(next.run(req).await)
}
