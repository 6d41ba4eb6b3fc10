//! API handlers for Libris REST endpoints

pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod loans;
pub mod openapi;
pub mod policy;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::member::MemberClaims, AppState};

/// Extractor for the authenticated member from the JWT bearer token
pub struct AuthenticatedMember(pub MemberClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedMember {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = MemberClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedMember(claims))
    }
}
