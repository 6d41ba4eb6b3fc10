//! Lending policy endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        member::Capability,
        policy::{Policy, UpdatePolicy},
    },
};

use super::AuthenticatedMember;

/// Get the lending policy
#[utoipa::path(
    get,
    path = "/policy",
    tag = "policy",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current lending policy", body = Policy),
        (status = 404, description = "Policy not configured")
    )
)]
pub async fn get_policy(
    State(state): State<crate::AppState>,
    AuthenticatedMember(_claims): AuthenticatedMember,
) -> AppResult<Json<Policy>> {
    let policy = state.services.policy.get_policy().await?;
    Ok(Json(policy))
}

/// Replace the lending policy (staff only)
#[utoipa::path(
    put,
    path = "/policy",
    tag = "policy",
    security(("bearer_auth" = [])),
    request_body = UpdatePolicy,
    responses(
        (status = 200, description = "Policy updated", body = Policy),
        (status = 400, description = "Invalid policy"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn update_policy(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
    Json(request): Json<UpdatePolicy>,
) -> AppResult<Json<Policy>> {
    claims.require(Capability::ManagePolicy)?;
    request.validate()?;

    let policy = state.services.policy.update_policy(request).await?;
    Ok(Json(policy))
}
