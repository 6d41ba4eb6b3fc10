//! Dashboard endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::dashboard::Dashboard};

use super::AuthenticatedMember;

/// Loan dashboard: library-wide for staff, personal for members
#[utoipa::path(
    get,
    path = "/book/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "System dashboard for staff, member dashboard otherwise (tagged by `scope`)"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedMember(claims): AuthenticatedMember,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state
        .services
        .dashboard
        .get_dashboard(claims.dashboard_scope())
        .await?;
    Ok(Json(dashboard))
}
