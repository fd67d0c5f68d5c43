use api_types::balance::RecomputeResponse;
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user::AuthUser, views::map_drift};

/// Rebuilds the caller's cached balances from their transactions.
pub async fn recompute(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<RecomputeResponse>, ServerError> {
    let drifted = state
        .engine
        .recompute_balances(&user.username)
        .await?
        .into_iter()
        .map(map_drift)
        .collect();
    Ok(Json(RecomputeResponse { drifted }))
}
