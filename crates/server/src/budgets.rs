//! Budgets API endpoints.

use api_types::budget::{BudgetCreated, BudgetListResponse, BudgetNew, BudgetUpdate, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{BudgetCmd, UpdateBudgetCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    user::AuthUser,
    views::{engine_budget_target, map_budget, parse_amount},
};

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetCreated>), ServerError> {
    let cmd = BudgetCmd::new(
        &user.username,
        engine_budget_target(payload.target),
        parse_amount(&payload.amount)?,
        payload.period_start,
        payload.period_end,
    );
    let id = state.engine.new_budget(cmd).await?;
    Ok((StatusCode::CREATED, Json(BudgetCreated { id })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let budgets = state
        .engine
        .budgets(&user.username)
        .await?
        .into_iter()
        .map(map_budget)
        .collect();
    Ok(Json(BudgetListResponse { budgets }))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let mut cmd = UpdateBudgetCmd::new(&user.username, id);
    if let Some(target) = payload.target {
        cmd = cmd.target(engine_budget_target(target));
    }
    if let Some(amount) = payload.amount.as_deref() {
        cmd = cmd.amount(parse_amount(amount)?);
    }
    cmd.period_start = payload.period_start;
    cmd.period_end = payload.period_end;

    let budget = state.engine.update_budget(cmd).await?;
    Ok(Json(map_budget(budget)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
