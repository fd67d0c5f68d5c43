//! Accounts API endpoints.

use api_types::account::{
    AccountCreated, AccountListResponse, AccountNew, AccountUpdate, AccountView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountKind, MoneyCents, UpdateAccountCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    user::AuthUser,
    views::{map_account, parse_amount},
};

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let kind = match payload.kind.as_deref() {
        Some(kind) => AccountKind::try_from(kind)?,
        None => AccountKind::default(),
    };
    let opening_balance = match payload.opening_balance.as_deref() {
        Some(raw) => parse_amount(raw)?,
        None => MoneyCents::ZERO,
    };

    let id = state
        .engine
        .new_account(&user.username, &payload.name, kind, opening_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(AccountCreated { id })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state
        .engine
        .accounts(&user.username)
        .await?
        .into_iter()
        .map(map_account)
        .collect();
    Ok(Json(AccountListResponse { accounts }))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(&user.username, account_id).await?;
    Ok(Json(map_account(account)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let mut cmd = UpdateAccountCmd::new(&user.username, account_id);
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(kind) = payload.kind.as_deref() {
        cmd = cmd.kind(AccountKind::try_from(kind)?);
    }

    let account = state.engine.update_account(cmd).await?;
    Ok(Json(map_account(account)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_account(&user.username, account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
