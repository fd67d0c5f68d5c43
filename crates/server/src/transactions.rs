//! Transactions API endpoints

use api_types::transaction::{
    TransactionCreated, TransactionDeleted, TransactionListQuery, TransactionListResponse,
    TransactionNew, TransactionUpdate, TransactionUpdated, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{TransactionCmd, TransactionListFilter, UpdateTransactionCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    user::AuthUser,
    views::{map_transaction, parse_amount},
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut cmd = TransactionCmd::new(
        &user.username,
        payload.account_id,
        payload.category_id,
        parse_amount(&payload.amount)?,
        payload.occurred_at.with_timezone(&Utc),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(location) = payload.location {
        cmd = cmd.location(location);
    }
    if let Some(url) = payload.receipt_image_url {
        cmd = cmd.receipt_image_url(url);
    }

    let id = state.engine.submit_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ServerError::Generic(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let filter = TransactionListFilter {
        account_id: query.account_id,
        category_id: query.category_id,
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        transfer_id: query.transfer_id,
        search: query.search,
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions(&user.username, &filter, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(map_transaction).collect(),
        next_cursor,
    }))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(&user.username, id).await?;
    Ok(Json(map_transaction(tx)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionUpdated>, ServerError> {
    let mut cmd = UpdateTransactionCmd::new(&user.username, id);
    if let Some(account_id) = payload.account_id {
        cmd = cmd.account_id(account_id);
    }
    if let Some(category_id) = payload.category_id {
        cmd = cmd.category_id(category_id);
    }
    if let Some(amount) = payload.amount.as_deref() {
        cmd = cmd.amount(parse_amount(amount)?);
    }
    if let Some(occurred_at) = payload.occurred_at {
        cmd = cmd.occurred_at(occurred_at.with_timezone(&Utc));
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(location) = payload.location {
        cmd = cmd.location(location);
    }
    if let Some(url) = payload.receipt_image_url {
        cmd = cmd.receipt_image_url(url);
    }

    let applied = state.engine.update_transaction(cmd).await?;
    Ok(Json(TransactionUpdated {
        transaction: map_transaction(applied.transaction),
        partner: applied.partner.map(map_transaction),
    }))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDeleted>, ServerError> {
    let deleted = state.engine.delete_transaction(&user.username, id).await?;
    Ok(Json(TransactionDeleted { ids: deleted.ids }))
}
