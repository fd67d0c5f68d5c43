//! Transfers API endpoints.

use api_types::transfer::{TransferCreated, TransferNew, TransferView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::TransferCmd;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    user::AuthUser,
    views::{map_transaction, parse_amount},
};

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let mut cmd = TransferCmd::new(
        &user.username,
        payload.from_account_id,
        payload.to_account_id,
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

    let created = state.engine.submit_transfer(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            transfer_id: created.transfer_id,
            outgoing_id: created.outgoing_id,
            incoming_id: created.incoming_id,
        }),
    ))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferView>, ServerError> {
    let (outgoing, incoming) = state
        .engine
        .transfer_legs(&user.username, transfer_id)
        .await?;
    Ok(Json(TransferView {
        transfer_id,
        outgoing: map_transaction(outgoing),
        incoming: map_transaction(incoming),
    }))
}
