//! Categories API endpoints.

use api_types::category::{
    CategoryCreated, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::UpdateCategoryCmd;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    user::AuthUser,
    views::{engine_direction, map_category},
};

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryCreated>), ServerError> {
    let id = state
        .engine
        .new_category(
            &user.username,
            &payload.name,
            engine_direction(payload.direction),
            payload.parent_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryCreated { id })))
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .categories(&user.username)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(&user.username, category_id).await?;
    Ok(Json(map_category(category)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let mut cmd = UpdateCategoryCmd::new(&user.username, category_id);
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    cmd = match payload.parent_id {
        Some(Some(parent_id)) => cmd.parent_id(parent_id),
        Some(None) => cmd.clear_parent(),
        None => cmd,
    };

    let category = state.engine.update_category(cmd).await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(&user.username, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
