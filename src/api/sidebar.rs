//! Sidebar navigation endpoints
//!
//! - GET    /sidebar         - flat item list
//! - GET    /sidebar/tree    - assembled forest
//! - POST   /sidebar         - create a folder or table item
//! - PUT    /sidebar/{id}    - rename an item
//! - DELETE /sidebar/{id}    - delete an item and everything under it

use crate::api::AppState;
use crate::error::{DatabookError, Result};
use crate::repo::{build_tree, ItemType, SidebarItem, TreeNode};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub async fn list_sidebar(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SidebarItem>>> {
    let items = state.tree.list().await?;
    Ok(Json(items))
}

pub async fn sidebar_tree(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TreeNode>>> {
    let items = state.tree.list().await?;
    Ok(Json(build_tree(items)))
}

#[derive(Debug, Deserialize)]
pub struct CreateSidebarItemRequest {
    pub name: String,
    pub parent_id: Option<i64>,
    pub item_type: String,
    pub icon: Option<String>,
}

pub async fn create_sidebar_item(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSidebarItemRequest>,
) -> Result<impl IntoResponse> {
    // Parsed by hand so a bad value becomes a 400 in the standard envelope
    let item_type =
        ItemType::parse(&request.item_type).ok_or_else(|| DatabookError::Validation {
            message: format!(
                "item_type must be 'folder' or 'table', got '{}'",
                request.item_type
            ),
        })?;

    let created = state
        .workspace
        .create_item(
            &request.name,
            request.parent_id,
            item_type,
            request.icon.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct RenameSidebarItemRequest {
    pub name: String,
}

pub async fn rename_sidebar_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<RenameSidebarItemRequest>,
) -> Result<Json<SidebarItem>> {
    let item = state.tree.rename(id, &request.name).await?;
    Ok(Json(item))
}

#[derive(Serialize)]
pub struct DeleteSidebarItemResponse {
    pub status: String,
    pub items_deleted: u64,
    pub tables_deleted: u64,
}

pub async fn delete_sidebar_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteSidebarItemResponse>> {
    let deleted = state.workspace.delete_item(id).await?;

    Ok(Json(DeleteSidebarItemResponse {
        status: "deleted".to_string(),
        items_deleted: deleted.items_deleted,
        tables_deleted: deleted.tables_deleted,
    }))
}
