//! Table metadata endpoints
//!
//! - GET  /tables/{id}     - metadata for a table-type sidebar item
//! - POST /tables/create   - provision metadata for an existing item

use crate::api::AppState;
use crate::error::{DatabookError, Result};
use crate::ident::normalize;
use crate::repo::{DynamicTable, ItemType, NewDynamicTable};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub async fn get_table_for_item(
    State(state): State<Arc<AppState>>,
    Path(sidebar_item_id): Path<i64>,
) -> Result<Json<DynamicTable>> {
    let table = state
        .schema
        .get_by_sidebar_item(sidebar_item_id)
        .await?
        .ok_or(DatabookError::NotFound {
            entity: "dynamic table",
            id: sidebar_item_id,
        })?;

    Ok(Json(table))
}

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub sidebar_item_id: i64,
    pub table_name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Direct provisioning path for a table item that has no metadata yet
/// (the usual path is POST /sidebar with item_type "table").
pub async fn create_table(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTableRequest>,
) -> Result<impl IntoResponse> {
    let item = state
        .tree
        .get(request.sidebar_item_id)
        .await?
        .ok_or(DatabookError::Validation {
            message: format!("sidebar item {} does not exist", request.sidebar_item_id),
        })?;
    if item.item_type != ItemType::Table {
        return Err(DatabookError::Validation {
            message: format!("sidebar item {} is not a table item", item.id),
        });
    }

    let table_name = normalize(&request.table_name);
    if table_name.is_empty() {
        return Err(DatabookError::Validation {
            message: "table_name is required".to_string(),
        });
    }

    let table = state
        .schema
        .create_dynamic_table(NewDynamicTable {
            sidebar_item_id: request.sidebar_item_id,
            table_name,
            display_name: request.display_name,
            description: request.description,
        })
        .await?;

    info!(
        "Provisioned table '{}' (id {}) for sidebar item {}",
        table.table_name, table.id, table.sidebar_item_id
    );

    Ok((StatusCode::CREATED, Json(table)))
}
