//! Column definition endpoints
//!
//! - GET    /tables/{id}/columns              - list columns
//! - POST   /tables/{id}/columns              - add a column
//! - PUT    /tables/{id}/columns/{column_id}  - partial update
//! - DELETE /tables/{id}/columns/{column_id}  - drop the definition
//!
//! Dropping a definition never rewrites stored rows; reads tolerate
//! payload keys the column set no longer covers.

use crate::api::AppState;
use crate::error::{DatabookError, Result};
use crate::ident::normalize;
use crate::repo::{ColumnDefinition, ColumnPatch, ColumnType, NewColumn};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn parse_data_type(s: &str) -> Result<ColumnType> {
    ColumnType::parse(s).ok_or_else(|| DatabookError::Validation {
        message: format!(
            "data_type must be one of text, number, decimal, double, boolean, checkbox, date; got '{}'",
            s
        ),
    })
}

/// Resolve a column that must belong to the table in the path.
async fn column_in_table(
    state: &AppState,
    table_id: i64,
    column_id: i64,
) -> Result<ColumnDefinition> {
    let column = state
        .schema
        .get_column(column_id)
        .await?
        .ok_or(DatabookError::NotFound {
            entity: "column",
            id: column_id,
        })?;

    if column.table_id != table_id {
        return Err(DatabookError::NotFound {
            entity: "column",
            id: column_id,
        });
    }

    Ok(column)
}

pub async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
) -> Result<Json<Vec<ColumnDefinition>>> {
    if state.schema.get(table_id).await?.is_none() {
        return Err(DatabookError::NotFound {
            entity: "dynamic table",
            id: table_id,
        });
    }

    let columns = state.schema.list_columns(table_id).await?;
    Ok(Json(columns))
}

#[derive(Debug, Deserialize)]
pub struct CreateColumnRequest {
    /// Human-entered header label; the storage key is derived from it.
    pub name: String,
    pub data_type: String,
    pub is_required: Option<bool>,
    pub default_value: Option<String>,
    pub sort_order: Option<i32>,
    pub width: Option<i32>,
}

pub async fn create_column(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Json(request): Json<CreateColumnRequest>,
) -> Result<impl IntoResponse> {
    let data_type = parse_data_type(&request.data_type)?;

    let column_name = normalize(&request.name);
    if column_name.is_empty() {
        return Err(DatabookError::Validation {
            message: "column name is required".to_string(),
        });
    }

    let column = state
        .schema
        .create_column(NewColumn {
            table_id,
            column_name,
            display_name: request.name,
            data_type,
            is_required: request.is_required.unwrap_or(false),
            default_value: request.default_value,
            sort_order: request.sort_order,
            width: request.width,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(column)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateColumnRequest {
    pub column_name: Option<String>,
    pub display_name: Option<String>,
    pub data_type: Option<String>,
    pub is_required: Option<bool>,
    pub default_value: Option<String>,
    pub sort_order: Option<i32>,
    pub width: Option<i32>,
}

pub async fn update_column(
    State(state): State<Arc<AppState>>,
    Path((table_id, column_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateColumnRequest>,
) -> Result<Json<ColumnDefinition>> {
    column_in_table(&state, table_id, column_id).await?;

    let data_type = match &request.data_type {
        Some(s) => Some(parse_data_type(s)?),
        None => None,
    };

    let column_name = match &request.column_name {
        Some(raw) => {
            let normalized = normalize(raw);
            if normalized.is_empty() {
                return Err(DatabookError::Validation {
                    message: "column name is required".to_string(),
                });
            }
            Some(normalized)
        }
        None => None,
    };

    let column = state
        .schema
        .update_column(
            column_id,
            ColumnPatch {
                column_name,
                display_name: request.display_name,
                data_type,
                is_required: request.is_required,
                default_value: request.default_value,
                sort_order: request.sort_order,
                width: request.width,
            },
        )
        .await?;

    Ok(Json(column))
}

#[derive(Serialize)]
pub struct DeleteColumnResponse {
    pub status: String,
    pub id: i64,
}

pub async fn delete_column(
    State(state): State<Arc<AppState>>,
    Path((table_id, column_id)): Path<(i64, i64)>,
) -> Result<Json<DeleteColumnResponse>> {
    column_in_table(&state, table_id, column_id).await?;

    state.schema.delete_column(column_id).await?;

    Ok(Json(DeleteColumnResponse {
        status: "deleted".to_string(),
        id: column_id,
    }))
}
