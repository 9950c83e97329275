//! Row data endpoints
//!
//! - GET    /tables/{id}/data?limit&offset  - page of rows, defaults applied
//! - POST   /tables/{id}/data               - insert a row
//! - PUT    /tables/{id}/data/{row_id}      - replace a row's payload
//! - DELETE /tables/{id}/data/{row_id}      - delete a row
//!
//! Reads resolve missing keys against the current column set; writes
//! store payloads exactly as sent.

use crate::api::AppState;
use crate::error::Result;
use crate::repo::{resolve_defaults, RowData, RowRecord};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ListRowsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct RowPage {
    pub rows: Vec<RowRecord>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Query(query): Query<ListRowsQuery>,
) -> Result<Json<RowPage>> {
    let limit = query
        .limit
        .unwrap_or(state.config.default_page_size)
        .clamp(1, state.config.max_page_size);
    let offset = query.offset.unwrap_or(0).max(0);

    let columns = state.schema.list_columns(table_id).await?;
    let records = state.rows.list(table_id, limit, offset).await?;

    let rows = records
        .into_iter()
        .map(|mut record| {
            record.row_data = resolve_defaults(&columns, record.row_data);
            record
        })
        .collect();

    Ok(Json(RowPage {
        rows,
        limit,
        offset,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RowPayloadRequest {
    pub data: RowData,
}

pub async fn create_row(
    State(state): State<Arc<AppState>>,
    Path(table_id): Path<i64>,
    Json(request): Json<RowPayloadRequest>,
) -> Result<impl IntoResponse> {
    let record = state.rows.create(table_id, request.data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Full replace: the stored payload becomes exactly `data`. The grid
/// submits every field of the edited row, so unchanged cells survive
/// because the client sends them, not because the server merges.
pub async fn update_row(
    State(state): State<Arc<AppState>>,
    Path((_table_id, row_id)): Path<(i64, i64)>,
    Json(request): Json<RowPayloadRequest>,
) -> Result<Json<RowRecord>> {
    let record = state.rows.update(row_id, request.data).await?;
    Ok(Json(record))
}

#[derive(Serialize)]
pub struct DeleteRowResponse {
    pub status: String,
    pub id: i64,
}

pub async fn delete_row(
    State(state): State<Arc<AppState>>,
    Path((_table_id, row_id)): Path<(i64, i64)>,
) -> Result<Json<DeleteRowResponse>> {
    state.rows.delete(row_id).await?;

    Ok(Json(DeleteRowResponse {
        status: "deleted".to_string(),
        id: row_id,
    }))
}
