//! Row storage for dynamic tables.
//!
//! Each row keeps its payload as a JSONB object mapping column names to
//! values. The payload is schema-on-read: it is stored as sent, may hold
//! keys no current column defines (left over after a column delete) and
//! may lack keys for columns added later. Reconciliation against the
//! current column set happens only when rows are read.

use crate::error::{DatabookError, Result};
use crate::repo::schema::ColumnDefinition;
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tokio_postgres::Row;

pub type RowData = Map<String, JsonValue>;

#[derive(Debug, Clone, Serialize)]
pub struct RowRecord {
    pub id: i64,
    pub table_id: i64,
    pub row_data: RowData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RowRecord {
    fn from_row(row: &Row) -> Result<RowRecord> {
        let data: JsonValue = row.get("row_data");
        let row_data = match data {
            JsonValue::Object(map) => map,
            other => {
                return Err(DatabookError::Persistence {
                    cause: format!("stored row payload is not a JSON object: {}", other),
                })
            }
        };

        Ok(RowRecord {
            id: row.get("id"),
            table_id: row.get("table_id"),
            row_data,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Fill in values for defined columns missing from a payload.
///
/// An explicit column `default_value` wins and is inserted verbatim as a
/// string, whatever the column type; otherwise the type's implicit
/// default applies (0, false, today's date, or empty string). Keys with no
/// matching column definition pass through untouched, and nothing is ever
/// removed.
pub fn resolve_defaults(columns: &[ColumnDefinition], data: RowData) -> RowData {
    resolve_defaults_at(columns, data, Utc::now().date_naive())
}

fn resolve_defaults_at(columns: &[ColumnDefinition], mut data: RowData, today: NaiveDate) -> RowData {
    for column in columns {
        if data.contains_key(&column.column_name) {
            continue;
        }
        let value = match &column.default_value {
            Some(default) => JsonValue::String(default.clone()),
            None => column.data_type.implicit_default(today),
        };
        data.insert(column.column_name.clone(), value);
    }
    data
}

#[derive(Clone)]
pub struct RowRepository {
    pool: Pool,
}

impl RowRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn ensure_table(&self, table_id: i64) -> Result<()> {
        let client = self.pool.get().await?;

        let found = client
            .query_opt("SELECT 1 FROM dynamic_tables WHERE id = $1", &[&table_id])
            .await?;

        if found.is_none() {
            return Err(DatabookError::NotFound {
                entity: "dynamic table",
                id: table_id,
            });
        }
        Ok(())
    }

    /// One page of rows ordered by id ascending. No total count; the
    /// caller pages until a short page comes back.
    pub async fn list(&self, table_id: i64, limit: i64, offset: i64) -> Result<Vec<RowRecord>> {
        self.ensure_table(table_id).await?;

        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, table_id, row_data, created_at, updated_at \
                 FROM table_rows WHERE table_id = $1 \
                 ORDER BY id ASC LIMIT $2 OFFSET $3",
                &[&table_id, &limit, &offset],
            )
            .await?;

        rows.iter().map(RowRecord::from_row).collect()
    }

    /// Store a payload as sent. Keys are not checked against column
    /// definitions.
    pub async fn create(&self, table_id: i64, data: RowData) -> Result<RowRecord> {
        self.ensure_table(table_id).await?;

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "INSERT INTO table_rows (table_id, row_data) VALUES ($1, $2) \
                 RETURNING id, table_id, row_data, created_at, updated_at",
                &[&table_id, &JsonValue::Object(data)],
            )
            .await?;

        RowRecord::from_row(&row)
    }

    /// Replace a row's payload wholesale. Keys absent from `data` are
    /// dropped from storage; callers merge unchanged fields in before
    /// calling. This is not a patch.
    pub async fn update(&self, id: i64, data: RowData) -> Result<RowRecord> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "UPDATE table_rows SET row_data = $2, updated_at = NOW() WHERE id = $1 \
                 RETURNING id, table_id, row_data, created_at, updated_at",
                &[&id, &JsonValue::Object(data)],
            )
            .await?;

        match row {
            Some(row) => RowRecord::from_row(&row),
            None => Err(DatabookError::NotFound { entity: "row", id }),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM table_rows WHERE id = $1", &[&id])
            .await?;

        if deleted == 0 {
            return Err(DatabookError::NotFound { entity: "row", id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::schema::ColumnType;
    use serde_json::json;

    fn column(name: &str, data_type: ColumnType, default_value: Option<&str>) -> ColumnDefinition {
        ColumnDefinition {
            id: 1,
            table_id: 1,
            column_name: name.to_string(),
            display_name: name.to_string(),
            data_type,
            is_required: false,
            default_value: default_value.map(str::to_string),
            sort_order: 0,
            width: 150,
        }
    }

    fn data(pairs: &[(&str, JsonValue)]) -> RowData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_resolve_type_defaults_for_missing_keys() {
        let columns = vec![
            column("qty", ColumnType::Number, None),
            column("done", ColumnType::Checkbox, None),
            column("note", ColumnType::Text, None),
            column("due", ColumnType::Date, None),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let resolved = resolve_defaults_at(&columns, RowData::new(), today);

        assert_eq!(resolved["qty"], json!(0));
        assert_eq!(resolved["done"], json!(false));
        assert_eq!(resolved["note"], json!(""));
        assert_eq!(resolved["due"], json!("2025-01-15"));
    }

    #[test]
    fn test_explicit_default_wins_verbatim() {
        // A number column with default "5" resolves to the string "5";
        // explicit defaults are not coerced to the column type.
        let columns = vec![column("qty", ColumnType::Number, Some("5"))];
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let resolved = resolve_defaults_at(&columns, RowData::new(), today);

        assert_eq!(resolved["qty"], json!("5"));
    }

    #[test]
    fn test_present_keys_are_untouched() {
        let columns = vec![column("qty", ColumnType::Number, Some("5"))];
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let resolved = resolve_defaults_at(&columns, data(&[("qty", json!(9))]), today);

        assert_eq!(resolved["qty"], json!(9));
    }

    #[test]
    fn test_orphaned_keys_pass_through() {
        // No column defines "legacy": the stored value survives as-is and
        // no default is substituted for it.
        let columns = vec![column("name", ColumnType::Text, None)];
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let resolved = resolve_defaults_at(&columns, data(&[("legacy", json!("kept"))]), today);

        assert_eq!(resolved["legacy"], json!("kept"));
        assert_eq!(resolved["name"], json!(""));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_resolution_with_no_columns_is_identity() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let payload = data(&[("a", json!(1)), ("b", json!(null))]);

        let resolved = resolve_defaults_at(&[], payload.clone(), today);

        assert_eq!(resolved, payload);
    }
}
