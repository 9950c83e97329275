//! Dynamic table metadata and column definitions.
//!
//! A dynamic table is a user-defined logical table: its schema lives
//! entirely in `column_definitions` rows instead of being fixed at build
//! time. Exactly one dynamic table exists per table-type sidebar item;
//! `table_name` is globally unique.

use crate::error::{DatabookError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio_postgres::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Decimal,
    Double,
    Boolean,
    Checkbox,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Decimal => "decimal",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Checkbox => "checkbox",
            ColumnType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<ColumnType> {
        match s {
            "text" => Some(ColumnType::Text),
            "number" => Some(ColumnType::Number),
            "decimal" => Some(ColumnType::Decimal),
            "double" => Some(ColumnType::Double),
            "boolean" => Some(ColumnType::Boolean),
            "checkbox" => Some(ColumnType::Checkbox),
            "date" => Some(ColumnType::Date),
            _ => None,
        }
    }

    /// Fallback value substituted at read time when a row payload has no
    /// entry for a column of this type and no explicit default is set.
    pub fn implicit_default(&self, today: NaiveDate) -> JsonValue {
        match self {
            ColumnType::Number | ColumnType::Decimal | ColumnType::Double => json!(0),
            ColumnType::Boolean | ColumnType::Checkbox => json!(false),
            ColumnType::Date => JsonValue::String(today.format("%Y-%m-%d").to_string()),
            ColumnType::Text => JsonValue::String(String::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DynamicTable {
    pub id: i64,
    pub sidebar_item_id: i64,
    pub table_name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DynamicTable {
    fn from_row(row: &Row) -> DynamicTable {
        DynamicTable {
            id: row.get("id"),
            sidebar_item_id: row.get("sidebar_item_id"),
            table_name: row.get("table_name"),
            display_name: row.get("display_name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDefinition {
    pub id: i64,
    pub table_id: i64,
    pub column_name: String,
    pub display_name: String,
    pub data_type: ColumnType,
    pub is_required: bool,
    pub default_value: Option<String>,
    pub sort_order: i32,
    pub width: i32,
}

impl ColumnDefinition {
    fn from_row(row: &Row) -> Result<ColumnDefinition> {
        let data_type: String = row.get("data_type");
        let data_type = ColumnType::parse(&data_type).ok_or_else(|| DatabookError::Persistence {
            cause: format!("stored data_type '{}' is not a known type", data_type),
        })?;

        Ok(ColumnDefinition {
            id: row.get("id"),
            table_id: row.get("table_id"),
            column_name: row.get("column_name"),
            display_name: row.get("display_name"),
            data_type,
            is_required: row.get("is_required"),
            default_value: row.get("default_value"),
            sort_order: row.get("sort_order"),
            width: row.get("width"),
        })
    }
}

#[derive(Debug)]
pub struct NewDynamicTable {
    pub sidebar_item_id: i64,
    pub table_name: String,
    pub display_name: String,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct NewColumn {
    pub table_id: i64,
    pub column_name: String,
    pub display_name: String,
    pub data_type: ColumnType,
    pub is_required: bool,
    pub default_value: Option<String>,
    /// Appended after the table's current columns when absent.
    pub sort_order: Option<i32>,
    /// Grid width in pixels; 150 when absent.
    pub width: Option<i32>,
}

/// Partial column update: absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct ColumnPatch {
    pub column_name: Option<String>,
    pub display_name: Option<String>,
    pub data_type: Option<ColumnType>,
    pub is_required: Option<bool>,
    pub default_value: Option<String>,
    pub sort_order: Option<i32>,
    pub width: Option<i32>,
}

#[derive(Clone)]
pub struct SchemaRepository {
    pool: Pool,
}

impl SchemaRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn create_dynamic_table(&self, new: NewDynamicTable) -> Result<DynamicTable> {
        if new.table_name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "table_name is required".to_string(),
            });
        }
        if new.display_name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "display_name is required".to_string(),
            });
        }

        let client = self.pool.get().await?;

        // Explicit checks for clean messages; the UNIQUE constraints (which
        // also map to Conflict) backstop concurrent creates.
        let taken = client
            .query_opt(
                "SELECT 1 FROM dynamic_tables WHERE table_name = $1",
                &[&new.table_name],
            )
            .await?;
        if taken.is_some() {
            return Err(DatabookError::Conflict {
                message: format!("table name '{}' is already in use", new.table_name),
            });
        }

        let bound = client
            .query_opt(
                "SELECT 1 FROM dynamic_tables WHERE sidebar_item_id = $1",
                &[&new.sidebar_item_id],
            )
            .await?;
        if bound.is_some() {
            return Err(DatabookError::Conflict {
                message: format!(
                    "sidebar item {} already has a table bound to it",
                    new.sidebar_item_id
                ),
            });
        }

        let row = client
            .query_one(
                "INSERT INTO dynamic_tables (sidebar_item_id, table_name, display_name, description) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, sidebar_item_id, table_name, display_name, description, created_at, updated_at",
                &[
                    &new.sidebar_item_id,
                    &new.table_name,
                    &new.display_name,
                    &new.description,
                ],
            )
            .await?;

        Ok(DynamicTable::from_row(&row))
    }

    pub async fn get(&self, table_id: i64) -> Result<Option<DynamicTable>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, sidebar_item_id, table_name, display_name, description, created_at, updated_at \
                 FROM dynamic_tables WHERE id = $1",
                &[&table_id],
            )
            .await?;

        Ok(row.as_ref().map(DynamicTable::from_row))
    }

    pub async fn get_by_sidebar_item(&self, sidebar_item_id: i64) -> Result<Option<DynamicTable>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, sidebar_item_id, table_name, display_name, description, created_at, updated_at \
                 FROM dynamic_tables WHERE sidebar_item_id = $1",
                &[&sidebar_item_id],
            )
            .await?;

        Ok(row.as_ref().map(DynamicTable::from_row))
    }

    /// Remove metadata for all tables bound to the given sidebar items.
    /// Column definitions and rows go with them via the store's cascade.
    pub async fn delete_by_sidebar_items(&self, sidebar_item_ids: &[i64]) -> Result<u64> {
        if sidebar_item_ids.is_empty() {
            return Ok(0);
        }

        let client = self.pool.get().await?;

        let deleted = client
            .execute(
                "DELETE FROM dynamic_tables WHERE sidebar_item_id = ANY($1)",
                &[&sidebar_item_ids],
            )
            .await?;

        Ok(deleted)
    }

    pub async fn list_columns(&self, table_id: i64) -> Result<Vec<ColumnDefinition>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, table_id, column_name, display_name, data_type, is_required, \
                        default_value, sort_order, width \
                 FROM column_definitions WHERE table_id = $1 \
                 ORDER BY sort_order ASC, id ASC",
                &[&table_id],
            )
            .await?;

        rows.iter().map(ColumnDefinition::from_row).collect()
    }

    pub async fn get_column(&self, id: i64) -> Result<Option<ColumnDefinition>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, table_id, column_name, display_name, data_type, is_required, \
                        default_value, sort_order, width \
                 FROM column_definitions WHERE id = $1",
                &[&id],
            )
            .await?;

        row.as_ref().map(ColumnDefinition::from_row).transpose()
    }

    pub async fn create_column(&self, new: NewColumn) -> Result<ColumnDefinition> {
        if new.column_name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "column name is required".to_string(),
            });
        }

        if self.get(new.table_id).await?.is_none() {
            return Err(DatabookError::NotFound {
                entity: "dynamic table",
                id: new.table_id,
            });
        }

        let client = self.pool.get().await?;

        let taken = client
            .query_opt(
                "SELECT 1 FROM column_definitions WHERE table_id = $1 AND column_name = $2",
                &[&new.table_id, &new.column_name],
            )
            .await?;
        if taken.is_some() {
            return Err(DatabookError::Conflict {
                message: format!(
                    "column '{}' already exists on table {}",
                    new.column_name, new.table_id
                ),
            });
        }

        let sort_order = match new.sort_order {
            Some(s) => s,
            None => {
                let row = client
                    .query_one(
                        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM column_definitions \
                         WHERE table_id = $1",
                        &[&new.table_id],
                    )
                    .await?;
                row.get(0)
            }
        };
        let width = new.width.unwrap_or(150);

        let row = client
            .query_one(
                "INSERT INTO column_definitions \
                     (table_id, column_name, display_name, data_type, is_required, \
                      default_value, sort_order, width) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING id, table_id, column_name, display_name, data_type, is_required, \
                           default_value, sort_order, width",
                &[
                    &new.table_id,
                    &new.column_name,
                    &new.display_name,
                    &new.data_type.as_str(),
                    &new.is_required,
                    &new.default_value,
                    &sort_order,
                    &width,
                ],
            )
            .await?;

        ColumnDefinition::from_row(&row)
    }

    /// Partial update: only supplied fields change. A supplied
    /// `column_name` is re-checked for uniqueness within the table; stored
    /// row payloads are never rewritten to follow a rename (reads tolerate
    /// the drift).
    pub async fn update_column(&self, id: i64, patch: ColumnPatch) -> Result<ColumnDefinition> {
        let existing = self.get_column(id).await?.ok_or(DatabookError::NotFound {
            entity: "column",
            id,
        })?;

        let column_name = patch.column_name.unwrap_or(existing.column_name.clone());
        if column_name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "column name is required".to_string(),
            });
        }
        let display_name = patch.display_name.unwrap_or(existing.display_name);
        let data_type = patch.data_type.unwrap_or(existing.data_type);
        let is_required = patch.is_required.unwrap_or(existing.is_required);
        let default_value = patch.default_value.or(existing.default_value);
        let sort_order = patch.sort_order.unwrap_or(existing.sort_order);
        let width = patch.width.unwrap_or(existing.width);

        let client = self.pool.get().await?;

        if column_name != existing.column_name {
            let taken = client
                .query_opt(
                    "SELECT 1 FROM column_definitions \
                     WHERE table_id = $1 AND column_name = $2 AND id <> $3",
                    &[&existing.table_id, &column_name, &id],
                )
                .await?;
            if taken.is_some() {
                return Err(DatabookError::Conflict {
                    message: format!(
                        "column '{}' already exists on table {}",
                        column_name, existing.table_id
                    ),
                });
            }
        }

        let row = client
            .query_one(
                "UPDATE column_definitions \
                 SET column_name = $2, display_name = $3, data_type = $4, is_required = $5, \
                     default_value = $6, sort_order = $7, width = $8 \
                 WHERE id = $1 \
                 RETURNING id, table_id, column_name, display_name, data_type, is_required, \
                           default_value, sort_order, width",
                &[
                    &id,
                    &column_name,
                    &display_name,
                    &data_type.as_str(),
                    &is_required,
                    &default_value,
                    &sort_order,
                    &width,
                ],
            )
            .await?;

        ColumnDefinition::from_row(&row)
    }

    /// Remove a column definition. Row payloads keep whatever values they
    /// stored under the column's key; readers simply stop resolving
    /// defaults for it.
    pub async fn delete_column(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM column_definitions WHERE id = $1", &[&id])
            .await?;

        if deleted == 0 {
            return Err(DatabookError::NotFound {
                entity: "column",
                id,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_round_trip() {
        let all = [
            ColumnType::Text,
            ColumnType::Number,
            ColumnType::Decimal,
            ColumnType::Double,
            ColumnType::Boolean,
            ColumnType::Checkbox,
            ColumnType::Date,
        ];

        for ty in all {
            assert_eq!(ColumnType::parse(ty.as_str()), Some(ty));
        }

        assert_eq!(ColumnType::parse("varchar"), None);
        assert_eq!(ColumnType::parse("Number"), None);
        assert_eq!(ColumnType::parse(""), None);
    }

    #[test]
    fn test_column_type_serde_names() {
        assert_eq!(serde_json::to_string(&ColumnType::Checkbox).unwrap(), "\"checkbox\"");
        let parsed: ColumnType = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(parsed, ColumnType::Date);
        assert!(serde_json::from_str::<ColumnType>("\"uuid\"").is_err());
    }

    #[test]
    fn test_implicit_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        assert_eq!(ColumnType::Number.implicit_default(today), json!(0));
        assert_eq!(ColumnType::Decimal.implicit_default(today), json!(0));
        assert_eq!(ColumnType::Double.implicit_default(today), json!(0));
        assert_eq!(ColumnType::Boolean.implicit_default(today), json!(false));
        assert_eq!(ColumnType::Checkbox.implicit_default(today), json!(false));
        assert_eq!(ColumnType::Date.implicit_default(today), json!("2024-03-07"));
        assert_eq!(ColumnType::Text.implicit_default(today), json!(""));
    }
}
