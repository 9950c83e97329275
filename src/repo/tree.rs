//! Sidebar item repository and tree assembly.
//!
//! Sidebar items form a forest stored as an adjacency list (self-referencing
//! `parent_id`). The repository works on the flat list; `build_tree` turns
//! it into the nested structure the UI renders.

use crate::error::{DatabookError, Result};
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio_postgres::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Folder,
    Table,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Folder => "folder",
            ItemType::Table => "table",
        }
    }

    pub fn parse(s: &str) -> Option<ItemType> {
        match s {
            "folder" => Some(ItemType::Folder),
            "table" => Some(ItemType::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarItem {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub item_type: ItemType,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SidebarItem {
    fn from_row(row: &Row) -> Result<SidebarItem> {
        let item_type: String = row.get("item_type");
        let item_type = ItemType::parse(&item_type).ok_or_else(|| DatabookError::Persistence {
            cause: format!("stored item_type '{}' is not a known kind", item_type),
        })?;

        Ok(SidebarItem {
            id: row.get("id"),
            name: row.get("name"),
            parent_id: row.get("parent_id"),
            item_type,
            icon: row.get("icon"),
            sort_order: row.get("sort_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// A sidebar item with its children attached, ready for UI rendering.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: SidebarItem,
    pub children: Vec<TreeNode>,
}

/// Assemble the forest from the flat item list in linear time.
///
/// Items are grouped by parent and attached by walking down from the
/// roots, so the relative order of the flat list is preserved within each
/// sibling group. An item whose `parent_id` does not resolve to a present
/// item is surfaced as a root rather than dropped.
pub fn build_tree(items: Vec<SidebarItem>) -> Vec<TreeNode> {
    let present: HashSet<i64> = items.iter().map(|item| item.id).collect();

    let mut by_parent: HashMap<Option<i64>, Vec<SidebarItem>> = HashMap::new();
    for item in items {
        let key = match item.parent_id {
            Some(pid) if present.contains(&pid) => Some(pid),
            // Missing parent: surface as root so the item stays reachable
            _ => None,
        };
        by_parent.entry(key).or_default().push(item);
    }

    attach(None, &mut by_parent)
}

fn attach(
    parent: Option<i64>,
    by_parent: &mut HashMap<Option<i64>, Vec<SidebarItem>>,
) -> Vec<TreeNode> {
    let Some(children) = by_parent.remove(&parent) else {
        return Vec::new();
    };

    children
        .into_iter()
        .map(|item| {
            let id = item.id;
            TreeNode {
                children: attach(Some(id), by_parent),
                item,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct TreeRepository {
    pool: Pool,
}

impl TreeRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Flat item list, roots first, then by sort order and name.
    ///
    /// Parents are created before their children, so ordering by
    /// `parent_id` also keeps every parent ahead of its children.
    pub async fn list(&self) -> Result<Vec<SidebarItem>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, name, parent_id, item_type, icon, sort_order, created_at, updated_at \
                 FROM sidebar_items \
                 ORDER BY parent_id ASC NULLS FIRST, sort_order ASC, name ASC",
                &[],
            )
            .await?;

        rows.iter().map(SidebarItem::from_row).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<SidebarItem>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, name, parent_id, item_type, icon, sort_order, created_at, updated_at \
                 FROM sidebar_items WHERE id = $1",
                &[&id],
            )
            .await?;

        row.as_ref().map(SidebarItem::from_row).transpose()
    }

    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<i64>,
        item_type: ItemType,
        icon: Option<&str>,
    ) -> Result<SidebarItem> {
        if name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "name is required".to_string(),
            });
        }

        if let Some(pid) = parent_id {
            let parent = self.get(pid).await?.ok_or(DatabookError::Validation {
                message: format!("parent item {} does not exist", pid),
            })?;
            if parent.item_type != ItemType::Folder {
                return Err(DatabookError::Validation {
                    message: format!("parent item {} is not a folder", pid),
                });
            }
        }

        let client = self.pool.get().await?;

        // Next sort_order among siblings; root siblings share the NULL scope
        let sort_row = client
            .query_one(
                "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM sidebar_items \
                 WHERE parent_id IS NOT DISTINCT FROM $1",
                &[&parent_id],
            )
            .await?;
        let sort_order: i32 = sort_row.get(0);

        let row = client
            .query_one(
                "INSERT INTO sidebar_items (name, parent_id, item_type, icon, sort_order) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, name, parent_id, item_type, icon, sort_order, created_at, updated_at",
                &[&name, &parent_id, &item_type.as_str(), &icon, &sort_order],
            )
            .await?;

        SidebarItem::from_row(&row)
    }

    /// Rename an item. Renaming to the current name is a no-op success and
    /// does not touch `updated_at`.
    pub async fn rename(&self, id: i64, name: &str) -> Result<SidebarItem> {
        if name.trim().is_empty() {
            return Err(DatabookError::Validation {
                message: "name is required".to_string(),
            });
        }

        let item = self.get(id).await?.ok_or(DatabookError::NotFound {
            entity: "sidebar item",
            id,
        })?;

        if item.name == name {
            return Ok(item);
        }

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "UPDATE sidebar_items SET name = $2, updated_at = NOW() WHERE id = $1 \
                 RETURNING id, name, parent_id, item_type, icon, sort_order, created_at, updated_at",
                &[&id, &name],
            )
            .await?;

        SidebarItem::from_row(&row)
    }

    /// The item and all of its descendants, walked down the adjacency list
    /// in one round trip. Empty when the item is absent.
    pub async fn collect_subtree(&self, id: i64) -> Result<Vec<SidebarItem>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "WITH RECURSIVE subtree AS ( \
                     SELECT id, name, parent_id, item_type, icon, sort_order, created_at, updated_at \
                     FROM sidebar_items WHERE id = $1 \
                     UNION ALL \
                     SELECT s.id, s.name, s.parent_id, s.item_type, s.icon, \
                            s.sort_order, s.created_at, s.updated_at \
                     FROM sidebar_items s \
                     JOIN subtree t ON s.parent_id = t.id \
                 ) \
                 SELECT id, name, parent_id, item_type, icon, sort_order, created_at, updated_at \
                 FROM subtree",
                &[&id],
            )
            .await?;

        rows.iter().map(SidebarItem::from_row).collect()
    }

    /// Delete items by id. A whole subtree is removed in a single
    /// statement, so the self-referencing constraint is satisfied
    /// regardless of ordering.
    pub async fn delete_items(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM sidebar_items WHERE id = ANY($1)", &[&ids])
            .await?;

        Ok(deleted)
    }
}
