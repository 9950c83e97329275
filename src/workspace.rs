//! Cross-entity coordination between the navigation tree and table
//! metadata.
//!
//! Two operations span both: creating a table-type sidebar item (which
//! must end with the item and its metadata existing together, or neither)
//! and deleting an item (which must take the whole subtree and every
//! bound table with it).

use crate::error::{DatabookError, Result};
use crate::ident::normalize;
use crate::repo::{
    DynamicTable, ItemType, NewDynamicTable, SchemaRepository, SidebarItem, TreeRepository,
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct CreatedItem {
    pub item: SidebarItem,
    /// Present when the item is a table and metadata was provisioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<DynamicTable>,
}

#[derive(Debug, Serialize)]
pub struct DeletedSubtree {
    pub items_deleted: u64,
    pub tables_deleted: u64,
}

#[derive(Clone)]
pub struct Workspace {
    tree: TreeRepository,
    schema: SchemaRepository,
}

impl Workspace {
    pub fn new(tree: TreeRepository, schema: SchemaRepository) -> Self {
        Self { tree, schema }
    }

    /// Create a sidebar item; table-type items also get their dynamic
    /// table provisioned, named `normalize(name)`.
    ///
    /// If provisioning fails after the sidebar item was created, the item
    /// is deleted again before the error is surfaced. The navigation tree
    /// must never show a table node with no backing metadata.
    pub async fn create_item(
        &self,
        name: &str,
        parent_id: Option<i64>,
        item_type: ItemType,
        icon: Option<&str>,
    ) -> Result<CreatedItem> {
        // Reject unusable table names before creating anything; blank names
        // fall through to the tree repository's own validation
        if item_type == ItemType::Table && !name.trim().is_empty() && normalize(name).is_empty() {
            return Err(DatabookError::Validation {
                message: format!("name '{}' contains no usable identifier characters", name),
            });
        }

        let item = self.tree.create(name, parent_id, item_type, icon).await?;

        if item.item_type != ItemType::Table {
            return Ok(CreatedItem { item, table: None });
        }

        let table_name = normalize(&item.name);
        let provisioned = self
            .schema
            .create_dynamic_table(NewDynamicTable {
                sidebar_item_id: item.id,
                table_name,
                display_name: item.name.clone(),
                description: None,
            })
            .await;

        match provisioned {
            Ok(table) => {
                info!(
                    "Created table item {} with table '{}' (id {})",
                    item.id, table.table_name, table.id
                );
                Ok(CreatedItem {
                    item,
                    table: Some(table),
                })
            }
            Err(err) => {
                warn!(
                    "Table provisioning for sidebar item {} failed ({}), rolling the item back",
                    item.id, err
                );
                if let Err(cleanup) = self.tree.delete_items(&[item.id]).await {
                    // Surface the original failure; the stray item needs
                    // manual cleanup.
                    error!(
                        "Rollback of sidebar item {} failed: {}",
                        item.id, cleanup
                    );
                }
                Err(err)
            }
        }
    }

    /// Delete an item and everything under it.
    ///
    /// Folders cascade to all descendants; deletion never refuses on a
    /// non-empty folder. Metadata for every table in the subtree goes
    /// first (taking columns and rows with it), then the items themselves.
    pub async fn delete_item(&self, id: i64) -> Result<DeletedSubtree> {
        let subtree = self.tree.collect_subtree(id).await?;
        if subtree.is_empty() {
            return Err(DatabookError::NotFound {
                entity: "sidebar item",
                id,
            });
        }

        let table_item_ids: Vec<i64> = subtree
            .iter()
            .filter(|item| item.item_type == ItemType::Table)
            .map(|item| item.id)
            .collect();

        let tables_deleted = self.schema.delete_by_sidebar_items(&table_item_ids).await?;

        let item_ids: Vec<i64> = subtree.iter().map(|item| item.id).collect();
        let items_deleted = self.tree.delete_items(&item_ids).await?;

        info!(
            "Deleted sidebar item {}: {} items, {} tables",
            id, items_deleted, tables_deleted
        );

        Ok(DeletedSubtree {
            items_deleted,
            tables_deleted,
        })
    }
}
