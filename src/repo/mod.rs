//! Repositories over the core relations.
//!
//! Each repository is constructed with the shared connection pool and
//! raises typed errors; cross-entity coordination lives in the workspace
//! layer, not here.

pub mod rows;
pub mod schema;
pub mod tree;

pub use rows::{resolve_defaults, RowData, RowRecord, RowRepository};
pub use schema::{
    ColumnDefinition, ColumnPatch, ColumnType, DynamicTable, NewColumn, NewDynamicTable,
    SchemaRepository,
};
pub use tree::{build_tree, ItemType, SidebarItem, TreeNode, TreeRepository};
