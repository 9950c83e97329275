//! HTTP layer: one module per endpoint group, shared state here.
//!
//! Handlers stay thin: extract, parse enum strings, call the workspace or
//! a repository, serialize. All failures surface through
//! `DatabookError::into_response`.

mod columns;
mod health;
mod rows;
mod sidebar;
mod tables;

pub use columns::{create_column, delete_column, list_columns, update_column};
pub use health::health_check;
pub use rows::{create_row, delete_row, list_rows, update_row};
pub use sidebar::{
    create_sidebar_item, delete_sidebar_item, list_sidebar, rename_sidebar_item, sidebar_tree,
};
pub use tables::{create_table, get_table_for_item};

use crate::config::Config;
use crate::repo::{RowRepository, SchemaRepository, TreeRepository};
use crate::workspace::Workspace;
use deadpool_postgres::Pool;
use std::time::Instant;

/// Shared state for all endpoints.
pub struct AppState {
    pub pool: Pool,
    pub tree: TreeRepository,
    pub schema: SchemaRepository,
    pub rows: RowRepository,
    pub workspace: Workspace,
    pub config: Config,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: Pool, config: Config) -> Self {
        let tree = TreeRepository::new(pool.clone());
        let schema = SchemaRepository::new(pool.clone());
        let rows = RowRepository::new(pool.clone());
        let workspace = Workspace::new(tree.clone(), schema.clone());

        Self {
            pool,
            tree,
            schema,
            rows,
            workspace,
            config,
            started_at: Instant::now(),
        }
    }
}
