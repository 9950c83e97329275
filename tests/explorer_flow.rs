//! Live-store integration suite.
//!
//! Each test runs only when `TEST_DATABASE_URL` points at a reachable
//! PostgreSQL instance and is a no-op otherwise, so the suite is safe in
//! environments without a database. Names are suffixed per run because
//! table names are globally unique.

use databook_server::db;
use databook_server::error::DatabookError;
use databook_server::ident::normalize;
use databook_server::repo::{
    ColumnType, ItemType, NewColumn, RowRepository, SchemaRepository, TreeRepository,
};
use databook_server::workspace::Workspace;
use deadpool_postgres::Pool;
use serde_json::{json, Map, Value};

struct Fixture {
    tree: TreeRepository,
    schema: SchemaRepository,
    rows: RowRepository,
    workspace: Workspace,
}

async fn setup() -> Option<Fixture> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool: Pool = db::create_pool(&url, 4).ok()?;
    db::ensure_core_tables(&pool).await.ok()?;

    let tree = TreeRepository::new(pool.clone());
    let schema = SchemaRepository::new(pool.clone());
    let rows = RowRepository::new(pool.clone());
    let workspace = Workspace::new(tree.clone(), schema.clone());

    Some(Fixture {
        tree,
        schema,
        rows,
        workspace,
    })
}

fn unique(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("{} {} {}", label, std::process::id(), nanos)
}

fn payload(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn end_to_end_folder_table_column_row_lifecycle() {
    let Some(fx) = setup().await else { return };

    let folder = fx
        .workspace
        .create_item(&unique("Tables"), None, ItemType::Folder, None)
        .await
        .unwrap();
    assert!(folder.table.is_none());

    let table_label = unique("Customers");
    let created = fx
        .workspace
        .create_item(&table_label, Some(folder.item.id), ItemType::Table, Some("grid"))
        .await
        .unwrap();
    let table = created.table.expect("table items get metadata");
    assert_eq!(table.table_name, normalize(&table_label));
    assert_eq!(table.sidebar_item_id, created.item.id);

    // Metadata is reachable through the sidebar item binding
    let found = fx
        .schema
        .get_by_sidebar_item(created.item.id)
        .await
        .unwrap()
        .expect("metadata bound to the item");
    assert_eq!(found.id, table.id);

    let column = fx
        .schema
        .create_column(NewColumn {
            table_id: table.id,
            column_name: normalize("Full Name"),
            display_name: "Full Name".to_string(),
            data_type: ColumnType::Text,
            is_required: true,
            default_value: None,
            sort_order: None,
            width: None,
        })
        .await
        .unwrap();
    assert_eq!(column.column_name, "full_name");
    assert_eq!(column.width, 150);
    assert_eq!(column.sort_order, 0);

    fx.rows
        .create(table.id, payload(&[("full_name", json!("Ada"))]))
        .await
        .unwrap();

    let page = fx.rows.list(table.id, 10, 0).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].row_data["full_name"], json!("Ada"));

    // Deleting the folder takes the table item, its metadata and its rows
    let deleted = fx.workspace.delete_item(folder.item.id).await.unwrap();
    assert_eq!(deleted.items_deleted, 2);
    assert_eq!(deleted.tables_deleted, 1);

    assert!(fx
        .schema
        .get_by_sidebar_item(created.item.id)
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        fx.rows.list(table.id, 10, 0).await,
        Err(DatabookError::NotFound { .. })
    ));
}

#[tokio::test]
async fn table_item_rolls_back_when_provisioning_conflicts() {
    let Some(fx) = setup().await else { return };

    let label = unique("Shipments");
    let first = fx
        .workspace
        .create_item(&label, None, ItemType::Table, None)
        .await
        .unwrap();

    // Same label, same normalized table name: provisioning must conflict
    let err = fx
        .workspace
        .create_item(&label, None, ItemType::Table, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabookError::Conflict { .. }));

    // Compensating delete: the failed attempt left no sidebar item behind
    let items = fx.tree.list().await.unwrap();
    assert_eq!(items.iter().filter(|i| i.name == label).count(), 1);

    fx.workspace.delete_item(first.item.id).await.unwrap();
}

#[tokio::test]
async fn row_update_replaces_entire_payload() {
    let Some(fx) = setup().await else { return };

    let created = fx
        .workspace
        .create_item(&unique("Inventory"), None, ItemType::Table, None)
        .await
        .unwrap();
    let table = created.table.unwrap();

    let row = fx
        .rows
        .create(table.id, payload(&[("a", json!(1)), ("b", json!(2))]))
        .await
        .unwrap();

    let updated = fx
        .rows
        .update(row.id, payload(&[("a", json!(9))]))
        .await
        .unwrap();

    // Full replace, not a merge: "b" is gone
    assert_eq!(updated.row_data.len(), 1);
    assert_eq!(updated.row_data["a"], json!(9));
    assert!(updated.row_data.get("b").is_none());

    fx.workspace.delete_item(created.item.id).await.unwrap();
}

#[tokio::test]
async fn deleting_a_column_keeps_stored_row_values() {
    let Some(fx) = setup().await else { return };

    let created = fx
        .workspace
        .create_item(&unique("Tickets"), None, ItemType::Table, None)
        .await
        .unwrap();
    let table = created.table.unwrap();

    let column = fx
        .schema
        .create_column(NewColumn {
            table_id: table.id,
            column_name: "status".to_string(),
            display_name: "Status".to_string(),
            data_type: ColumnType::Text,
            is_required: false,
            default_value: None,
            sort_order: None,
            width: None,
        })
        .await
        .unwrap();

    fx.rows
        .create(table.id, payload(&[("status", json!("open"))]))
        .await
        .unwrap();

    fx.schema.delete_column(column.id).await.unwrap();
    assert!(fx.schema.list_columns(table.id).await.unwrap().is_empty());

    // The stored value survives the definition it belonged to
    let page = fx.rows.list(table.id, 10, 0).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].row_data["status"], json!("open"));

    // A new row omitting the key gets nothing substituted for it either
    fx.rows.create(table.id, Map::new()).await.unwrap();
    let page = fx.rows.list(table.id, 10, 0).await.unwrap();
    assert!(page[1].row_data.is_empty());

    fx.workspace.delete_item(created.item.id).await.unwrap();
}

#[tokio::test]
async fn rename_is_noop_for_identical_name() {
    let Some(fx) = setup().await else { return };

    let label = unique("Reports");
    let created = fx
        .workspace
        .create_item(&label, None, ItemType::Folder, None)
        .await
        .unwrap();

    let renamed = fx.tree.rename(created.item.id, &label).await.unwrap();
    assert_eq!(renamed.updated_at, created.item.updated_at);

    let renamed = fx.tree.rename(created.item.id, "Archived Reports").await.unwrap();
    assert_eq!(renamed.name, "Archived Reports");

    fx.workspace.delete_item(created.item.id).await.unwrap();
}

#[tokio::test]
async fn sibling_sort_order_increments_per_scope() {
    let Some(fx) = setup().await else { return };

    let folder = fx
        .workspace
        .create_item(&unique("Scope"), None, ItemType::Folder, None)
        .await
        .unwrap();

    let a = fx
        .workspace
        .create_item(&unique("A"), Some(folder.item.id), ItemType::Folder, None)
        .await
        .unwrap();
    let b = fx
        .workspace
        .create_item(&unique("B"), Some(folder.item.id), ItemType::Folder, None)
        .await
        .unwrap();

    // Children get their own scope starting at 0
    assert_eq!(a.item.sort_order, 0);
    assert_eq!(b.item.sort_order, a.item.sort_order + 1);

    fx.workspace.delete_item(folder.item.id).await.unwrap();
}
