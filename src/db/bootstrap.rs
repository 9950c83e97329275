use crate::error::Result;
use deadpool_postgres::Pool;
use tracing::info;

/// Create the core relations if they are missing.
///
/// Runs at process start and is idempotent. Deletes cascade along the
/// ownership chain: sidebar item -> dynamic table -> {column definitions,
/// rows}. Row payloads carry no constraint against column definitions;
/// payload keys and the column set are reconciled at read time.
pub async fn ensure_core_tables(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;

    client
        .batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS sidebar_items (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id BIGINT REFERENCES sidebar_items(id) ON DELETE CASCADE,
                item_type TEXT NOT NULL CHECK (item_type IN ('folder', 'table')),
                icon TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE TABLE IF NOT EXISTS dynamic_tables (
                id BIGSERIAL PRIMARY KEY,
                sidebar_item_id BIGINT NOT NULL UNIQUE REFERENCES sidebar_items(id) ON DELETE CASCADE,
                table_name TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                description TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE TABLE IF NOT EXISTS column_definitions (
                id BIGSERIAL PRIMARY KEY,
                table_id BIGINT NOT NULL REFERENCES dynamic_tables(id) ON DELETE CASCADE,
                column_name TEXT NOT NULL,
                display_name TEXT NOT NULL,
                data_type TEXT NOT NULL,
                is_required BOOLEAN NOT NULL DEFAULT FALSE,
                default_value TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                width INTEGER NOT NULL DEFAULT 150,
                UNIQUE (table_id, column_name)
            );

            CREATE TABLE IF NOT EXISTS table_rows (
                id BIGSERIAL PRIMARY KEY,
                table_id BIGINT NOT NULL REFERENCES dynamic_tables(id) ON DELETE CASCADE,
                row_data JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE INDEX IF NOT EXISTS idx_sidebar_items_parent ON sidebar_items(parent_id);
            CREATE INDEX IF NOT EXISTS idx_column_definitions_table ON column_definitions(table_id);
            CREATE INDEX IF NOT EXISTS idx_table_rows_table ON table_rows(table_id);
            "#,
        )
        .await?;

    info!("Core relations ready");
    Ok(())
}
