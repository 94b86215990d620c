//! Destination stores for the full-replace load.

use crate::config::DatabaseConfig;
use crate::table::{SqlValue, TableData};
use crate::Result;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::collections::HashMap;
use std::sync::Mutex;

/// Rows per multi-row `INSERT`, well below MySQL's placeholder limit.
pub const INSERT_CHUNK_ROWS: usize = 500;

/// A relational store that can replace a table wholesale.
#[async_trait(?Send)]
pub trait TableStore {
    /// Drop `table.name` if it exists, recreate it from `table.columns` and insert
    /// every row. Returns the number of rows inserted.
    async fn replace_table(&self, table: &TableData) -> Result<u64>;
}

/// MySQL-backed [`TableStore`].
///
/// The pool connects lazily, so an unreachable server is reported by
/// [`replace_table`](TableStore::replace_table) rather than at construction.
pub struct MySqlTableStore {
    pool: MySqlPool,
}

impl MySqlTableStore {
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);

        Self { pool }
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait(?Send)]
impl TableStore for MySqlTableStore {
    async fn replace_table(&self, table: &TableData) -> Result<u64> {
        log::info!("Connecting to MySQL...");
        let mut conn = self.pool.acquire().await?;

        let drop_sql = format!("DROP TABLE IF EXISTS `{}`", table.name);
        sqlx::query(&drop_sql).execute(&mut *conn).await?;

        let create_sql = table.create_table_sql();
        log::debug!("{create_sql}");
        sqlx::query(&create_sql).execute(&mut *conn).await?;

        let column_list = table
            .columns
            .iter()
            .map(|column| format!("`{}`", column.name()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut inserted = 0;
        for chunk in table.rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new(format!("INSERT INTO `{}` ({column_list}) ", table.name));

            builder.push_values(chunk, |mut row_builder, row| {
                for value in row {
                    match value {
                        SqlValue::Null => row_builder.push_bind(None::<String>),
                        SqlValue::Timestamp(ts) => row_builder.push_bind(*ts),
                        SqlValue::BigInt(n) => row_builder.push_bind(*n),
                        SqlValue::Boolean(b) => row_builder.push_bind(*b),
                        SqlValue::Text(s) => row_builder.push_bind(s.clone()),
                    };
                }
            });

            let result = builder.build().execute(&mut *conn).await?;
            inserted += result.rows_affected();
            log::debug!("Inserted {inserted}/{} rows", table.row_count());
        }

        Ok(inserted)
    }
}

/// In-memory [`TableStore`] for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, TableData>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content of a table.
    pub fn table(&self, name: &str) -> Option<TableData> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}

#[async_trait(?Send)]
impl TableStore for MemoryTableStore {
    async fn replace_table(&self, table: &TableData) -> Result<u64> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(table.name.clone(), table.clone());
        Ok(table.row_count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn table(rows: usize) -> TableData {
        TableData {
            name: "play_history".to_string(),
            columns: vec![Column::TrackId],
            rows: (0..rows)
                .map(|i| vec![SqlValue::Text(format!("t{i}"))])
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_replaces_instead_of_appending() {
        let store = MemoryTableStore::new();

        assert_eq!(store.replace_table(&table(5)).await.unwrap(), 5);
        assert_eq!(store.replace_table(&table(3)).await.unwrap(), 3);

        assert_eq!(store.table("play_history").unwrap().row_count(), 3);
        assert!(store.table("other").is_none());
    }
}
