//! PostgreSQL style registry and connection handling.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use std::time::{Duration, Instant};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use super::registry::{GeometryFamily, RegistryConnector, StyleRecord, StyleRegistry};
use crate::config::ConnectionConfig;
use crate::core::identifier::qualify_pg;
use crate::error::{MigrateError, Result};

/// Opens registry sessions against one database.
///
/// The pool holds at most one connection: it is created on the first
/// [`open`](RegistryConnector::open), reused by later runs and handed back
/// whenever a session is dropped.
pub struct PgConnector {
    pool: Pool,
    config: ConnectionConfig,
    style_table: String,
}

impl PgConnector {
    pub fn new(config: &ConnectionConfig, style_table: &str) -> Result<Self> {
        config.validate()?;
        qualify_pg(&config.schema, style_table)?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config.pg_config(), NoTls, mgr_config);
        let pool = Pool::builder(mgr).max_size(1).build().map_err(|e| {
            MigrateError::connection(format!("Failed to create pool: {}", e), config.endpoint())
        })?;

        Ok(Self {
            pool,
            config: config.clone(),
            style_table: style_table.to_string(),
        })
    }

    async fn acquire(&self) -> Result<Object> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| MigrateError::connection(e.to_string(), self.config.endpoint()))?;

        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(e.to_string(), self.config.endpoint()))?;

        Ok(client)
    }

    /// Round-trip latency of a trivial query.
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        let _client = self.acquire().await?;
        Ok(start.elapsed())
    }
}

#[async_trait]
impl RegistryConnector for PgConnector {
    async fn open(&self) -> Result<Box<dyn StyleRegistry>> {
        let client = self.acquire().await?;
        info!("Connected to PostgreSQL: {}", self.config.endpoint());
        let registry = PgStyleRegistry::new(client, &self.config.schema, &self.style_table)?;
        Ok(Box::new(registry))
    }
}

/// Style registry session over a single pooled connection.
pub struct PgStyleRegistry {
    client: Object,
    schema: String,
    table: String,
    qualified: String,
}

impl PgStyleRegistry {
    pub fn new(client: Object, schema: &str, table: &str) -> Result<Self> {
        Ok(Self {
            client,
            schema: schema.to_string(),
            table: table.to_string(),
            qualified: qualify_pg(schema, table)?,
        })
    }

    #[cfg(test)]
    async fn count_rows(&mut self, style_name: &str) -> Result<i64> {
        let sql = format!("SELECT count(*) FROM {} WHERE stylename = $1", self.qualified);
        let row = self.client.query_one(&sql, &[&style_name]).await?;
        Ok(row.get(0))
    }
}

const TABLE_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
     WHERE table_schema = $1 AND table_name = $2)";

fn create_table_sql(qualified: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id SERIAL PRIMARY KEY,
            f_table_catalog VARCHAR,
            f_table_schema VARCHAR,
            f_table_name VARCHAR,
            f_geometry_column VARCHAR,
            stylename TEXT,
            styleqml XML,
            stylesld XML,
            useasdefault BOOLEAN,
            description TEXT,
            owner VARCHAR(63) DEFAULT CURRENT_USER,
            ui XML,
            update_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            \"type\" VARCHAR
        )",
        qualified
    )
}

fn remove_style_sql(qualified: &str) -> String {
    format!("DELETE FROM {} WHERE stylename = $1", qualified)
}

fn clear_default_sql(qualified: &str) -> String {
    format!(
        "UPDATE {} SET useasdefault = false
         WHERE f_table_catalog = $1 AND f_table_schema = $2
           AND f_table_name = $3 AND f_geometry_column = $4",
        qualified
    )
}

fn insert_style_sql(qualified: &str) -> String {
    format!(
        "INSERT INTO {} (f_table_catalog, f_table_schema, f_table_name, f_geometry_column,
                         stylename, styleqml, useasdefault, description, owner)
         VALUES ($1, $2, $3, $4, $5, XMLPARSE(DOCUMENT $6), $7, $8, $9)",
        qualified
    )
}

/// Single bulk UPDATE mapping catalog geometry types onto family labels.
fn repair_types_sql(qualified: &str) -> String {
    let cases: String = GeometryFamily::ALL
        .iter()
        .map(|family| {
            let types = family
                .catalog_types()
                .iter()
                .map(|t| format!("'{}'", t))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "\n            WHEN gc.\"type\" IN ({}) THEN '{}'",
                types,
                family.label()
            )
        })
        .collect();

    format!(
        "UPDATE {} AS ls SET \"type\" = (
        SELECT CASE{}
        END
        FROM geometry_columns AS gc
        WHERE gc.f_table_schema = ls.f_table_schema
          AND gc.f_table_name = ls.f_table_name
        LIMIT 1
    )",
        qualified, cases
    )
}

#[async_trait]
impl StyleRegistry for PgStyleRegistry {
    async fn style_table_exists(&mut self) -> Result<bool> {
        let row = self
            .client
            .query_one(TABLE_EXISTS_SQL, &[&self.schema, &self.table])
            .await?;
        Ok(row.get(0))
    }

    async fn remove_style(&mut self, style_name: &str) -> Result<u64> {
        if !self.style_table_exists().await? {
            return Ok(0);
        }

        let sql = remove_style_sql(&self.qualified);
        let tx = self.client.transaction().await?;
        let removed = tx.execute(sql.as_str(), &[&style_name]).await?;
        tx.commit().await?;

        debug!("Removed {} registry row(s) for style '{}'", removed, style_name);
        Ok(removed)
    }

    async fn save_style(&mut self, record: &StyleRecord) -> Result<()> {
        let qualified = self.qualified.clone();
        self.client
            .batch_execute(&create_table_sql(&qualified))
            .await?;

        let tx = self.client.transaction().await?;
        if record.use_as_default {
            tx.execute(
                clear_default_sql(&qualified).as_str(),
                &[
                    &record.catalog,
                    &record.schema,
                    &record.table,
                    &record.geometry_column,
                ],
            )
            .await?;
        }
        tx.execute(
            insert_style_sql(&qualified).as_str(),
            &[
                &record.catalog,
                &record.schema,
                &record.table,
                &record.geometry_column,
                &record.style_name,
                &record.body,
                &record.use_as_default,
                &record.description,
                &record.owner,
            ],
        )
        .await?;
        tx.commit().await?;

        debug!(
            "Saved style '{}' for {}.{}",
            record.style_name, record.schema, record.table
        );
        Ok(())
    }

    async fn repair_geometry_types(&mut self) -> Result<u64> {
        if !self.style_table_exists().await? {
            debug!("Style table {} not found, skipping type repair", self.qualified);
            return Ok(0);
        }

        let sql = repair_types_sql(&self.qualified);
        let tx = self.client.transaction().await?;
        let updated = tx.execute(sql.as_str(), &[]).await?;
        tx.commit().await?;

        info!("Repaired geometry type of {} registry row(s)", updated);
        Ok(updated)
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
