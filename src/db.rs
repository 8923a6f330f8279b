//! Postgres pool construction and optional schema bootstrap

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::controller::sql_ident::TableIdent;
use crate::error::Result;

const MAX_CONNECTIONS: u32 = 4;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects using `DATABASE_URL` when set, otherwise the libpq environment
/// (`PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE`, `PGSSLMODE`).
///
/// The URL may carry credentials, so it is never logged.
pub async fn connect() -> Result<PgPool> {
    let options = match std::env::var("DATABASE_URL") {
        Ok(url) => PgConnectOptions::from_str(&url)?,
        Err(_) => PgConnectOptions::new(),
    };
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;
    info!("connected to Postgres");
    Ok(pool)
}

/// Creates the destination table if it does not exist.
///
/// Columns and constraints match what the convergence SQL depends on; an
/// existing table is left untouched.
pub async fn ensure_table(pool: &PgPool, table: &TableIdent) -> Result<()> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n\
         \tcluster text NOT NULL,\n\
         \tnamespace text NOT NULL,\n\
         \tservice text NOT NULL,\n\
         \tpod_uid text NOT NULL,\n\
         \tpod_name text,\n\
         \tpod_ip inet NOT NULL,\n\
         \tready boolean NOT NULL DEFAULT true,\n\
         \tfirst_seen timestamptz NOT NULL DEFAULT now(),\n\
         \tlast_seen timestamptz NOT NULL DEFAULT now(),\n\
         \tPRIMARY KEY (cluster, namespace, service, pod_uid)\n\
         )"
    );
    sqlx::query(&ddl).execute(pool).await?;
    info!(table = %table, "destination table ensured");
    Ok(())
}
