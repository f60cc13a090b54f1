//! `Connection` implementation over a `tokio_postgres::Client`.

use crate::error::store_error;
use crate::opts::PostgresOpts;
use crate::params::{bind_row, param_types};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use load_core::{
    parse_stored_timestamp, sql, Connection, Identifier, Row, StoreError, StoreErrorKind,
    TableSpec, Transaction, Watermark,
};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, error, info, warn};

/// A PostgreSQL connection the loader can provision, query and insert through.
pub struct PostgresConnection {
    client: Client,
    connection_task: JoinHandle<()>,
}

impl PostgresConnection {
    /// Connect and place `opts.postgres_schema` on the search_path.
    pub async fn connect(opts: &PostgresOpts) -> Result<Self> {
        let config = opts.to_config()?;
        let (client, connection) = config
            .connect(NoTls)
            .await
            .context("Failed to connect to PostgreSQL")?;

        // Spawn the connection task
        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        let schema = Identifier::new(opts.postgres_schema.clone())
            .with_context(|| format!("Invalid schema name '{}'", opts.postgres_schema))?;
        client
            .batch_execute(&format!("SET search_path TO {schema};"))
            .await
            .with_context(|| format!("Failed to set search_path to {schema}"))?;

        info!("Connected to PostgreSQL (search_path: {schema})");
        Ok(Self {
            client,
            connection_task,
        })
    }

    /// Close the connection and wait for its task to finish.
    pub async fn close(self) {
        drop(self.client);
        if let Err(e) = self.connection_task.await {
            warn!("PostgreSQL connection task ended abnormally: {e}");
        }
    }
}

fn decode_watermark(row: &tokio_postgres::Row) -> Result<Watermark, StoreError> {
    if let Ok(value) = row.try_get::<_, Option<NaiveDateTime>>(0) {
        return Ok(Watermark::from(value));
    }
    if let Ok(value) = row.try_get::<_, Option<DateTime<Utc>>>(0) {
        return Ok(Watermark::from(value.map(|ts| ts.naive_utc())));
    }

    // Tables created by other tools may hold the watermark column as text.
    let text: Option<String> = row.try_get(0).map_err(store_error)?;
    match text {
        None => Ok(Watermark::null()),
        Some(t) => parse_stored_timestamp(&t)
            .map(Watermark::at)
            .map_err(|e| StoreError::new(StoreErrorKind::InvalidValue, e.to_string())),
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn create_table(&mut self, spec: &TableSpec) -> Result<(), StoreError> {
        let ddl = sql::create_table(spec);
        let tx = self.client.transaction().await.map_err(store_error)?;

        if let Err(e) = tx.batch_execute(&ddl).await {
            if let Err(rollback) = tx.rollback().await {
                warn!("Rollback after failed DDL on {} failed: {rollback}", spec.name);
            }
            return Err(store_error(e));
        }

        tx.commit().await.map_err(store_error)
    }

    async fn max_timestamp(
        &mut self,
        table: &Identifier,
        column: &Identifier,
    ) -> Result<Watermark, StoreError> {
        let query = sql::max_value(table, column);
        let row = self
            .client
            .query_one(query.as_str(), &[])
            .await
            .map_err(store_error)?;
        decode_watermark(&row)
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, StoreError> {
        let tx = self.client.transaction().await.map_err(store_error)?;
        Ok(Box::new(PostgresTransaction {
            tx,
            prepared: None,
        }))
    }
}

/// An open PostgreSQL transaction. Dropping it without committing rolls back.
pub struct PostgresTransaction<'a> {
    tx: tokio_postgres::Transaction<'a>,
    prepared: Option<(String, Statement)>,
}

impl PostgresTransaction<'_> {
    async fn statement_for(&mut self, spec: &TableSpec) -> Result<Statement, StoreError> {
        let insert = sql::insert_row(&spec.name, spec.arity());
        if let Some((cached, statement)) = &self.prepared {
            if *cached == insert {
                return Ok(statement.clone());
            }
        }

        debug!("Preparing: {insert}");
        let statement = self
            .tx
            .prepare_typed(&insert, &param_types(spec))
            .await
            .map_err(store_error)?;
        self.prepared = Some((insert, statement.clone()));
        Ok(statement)
    }
}

#[async_trait]
impl<'a> Transaction for PostgresTransaction<'a> {
    async fn insert_row(&mut self, spec: &TableSpec, row: &Row) -> Result<(), StoreError> {
        let params = bind_row(spec, row)?;
        let statement = self.statement_for(spec).await?;

        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        self.tx
            .execute(&statement, &param_refs)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(store_error)
    }
}
