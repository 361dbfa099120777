//! Session management for prepared predicates.
//!
//! A session owns named prepared statements. Each statement carries its
//! compiled predicate and its bind variable registry, and is held behind a
//! read-write lock: binds take the write lock, executions hold the read
//! lock for the whole worker dispatch.

use crate::access::Value;
use crate::bind::{wire, BindKey, BindVariables};
use crate::executor::{ColumnInfo, ExecutorConfig, ParallelFilter, Row};
use crate::expression::Expression;
use crate::sql;
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A compiled predicate together with its bind variables
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    schema: Vec<ColumnInfo>,
    predicate: Expression,
    bind_variables: BindVariables,
    /// Parameter type OIDs announced at prepare time (0 = unspecified)
    parameter_oids: Vec<i32>,
}

impl PreparedStatement {
    /// Compile `sql` against `schema`
    pub fn prepare(sql: &str, schema: Vec<ColumnInfo>) -> Result<Self> {
        Self::prepare_with_oids(sql, schema, &[])
    }

    /// Compile `sql`, typing positional slots from PostgreSQL parameter OIDs
    pub fn prepare_with_oids(sql: &str, schema: Vec<ColumnInfo>, oids: &[i32]) -> Result<Self> {
        let mut bind_variables = BindVariables::new();
        wire::define_from_oids(&mut bind_variables, oids)
            .context("Invalid parameter types")?;
        let predicate = sql::compile(sql, &schema, &mut bind_variables)
            .with_context(|| format!("Failed to compile predicate: {}", sql))?;
        Ok(Self {
            sql: sql.to_string(),
            schema,
            predicate,
            bind_variables,
            parameter_oids: oids.to_vec(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }

    pub fn predicate(&self) -> &Expression {
        &self.predicate
    }

    pub fn bind_variables(&self) -> &BindVariables {
        &self.bind_variables
    }

    pub fn bind_variables_mut(&mut self) -> &mut BindVariables {
        &mut self.bind_variables
    }

    /// Bind a PostgreSQL Bind message's parameters to `$1..`.
    ///
    /// Either every parameter is bound or, on error, none is.
    pub fn bind_wire(&mut self, formats: &[i16], params: &[Option<&[u8]>]) -> Result<()> {
        wire::bind_parameters(
            &mut self.bind_variables,
            &self.parameter_oids,
            formats,
            params,
        )
        .with_context(|| format!("Failed to bind parameters of: {}", self.sql))
    }

    /// Run the predicate over `rows` with the current binds
    pub fn execute(&self, filter: &ParallelFilter, rows: &[Row]) -> Result<Vec<usize>> {
        let unbound = self.bind_variables.unbound_keys();
        if !unbound.is_empty() {
            debug!("Executing with NULL bind variables: {:?}", unbound);
        }
        filter
            .execute(&self.predicate, &self.schema, rows, &self.bind_variables)
            .with_context(|| format!("Failed to execute: {}", self.sql))
    }

    /// Clear every bind variable back to NULL, keeping slot types
    pub fn reset(&mut self) {
        self.bind_variables.clear_all();
    }
}

/// A client session owning named prepared statements
pub struct Session {
    /// Session ID for tracking.
    pub session_id: u64,
    statements: HashMap<String, Arc<RwLock<PreparedStatement>>>,
    filter: ParallelFilter,
}

impl Session {
    /// Creates a new session with its own worker pool.
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let filter = ParallelFilter::new(config).context("Failed to create executor")?;
        info!(
            "Session {} started with {} workers",
            session_id,
            config.workers()
        );
        Ok(Self {
            session_id,
            statements: HashMap::new(),
            filter,
        })
    }

    /// Prepare (or replace) statement `name`
    pub fn prepare(&mut self, name: &str, sql: &str, schema: Vec<ColumnInfo>) -> Result<()> {
        self.prepare_with_oids(name, sql, schema, &[])
    }

    pub fn prepare_with_oids(
        &mut self,
        name: &str,
        sql: &str,
        schema: Vec<ColumnInfo>,
        oids: &[i32],
    ) -> Result<()> {
        let statement = PreparedStatement::prepare_with_oids(sql, schema, oids)?;
        debug!(
            "Session {} prepared '{}' with {} bind variables",
            self.session_id,
            name,
            statement.bind_variables().len()
        );
        self.statements
            .insert(name.to_string(), Arc::new(RwLock::new(statement)));
        Ok(())
    }

    /// Shared handle to statement `name`
    pub fn statement(&self, name: &str) -> Result<Arc<RwLock<PreparedStatement>>> {
        self.statements
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Prepared statement '{}' does not exist", name))
    }

    /// Bind `value` to `$index` of statement `name`
    pub fn bind(&self, name: &str, index: usize, value: impl Into<Value>) -> Result<()> {
        let statement = self.statement(name)?;
        let mut statement = statement.write();
        statement.bind_variables_mut().bind_by_index(index, value)?;
        Ok(())
    }

    /// Bind `value` to `:variable` of statement `name`
    pub fn bind_named(&self, name: &str, variable: &str, value: impl Into<Value>) -> Result<()> {
        let statement = self.statement(name)?;
        let mut statement = statement.write();
        statement.bind_variables_mut().bind_by_name(variable, value)?;
        Ok(())
    }

    /// Bind a text-format value; `None` binds NULL
    pub fn bind_text(&self, name: &str, key: &BindKey, text: Option<&str>) -> Result<()> {
        let statement = self.statement(name)?;
        let mut statement = statement.write();
        let vars = statement.bind_variables_mut();
        match key {
            BindKey::Index(index) => vars.bind_text_by_index(*index, text)?,
            BindKey::Name(variable) => vars.bind_text_by_name(variable, text)?,
        }
        Ok(())
    }

    /// Bind PostgreSQL Bind-message parameters to statement `name`
    pub fn bind_wire(&self, name: &str, formats: &[i16], params: &[Option<&[u8]>]) -> Result<()> {
        let statement = self.statement(name)?;
        let mut statement = statement.write();
        statement.bind_wire(formats, params)
    }

    /// Execute statement `name` over `rows`.
    ///
    /// The read lock is held until every worker has finished, so no bind on
    /// this statement can interleave with the dispatch.
    pub fn execute(&self, name: &str, rows: &[Row]) -> Result<Vec<usize>> {
        let statement = self.statement(name)?;
        let statement = statement.read();
        statement.execute(&self.filter, rows)
    }

    /// Clear the binds of statement `name`
    pub fn reset(&self, name: &str) -> Result<()> {
        let statement = self.statement(name)?;
        statement.write().reset();
        debug!("Session {} reset '{}'", self.session_id, name);
        Ok(())
    }

    /// Drop statement `name`; returns whether it existed
    pub fn close(&mut self, name: &str) -> bool {
        self.statements.remove(name).is_some()
    }

    pub fn statement_names(&self) -> impl Iterator<Item = &str> {
        self.statements.keys().map(String::as_str)
    }
}
