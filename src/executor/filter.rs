//! Parallel filter executor.
//!
//! Rows are split into chunks and evaluated on a dedicated rayon pool.
//! Before dispatch the predicate is type checked against the schema and the
//! current binds, then every runtime-constant subtree is folded to a
//! literal, so per-row work only touches columns.

use crate::access::DataType;
use crate::bind::BindVariables;
use crate::executor::{ColumnInfo, ExecutorConfig, ExecutorResult, Row};
use crate::expression::{
    evaluate_predicate, fold_runtime_constants, Expression, ExpressionResult, TypeChecker,
};
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Executor that selects the rows matching a predicate
pub struct ParallelFilter {
    config: ExecutorConfig,
    pool: ThreadPool,
}

impl ParallelFilter {
    /// Create a filter with its own worker pool
    pub fn new(config: ExecutorConfig) -> ExecutorResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .thread_name(|i| format!("filter-worker-{i}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> ExecutorConfig {
        self.config
    }

    /// Indices of the rows for which `predicate` is true, in input order.
    ///
    /// `bind_variables` must be fully bound for this execution; it is only
    /// read, never written, while workers run.
    pub fn execute(
        &self,
        predicate: &Expression,
        schema: &[ColumnInfo],
        rows: &[Row],
        bind_variables: &BindVariables,
    ) -> ExecutorResult<Vec<usize>> {
        let schema_types: Vec<DataType> = schema.iter().map(|c| c.data_type).collect();
        TypeChecker::new(&schema_types)
            .with_bind_variables(bind_variables)
            .check_filter_predicate(predicate)?;

        let folded = fold_runtime_constants(predicate, bind_variables);
        let chunk_size = self.config.chunk_size();

        if self.config.workers() == 1 || rows.len() <= chunk_size || !folded.is_read_thread_safe() {
            debug!("Filtering {} rows on the calling thread", rows.len());
            return Ok(select_chunk(&folded, rows, 0, bind_variables)?);
        }

        debug!(
            "Dispatching {} rows to {} workers in chunks of {}",
            rows.len(),
            self.config.workers(),
            chunk_size
        );
        let chunks: Vec<Vec<usize>> = self.pool.install(|| {
            rows.par_chunks(chunk_size)
                .enumerate()
                .map(|(i, chunk)| select_chunk(&folded, chunk, i * chunk_size, bind_variables))
                .collect::<ExpressionResult<_>>()
        })?;
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Matching rows, cloned, in input order
    pub fn filter_rows(
        &self,
        predicate: &Expression,
        schema: &[ColumnInfo],
        rows: &[Row],
        bind_variables: &BindVariables,
    ) -> ExecutorResult<Vec<Row>> {
        let selected = self.execute(predicate, schema, rows, bind_variables)?;
        Ok(selected.into_iter().map(|i| rows[i].clone()).collect())
    }
}

fn select_chunk(
    predicate: &Expression,
    rows: &[Row],
    offset: usize,
    bind_variables: &BindVariables,
) -> ExpressionResult<Vec<usize>> {
    let mut selected = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if evaluate_predicate(predicate, row, bind_variables)? {
            selected.push(offset + i);
        }
    }
    Ok(selected)
}
