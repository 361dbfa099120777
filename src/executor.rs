//! Executor layer for predicate evaluation over in-memory rows.
//!
//! A compiled predicate is evaluated against a batch of rows by a pool of
//! worker threads. All workers share the statement's expression tree and
//! bind variable registry for the duration of one dispatch.

use crate::access::{DataType, Value};
use crate::expression::ExpressionError;
use thiserror::Error;

pub mod filter;

pub use filter::ParallelFilter;

/// One input row, in schema column order
pub type Row = Vec<Value>;

/// Information about a column in the input schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Worker pool sizing for parallel execution.
///
/// Both sizes are at least one; construct through [`ExecutorConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    workers: usize,
    chunk_size: usize,
}

impl ExecutorConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    pub fn new(workers: usize, chunk_size: usize) -> Self {
        Self {
            workers: workers.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Rows handed to a worker at a time
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Single worker, used when a tree cannot be shared between threads
    pub fn single_threaded() -> Self {
        Self::new(1, Self::DEFAULT_CHUNK_SIZE)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers, Self::DEFAULT_CHUNK_SIZE)
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
