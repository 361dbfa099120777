//! Bind variables: runtime-supplied parameter values for compiled expressions.
//!
//! This module provides:
//! - Typed value holders, one variant per scalar kind, with kind-specific
//!   NULL sentinels
//! - The per-statement registry mapping `$n` positions and `:name` names to
//!   holders, with first-bind-wins type resolution
//! - Conversion rules and text parsing for rebinding a typed slot
//! - Decoding of PostgreSQL extended-protocol parameters
//!
//! # Concurrency contract
//!
//! A registry has exactly one writer (the statement owner) and any number of
//! readers (execution workers), and the two never overlap. Holders carry no
//! locks or atomics; the contract is enforced by the caller's dispatch
//! boundary:
//!
//! 1. All binds for an execution round complete before that round's workers
//!    are dispatched.
//! 2. Workers receive `&BindVariables` and read holders once per row.
//! 3. `clear_all` and the next round's binds happen only after every worker
//!    of the previous round has been joined.
//!
//! Every mutating operation takes `&mut BindVariables`, so the borrow
//! checker rejects a bind or clear while a dispatch scope still holds the
//! shared borrow, and joining the scope's threads is the happens-before
//! edge that publishes the next round's values. Because of this every
//! holder kind, VARCHAR included, reports `is_read_thread_safe() == true`.
//! Callers that hold a statement behind shared ownership must provide the
//! same guarantee with a lock held across the whole dispatch, as
//! [`crate::session::Session`] does.

pub mod convert;
pub mod error;
pub mod key;
pub mod registry;
pub mod variable;
pub mod wire;

pub use error::{BindError, BindResult};
pub use key::{BindKey, SlotId};
pub use registry::BindVariables;
pub use variable::{BindHolder, BindVariable, BindVariableRef};
