//! Value model shared by the expression layer and the bind-variable subsystem.
//!
//! - **DataType**: the scalar kinds the engine knows about
//! - **Value**: the tagged value union produced by evaluation
//! - **sentinel**: the reserved NULL value of each kind, used by typed holders

pub mod sentinel;
pub mod value;

pub use value::{DataType, Value};
