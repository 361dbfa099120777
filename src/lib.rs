pub mod access;
pub mod bind;
pub mod executor;
pub mod expression;
pub mod session;
pub mod sql;
