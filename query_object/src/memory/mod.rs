//! In-process execution of built queries
//!
//! `MemoryExecutor` evaluates the same `QueryBuilder` the PostgreSQL
//! executor renders, over any `TableSource`.

mod evaluate;
pub mod executor;
pub mod source;

pub use executor::MemoryExecutor;
pub use source::{TableSink, TableSource};
