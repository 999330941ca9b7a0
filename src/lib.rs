//! select_ir - mutable intermediate representation for relational SELECT statements
//!
//! This crate sits between a query compiler that binds object-graph queries
//! onto relational tables and a SQL text generator. It provides:
//! - A tagged expression tree and table-source model
//! - The [`QueryNode`](select_ir::QueryNode) binding API (tables, projections,
//!   predicates, ordering, paging)
//! - Structural rewrites: subquery push-down, star projection binding and
//!   explosion, correlation detection
//! - Row-number paging emulation for dialects without native OFFSET

pub mod utils;

pub mod config;
pub mod dialect;
pub mod select_ir;

pub use config::IrConfig;
pub use select_ir::{
    CompilationContext, Expression, IrError, IrResult, OrderByItem, OrderByOrder, QueryNode,
    QuerySourceId, SqlType, TableRef, TypeKind,
};
