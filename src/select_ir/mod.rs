//! The SELECT intermediate representation.
//!
//! A [`QueryNode`] is built incrementally by a query compiler: tables are
//! added, logical properties are bound to columns, and predicates, orderings
//! and paging clauses are attached. Mutations that would silently change the
//! meaning of an already-paged node push the node's state down into a nested
//! subquery first (see [`QueryNode::push_down_subquery`]).
//!
//! # Key Components
//!
//! - [`Expression`] - tagged expression tree
//! - [`TableRef`] - base tables, joins and nested queries
//! - [`QueryNode`] - the mutable SELECT node and its binding API
//! - [`structural_eq`] - alias-insensitive deep equality and hashing
//! - [`CompilationContext`] - per-compilation alias allocator

pub mod catalog;
pub mod combinators;
pub mod compilation_ctx;
mod correlation;
pub mod errors;
pub mod expression;
mod push_down;
pub mod query_node;
pub mod sql_types;
pub mod structural_eq;
pub mod table_ref;
pub mod visitors;

pub use catalog::{InMemoryCatalog, PropertyCatalog};
pub use compilation_ctx::CompilationContext;
pub use errors::{IrError, IrResult};
pub use expression::{
    AliasExpr, BinaryExpr, BinaryOperator, Cast, ColumnRef, Constant, ExistsSubquery, Expression,
    FunctionCall, Literal, OrderByItem, OrderByOrder, Parameter, RowNumber, StarRef,
    SubqueryColumnRef,
};
pub use push_down::lift_from_subquery;
pub(crate) use push_down::lift_or_fail;
pub use query_node::QueryNode;
pub use sql_types::{SqlType, TypeKind};
pub use table_ref::{BaseTable, JoinKind, JoinTable, QuerySourceId, TableRef};

#[cfg(test)]
mod tests;
