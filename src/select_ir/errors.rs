use thiserror::Error;

use super::table_ref::QuerySourceId;

/// Contract violations raised by the IR.
///
/// None of these describe bad user data: each one means the calling compiler
/// asked for something the tree cannot represent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IrError {
    #[error("Alias prefix must not be empty.")]
    EmptyAliasPrefix,

    #[error("Required {0} must not be empty.")]
    EmptyIdentifier(&'static str),

    #[error("No table in the query satisfies query source {0}.")]
    UnknownQuerySource(QuerySourceId),

    #[error("Property '{property}' has no column mapping for query source {query_source}.")]
    UnmappedProperty {
        property: String,
        query_source: QuerySourceId,
    },

    #[error("Cannot lift expression out of subquery '{subquery}': {expression}")]
    UnsupportedLiftShape { subquery: String, expression: String },

    #[error("Nested query has no alias.")]
    NestedQueryWithoutAlias,

    #[error("Star projection needs exactly one table to resolve against, found {0}.")]
    StarTableUnresolved(usize),

    #[error("Star table '{0}' is not part of the query.")]
    StarTableNotFound(String),

    #[error("Expected a single nested table but found {0}.")]
    ExpectedNestedTable(String),
}

pub type IrResult<T> = Result<T, IrError>;
