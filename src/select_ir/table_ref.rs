use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{IrError, IrResult};
use super::expression::Expression;
use super::query_node::QueryNode;

/// Logical identifier of one data source of the object-graph query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuerySourceId(pub u32);

impl fmt::Display for QuerySourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    Cross,
    CrossLateral,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::CrossLateral => "CROSS JOIN LATERAL",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BaseTable {
    pub name: String,
    pub schema: Option<String>,
    pub alias: String,
    pub query_source: Option<QuerySourceId>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct JoinTable {
    pub kind: JoinKind,
    pub target: Box<TableRef>,
    /// ON condition; always `None` for cross joins
    pub predicate: Option<Expression>,
}

/// One entry of a query's FROM/JOIN list.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum TableRef {
    Base(BaseTable),
    Join(JoinTable),
    /// Derived table; the nested query is owned exclusively by this entry
    Nested(Box<QueryNode>),
}

impl TableRef {
    pub fn base(
        name: impl Into<String>,
        alias: impl Into<String>,
        query_source: Option<QuerySourceId>,
    ) -> Self {
        TableRef::Base(BaseTable {
            name: name.into(),
            schema: None,
            alias: alias.into(),
            query_source,
        })
    }

    pub fn join(kind: JoinKind, target: TableRef, predicate: Option<Expression>) -> Self {
        let predicate = match kind {
            JoinKind::Cross | JoinKind::CrossLateral => None,
            JoinKind::Inner | JoinKind::LeftOuter => predicate,
        };
        TableRef::Join(JoinTable {
            kind,
            target: Box::new(target),
            predicate,
        })
    }

    /// Wrap a query as a derived table. The query must already carry the
    /// alias the outer scope will address it by.
    pub fn nested(query: QueryNode) -> IrResult<Self> {
        if query.alias().is_none() {
            return Err(IrError::NestedQueryWithoutAlias);
        }
        Ok(TableRef::Nested(Box::new(query)))
    }

    /// Alias the enclosing scope uses for this table. Joins report their
    /// target's alias.
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableRef::Base(b) => Some(&b.alias),
            TableRef::Join(j) => j.target.alias(),
            TableRef::Nested(q) => q.alias(),
        }
    }

    /// Follow join wrappers down to the table that actually produces rows.
    pub fn resolve(&self) -> &TableRef {
        match self {
            TableRef::Join(j) => j.target.resolve(),
            other => other,
        }
    }

    pub fn resolve_mut(&mut self) -> &mut TableRef {
        match self {
            TableRef::Join(j) => j.target.resolve_mut(),
            other => other,
        }
    }

    pub fn nested_query(&self) -> Option<&QueryNode> {
        match self.resolve() {
            TableRef::Nested(q) => Some(q),
            _ => None,
        }
    }

    /// Every query source this table satisfies, following joins and nested
    /// queries.
    pub fn query_sources(&self) -> Vec<QuerySourceId> {
        match self {
            TableRef::Base(b) => b.query_source.into_iter().collect(),
            TableRef::Join(j) => j.target.query_sources(),
            TableRef::Nested(q) => q.query_sources(),
        }
    }

    pub fn handles_query_source(&self, query_source: QuerySourceId) -> bool {
        match self {
            TableRef::Base(b) => b.query_source == Some(query_source),
            TableRef::Join(j) => j.target.handles_query_source(query_source),
            TableRef::Nested(q) => q.handles_query_source(query_source),
        }
    }

    /// True if `alias` names this table, a join target, or a table inside a
    /// nested query.
    pub fn contains_alias(&self, alias: &str) -> bool {
        if self.alias() == Some(alias) {
            return true;
        }
        match self.resolve() {
            TableRef::Nested(q) => q.tables().iter().any(|t| t.contains_alias(alias)),
            _ => false,
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Base(b) => match &b.schema {
                Some(schema) => write!(f, "{}.{} AS {}", schema, b.name, b.alias),
                None => write!(f, "{} AS {}", b.name, b.alias),
            },
            TableRef::Join(j) => {
                write!(f, "{} {}", j.kind.keyword(), j.target)?;
                if let Some(predicate) = &j.predicate {
                    write!(f, " ON {}", predicate)?;
                }
                Ok(())
            }
            TableRef::Nested(q) => write!(f, "({}) AS {}", q, q.alias().unwrap_or("?")),
        }
    }
}
