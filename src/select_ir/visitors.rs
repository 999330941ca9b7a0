//! Read-only traversal over a finished query tree.
//!
//! [`walk_query`] visits every expression slot of a [`QueryNode`] (projection,
//! join predicates, WHERE, ORDER BY, LIMIT, OFFSET) and descends into nested
//! queries, both those used as tables and those wrapped by `EXISTS`.
//! Visitors override only the hooks they care about.
//!
//! # Example
//!
//! ```ignore
//! struct ColumnCounter(usize);
//!
//! impl<'a> QueryVisitor<'a> for ColumnCounter {
//!     fn visit_expression(&mut self, expr: &'a Expression) {
//!         if let Expression::Column(_) = expr {
//!             self.0 += 1;
//!         }
//!     }
//! }
//! ```

use super::expression::Expression;
use super::query_node::QueryNode;
use super::table_ref::TableRef;

pub trait QueryVisitor<'a> {
    /// Called before any part of `query` is visited
    fn enter_query(&mut self, _query: &'a QueryNode) {}

    /// Called after every part of `query` has been visited
    fn leave_query(&mut self, _query: &'a QueryNode) {}

    /// Called for every expression node, parents before children
    fn visit_expression(&mut self, _expr: &'a Expression) {}

    /// Stop the walk early once the visitor has its answer
    fn is_done(&self) -> bool {
        false
    }
}

pub fn walk_query<'a, V: QueryVisitor<'a>>(query: &'a QueryNode, visitor: &mut V) {
    if visitor.is_done() {
        return;
    }
    visitor.enter_query(query);

    for expr in query.projection() {
        walk_expression(expr, visitor);
    }
    for table in query.tables() {
        walk_table(table, visitor);
    }
    if let Some(predicate) = query.predicate() {
        walk_expression(predicate, visitor);
    }
    for ordering in query.order_by() {
        walk_expression(&ordering.expression, visitor);
    }
    if let Some(limit) = query.limit() {
        walk_expression(limit, visitor);
    }
    if let Some(offset) = query.offset() {
        walk_expression(offset, visitor);
    }

    visitor.leave_query(query);
}

fn walk_table<'a, V: QueryVisitor<'a>>(table: &'a TableRef, visitor: &mut V) {
    match table {
        TableRef::Base(_) => {}
        TableRef::Join(join) => {
            walk_table(&join.target, visitor);
            if let Some(predicate) = &join.predicate {
                walk_expression(predicate, visitor);
            }
        }
        TableRef::Nested(query) => walk_query(query, visitor),
    }
}

pub fn walk_expression<'a, V: QueryVisitor<'a>>(expr: &'a Expression, visitor: &mut V) {
    if visitor.is_done() {
        return;
    }
    visitor.visit_expression(expr);

    if let Expression::Exists(exists) = expr {
        walk_query(&exists.query, visitor);
        return;
    }
    for child in expr.children() {
        walk_expression(child, visitor);
    }
}

/// Number of query nodes in a tree, the root included.
pub fn count_queries(query: &QueryNode) -> usize {
    struct Counter(usize);

    impl<'a> QueryVisitor<'a> for Counter {
        fn enter_query(&mut self, _query: &'a QueryNode) {
            self.0 += 1;
        }
    }

    let mut counter = Counter(0);
    walk_query(query, &mut counter);
    counter.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select_ir::sql_types::SqlType;
    use crate::select_ir::table_ref::QuerySourceId;

    struct ColumnCollector(Vec<String>);

    impl<'a> QueryVisitor<'a> for ColumnCollector {
        fn visit_expression(&mut self, expr: &'a Expression) {
            if let Expression::Column(c) = expr {
                self.0.push(format!("{}.{}", c.table_alias, c.name));
            }
        }
    }

    #[test]
    fn test_walk_descends_into_exists() {
        let mut inner = QueryNode::with_alias("e");
        inner.add_table(TableRef::base("Orders", "o", Some(QuerySourceId(2))));
        inner.add_predicate(Expression::equal(
            Expression::column("o", Some(QuerySourceId(2)), "CustomerId", SqlType::int32()),
            Expression::column("c", Some(QuerySourceId(1)), "Id", SqlType::int32()),
        ));

        let mut outer = QueryNode::new();
        outer.add_table(TableRef::base("Customers", "c", Some(QuerySourceId(1))));
        outer.add_predicate(Expression::exists(inner));

        let mut collector = ColumnCollector(vec![]);
        walk_query(&outer, &mut collector);
        assert_eq!(collector.0, vec!["o.CustomerId", "c.Id"]);
        assert_eq!(count_queries(&outer), 2);
    }
}
