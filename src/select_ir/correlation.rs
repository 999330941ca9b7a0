use super::expression::Expression;
use super::query_node::QueryNode;
use super::visitors::{walk_query, QueryVisitor};

/// Walks a tree keeping the chain of enclosing query nodes. A reference is
/// resolved when any node on the chain owns its table; the first reference
/// that no node on the chain owns marks the tree as correlated.
struct CorrelationFinder<'a> {
    scopes: Vec<&'a QueryNode>,
    outer_reference: Option<String>,
}

impl<'a> CorrelationFinder<'a> {
    fn resolves(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Column(c) => self.scopes.iter().any(|scope| match c.query_source {
                Some(qs) => scope.handles_query_source(qs) || scope.has_table_alias(&c.table_alias),
                None => scope.has_table_alias(&c.table_alias),
            }),
            Expression::SubqueryColumn(c) => self
                .scopes
                .iter()
                .any(|scope| scope.has_table_alias(&c.subquery_alias)),
            Expression::Star(s) => self
                .scopes
                .iter()
                .any(|scope| scope.has_table_alias(&s.table_alias)),
            _ => true,
        }
    }
}

impl<'a> QueryVisitor<'a> for CorrelationFinder<'a> {
    fn enter_query(&mut self, query: &'a QueryNode) {
        self.scopes.push(query);
    }

    fn leave_query(&mut self, _query: &'a QueryNode) {
        self.scopes.pop();
    }

    fn visit_expression(&mut self, expr: &'a Expression) {
        if !self.resolves(expr) {
            self.outer_reference = Some(expr.to_string());
        }
    }

    fn is_done(&self) -> bool {
        self.outer_reference.is_some()
    }
}

impl QueryNode {
    /// True if anything in this tree refers to a table that neither this
    /// node nor any node between it and the reference provides.
    pub fn is_correlated(&self) -> bool {
        let mut finder = CorrelationFinder {
            scopes: Vec::new(),
            outer_reference: None,
        };
        walk_query(self, &mut finder);

        if let Some(reference) = &finder.outer_reference {
            log::trace!(
                "Query {} is correlated through {}",
                self.alias().unwrap_or("<root>"),
                reference
            );
        }
        finder.outer_reference.is_some()
    }
}
