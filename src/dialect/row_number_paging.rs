//! OFFSET emulation for engines without native offset paging.
//!
//! A paged node is pushed down, the child gets a `ROW_NUMBER()` column
//! ordered by the child's ORDER BY, and the parent's LIMIT/OFFSET turn into
//! range predicates on that column:
//!
//! ```text
//! SELECT o.Id FROM Orders AS o ORDER BY o.Id LIMIT 10 OFFSET 5
//! ```
//! becomes
//! ```text
//! SELECT t.Id
//! FROM (SELECT o.Id, ROW_NUMBER() OVER(ORDER BY o.Id ASC) AS __RowNumber__
//!       FROM Orders AS o) AS t
//! WHERE t.__RowNumber__ > 5 AND t.__RowNumber__ <= 15
//! ORDER BY t.Id ASC
//! ```
//!
//! A DISTINCT node gets one more level so the row number is computed over
//! the deduplicated rows.

use super::SqlDialect;
use crate::select_ir::combinators::and;
use crate::select_ir::{
    lift_or_fail, BinaryOperator, CompilationContext, Expression, IrError, IrResult, Literal,
    OrderByItem, QueryNode, TableRef,
};
use crate::utils::alias_naming::suffixed_name;

pub struct RowNumberPagingRewriter<'d> {
    dialect: &'d dyn SqlDialect,
    /// Row-number columns injected so far in this pass
    counter: usize,
}

impl<'d> RowNumberPagingRewriter<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self { dialect, counter: 0 }
    }

    /// Rewrite every paged node of the tree, innermost first. Returns the
    /// number of rewritten nodes.
    pub fn rewrite(&mut self, query: &mut QueryNode, ctx: &mut CompilationContext) -> IrResult<usize> {
        if self.dialect.supports_offset() {
            return Ok(0);
        }
        if !self.dialect.supports_window_functions() {
            log::warn!(
                "Dialect '{}' supports neither OFFSET nor ROW_NUMBER(), paging left as is",
                self.dialect.name()
            );
            return Ok(0);
        }
        self.visit_query(query, ctx)
    }

    fn visit_query(&mut self, query: &mut QueryNode, ctx: &mut CompilationContext) -> IrResult<usize> {
        let mut rewritten = 0;
        for table in query.tables_mut().iter_mut() {
            rewritten += self.visit_table(table, ctx)?;
        }
        for expression in query.expressions_mut() {
            rewritten += self.visit_expression(expression, ctx)?;
        }

        if needs_rewrite(query) {
            self.rewrite_node(query, ctx)?;
            rewritten += 1;
        }
        Ok(rewritten)
    }

    fn visit_table(&mut self, table: &mut TableRef, ctx: &mut CompilationContext) -> IrResult<usize> {
        match table {
            TableRef::Base(_) => Ok(0),
            TableRef::Join(join) => {
                let mut rewritten = self.visit_table(&mut join.target, ctx)?;
                if let Some(predicate) = join.predicate.as_mut() {
                    rewritten += self.visit_expression(predicate, ctx)?;
                }
                Ok(rewritten)
            }
            TableRef::Nested(query) => self.visit_query(query, ctx),
        }
    }

    fn visit_expression(&mut self, expression: &mut Expression, ctx: &mut CompilationContext) -> IrResult<usize> {
        if let Expression::Exists(exists) = expression {
            return self.visit_query(&mut exists.query, ctx);
        }
        let mut rewritten = 0;
        for child in expression.children_mut() {
            rewritten += self.visit_expression(child, ctx)?;
        }
        Ok(rewritten)
    }

    fn rewrite_node(&mut self, query: &mut QueryNode, ctx: &mut CompilationContext) -> IrResult<()> {
        let row_number_alias = self.next_row_number_alias(ctx);
        let visible_slots = query.projection().len();

        let child = query.push_down_subquery(ctx)?;
        let child_exposes_columns = visible_slots > 0 || !child.star_bindings().is_empty();

        // Fix the parent's output before the row number joins the child's.
        // Ordering-only slots the push-down added to the child stay hidden.
        if child_exposes_columns {
            query.explode_star_projection_limited(Some(visible_slots))?;
        }

        let child = query.nested_child_mut()?;
        if child.is_distinct() {
            isolate_distinct(child, ctx)?;
        }
        let child_alias = child
            .alias()
            .map(str::to_string)
            .ok_or(IrError::NestedQueryWithoutAlias)?;

        let mut order_keys: Vec<OrderByItem> = child
            .order_by()
            .iter()
            .map(|o| OrderByItem::new(o.expression.clone().into_unaliased(), o.order))
            .collect();
        if order_keys.is_empty() {
            // ROW_NUMBER() needs some ordering
            order_keys.push(OrderByItem::asc(Expression::int(1)));
        }
        child.clear_order_by();

        let slot = child.add_projection(
            Expression::alias(row_number_alias.clone(), Expression::row_number(order_keys)),
            false,
        );
        let row_number = lift_or_fail(&child.projection()[slot], &child_alias)?;

        let offset = child.offset().cloned();
        let limit = child.limit().cloned();
        child.set_offset(ctx, None)?;
        child.set_limit(ctx, None)?;

        let mut bounds = Vec::with_capacity(2);
        if let Some(offset) = offset {
            bounds.push(Expression::binary(
                BinaryOperator::GreaterThan,
                row_number.clone(),
                offset.clone(),
            ));
            if let Some(limit) = limit {
                bounds.push(Expression::binary(
                    BinaryOperator::LessThanOrEqual,
                    row_number,
                    upper_bound(offset, limit),
                ));
            }
        }
        if let Some(predicate) = and(bounds) {
            query.add_predicate(predicate);
        }

        if query.alias().is_some() {
            query.clear_order_by();
        }

        log::debug!(
            "Row-number paging: {} now filters on {}.{}",
            query.alias().unwrap_or("<root>"),
            child_alias,
            row_number_alias
        );
        Ok(())
    }

    /// `__RowNumber__` for the first injection of a pass, then
    /// `__RowNumber__1`, `__RowNumber__2`, ...
    fn next_row_number_alias(&mut self, ctx: &CompilationContext) -> String {
        let base = &ctx.config().row_number_column;
        let alias = if self.counter == 0 {
            base.clone()
        } else {
            suffixed_name(base, self.counter)
        };
        self.counter += 1;
        alias
    }
}

fn needs_rewrite(query: &QueryNode) -> bool {
    query.offset().is_some() && !query.projection().iter().any(Expression::is_row_number)
}

/// Move a DISTINCT paged node one level further down so the row number is
/// numbered over the deduplicated rows instead of taking part in DISTINCT.
/// Paging stays on `node`, which ends up projecting the DISTINCT query's
/// columns explicitly.
fn isolate_distinct(node: &mut QueryNode, ctx: &mut CompilationContext) -> IrResult<()> {
    let offset = node.offset().cloned();
    let limit = node.limit().cloned();
    node.set_offset(ctx, None)?;
    node.set_limit(ctx, None)?;

    node.push_down_subquery(ctx)?;
    node.explode_star_projection()?;

    node.set_offset(ctx, offset)?;
    node.set_limit(ctx, limit)?;
    Ok(())
}

/// `offset + limit`, folded when both are integer constants.
fn upper_bound(offset: Expression, limit: Expression) -> Expression {
    match (offset.as_integer(), limit.as_integer()) {
        (Some(o), Some(l)) => match o.checked_add(l) {
            Some(sum) => Expression::constant(Literal::Integer(sum), offset.ty()),
            None => Expression::binary(BinaryOperator::Add, offset, limit),
        },
        _ => Expression::binary(BinaryOperator::Add, offset, limit),
    }
}
