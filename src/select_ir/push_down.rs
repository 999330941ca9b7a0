//! Subquery push-down and star explosion.
//!
//! Push-down re-homes a node's complete state into a fresh nested node and
//! turns the original into a wildcard projector over it. Outstanding
//! references (orderings, member mappings) are lifted so that they address
//! the child's projection from the parent's scope.

use std::collections::HashMap;

use super::compilation_ctx::CompilationContext;
use super::errors::{IrError, IrResult};
use super::expression::{Expression, OrderByItem};
use super::query_node::QueryNode;
use super::table_ref::TableRef;

/// Re-express a projection entry of a nested query as seen from the
/// enclosing scope. Returns `None` for shapes that have no stable output
/// name (constants, computed expressions without an alias, wildcards).
pub fn lift_from_subquery(expression: &Expression, subquery_alias: &str) -> Option<Expression> {
    match expression {
        Expression::Column(c) => Some(Expression::subquery_column(subquery_alias, &c.name, c.ty)),
        Expression::Alias(a) => Some(Expression::subquery_column(
            subquery_alias,
            &a.alias,
            a.inner.ty(),
        )),
        Expression::SubqueryColumn(c) => {
            Some(Expression::subquery_column(subquery_alias, &c.name, c.ty))
        }
        _ => None,
    }
}

pub(crate) fn lift_or_fail(expression: &Expression, subquery_alias: &str) -> IrResult<Expression> {
    lift_from_subquery(expression, subquery_alias).ok_or_else(|| IrError::UnsupportedLiftShape {
        subquery: subquery_alias.to_string(),
        expression: expression.to_string(),
    })
}

impl QueryNode {
    /// Move this node's entire state into a new nested query and make this
    /// node a star projection over it. Returns the new child.
    ///
    /// The child keeps the original projection slot for slot (renamed where
    /// names collide, never reordered). Orderings of this node are lifted
    /// through the child's projection, adding a slot when none matches. The
    /// child drops its ORDER BY unless it is itself paged.
    ///
    /// All lifting happens before this node is modified, so an error leaves
    /// the node untouched.
    pub fn push_down_subquery(&mut self, ctx: &mut CompilationContext) -> IrResult<&mut QueryNode> {
        let subquery_alias = ctx.create_subquery_alias()?;
        let mut child = QueryNode::with_alias(subquery_alias.clone());

        for expression in &self.projection {
            child.append_projection_verbatim(expression.clone());
        }
        child.order_by = self.order_by.clone();
        child.is_star_projected = self.is_star_projected || self.projection.is_empty();

        let star_owner = self.star_table().map(str::to_string);

        let mut lifted_orderings = Vec::with_capacity(self.order_by.len());
        for ordering in &self.order_by {
            let exposed = expose_in_child(&mut child, &ordering.expression, star_owner.as_deref());
            lifted_orderings.push(OrderByItem::new(
                lift_or_fail(&exposed, &subquery_alias)?,
                ordering.order,
            ));
        }

        let mut lifted_members = HashMap::with_capacity(self.member_projections.len());
        for (member, expression) in &self.member_projections {
            let exposed = expose_in_child(&mut child, expression, star_owner.as_deref());
            lifted_members.insert(member.clone(), lift_or_fail(&exposed, &subquery_alias)?);
        }

        child.tables = std::mem::take(&mut self.tables);
        child.predicate = self.predicate.take();
        child.limit = self.limit.take();
        child.offset = self.offset.take();
        child.is_distinct = std::mem::replace(&mut self.is_distinct, false);
        child.star_table = self.star_table.take();
        child.star_bindings = std::mem::take(&mut self.star_bindings);
        if child.limit.is_none() && child.offset.is_none() {
            child.order_by.clear();
        }

        log::debug!(
            "push_down_subquery: {} -> nested '{}' ({} projection slot(s), {} ordering(s))",
            self.alias.as_deref().unwrap_or("<root>"),
            subquery_alias,
            child.projection.len(),
            lifted_orderings.len()
        );

        self.projection.clear();
        self.order_by = lifted_orderings;
        self.member_projections = lifted_members;
        self.is_star_projected = true;
        self.star_table = Some(subquery_alias);
        self.tables = vec![TableRef::Nested(Box::new(child))];

        self.nested_child_mut()
    }

    /// Replace the wildcard over a nested query with explicit lifted
    /// references to everything the nested query exposes.
    pub fn explode_star_projection(&mut self) -> IrResult<()> {
        self.explode_star_projection_limited(None)
    }

    /// Like [`explode_star_projection`](Self::explode_star_projection), but
    /// lifts only the first `child_slots` projection entries of the nested
    /// query. Slots the child gained for ordering keys during push-down sit
    /// after them and stay hidden. Both star memos are lifted in full.
    pub(crate) fn explode_star_projection_limited(&mut self, child_slots: Option<usize>) -> IrResult<()> {
        if !self.is_star_projected {
            return Ok(());
        }

        let exposed = match self.tables.as_slice() {
            [TableRef::Nested(child)] => {
                let subquery_alias = child.alias().ok_or(IrError::NestedQueryWithoutAlias)?;
                let mut lifted = Vec::new();
                let child_star: &[Expression] = if child.is_star_projected() {
                    child.star_bindings()
                } else {
                    &[]
                };
                let visible = child_slots.unwrap_or(usize::MAX);
                for expression in child.projection().iter().take(visible).chain(child_star) {
                    lifted.push(lift_or_fail(expression, subquery_alias)?);
                }
                lifted
            }
            _ => return Ok(()),
        };

        // Columns already handed out through this node's own wildcard are
        // lifted references into the child and stay valid as they are.
        let own_bindings: Vec<Expression> = self.star_bindings().to_vec();
        for expression in exposed.into_iter().chain(own_bindings) {
            self.add_projection(expression, false);
        }
        self.is_star_projected = false;

        log::debug!(
            "explode_star_projection: {} now projects {} column(s)",
            self.alias.as_deref().unwrap_or("<root>"),
            self.projection.len()
        );
        Ok(())
    }
}

/// Projection entry of `child` that outputs `expression`, adding one when
/// neither an existing slot nor the child's wildcard covers it.
fn expose_in_child(child: &mut QueryNode, expression: &Expression, star_owner: Option<&str>) -> Expression {
    if let Some(index) = child.projection_index_of(expression) {
        return child.projection[index].clone();
    }
    if child.is_star_projected && star_owner.is_some() && owner_of(expression) == star_owner {
        return expression.unwrap_alias().clone();
    }
    let index = child.add_projection(expression.clone(), false);
    child.projection[index].clone()
}

fn owner_of(expression: &Expression) -> Option<&str> {
    match expression.unwrap_alias() {
        Expression::Column(c) => Some(&c.table_alias),
        Expression::SubqueryColumn(c) => Some(&c.subquery_alias),
        _ => None,
    }
}
