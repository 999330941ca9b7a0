//! Structural equality over the expression tree.
//!
//! Two expressions are structurally equal when their variant tags match and
//! all substructure is structurally equal. `Alias` wrappers are transparent:
//! only the aliased value takes part in the comparison, never the display
//! name, so `x AS a`, `x AS b` and `x` are all the same projection slot.
//!
//! [`structural_hash`] is consistent with [`structurally_equal`]: equal
//! expressions hash equally. Ordered children (operands, arguments, order
//! keys) are hashed in order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::expression::{Expression, Literal, OrderByItem};

pub fn structurally_equal(left: &Expression, right: &Expression) -> bool {
    let (left, right) = (left.unwrap_alias(), right.unwrap_alias());
    match (left, right) {
        (Expression::Column(a), Expression::Column(b)) => {
            a.table_alias == b.table_alias && a.name == b.name && a.ty == b.ty
        }
        (Expression::Star(a), Expression::Star(b)) => a.table_alias == b.table_alias,
        (Expression::SubqueryColumn(a), Expression::SubqueryColumn(b)) => {
            a.subquery_alias == b.subquery_alias && a.name == b.name && a.ty == b.ty
        }
        (Expression::Constant(a), Expression::Constant(b)) => {
            a.ty == b.ty && literals_equal(&a.value, &b.value)
        }
        (Expression::Parameter(a), Expression::Parameter(b)) => a.name == b.name && a.ty == b.ty,
        (Expression::RowNumber(a), Expression::RowNumber(b)) => {
            orderings_equal(&a.order_keys, &b.order_keys)
        }
        (Expression::Cast(a), Expression::Cast(b)) => {
            a.ty == b.ty && structurally_equal(&a.operand, &b.operand)
        }
        (Expression::Binary(a), Expression::Binary(b)) => {
            a.operator == b.operator
                && structurally_equal(&a.left, &b.left)
                && structurally_equal(&a.right, &b.right)
        }
        (Expression::Not(a), Expression::Not(b)) => structurally_equal(a, b),
        (Expression::Function(a), Expression::Function(b)) => {
            a.name == b.name
                && a.ty == b.ty
                && a.args.len() == b.args.len()
                && a.args.iter().zip(&b.args).all(|(x, y)| structurally_equal(x, y))
        }
        (Expression::Exists(a), Expression::Exists(b)) => a.query == b.query,
        _ => false,
    }
}

/// Pairwise structural equality of two ordering lists, direction included.
pub fn orderings_equal(left: &[OrderByItem], right: &[OrderByItem]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| a.order == b.order && structurally_equal(&a.expression, &b.expression))
}

fn literals_equal(left: &Literal, right: &Literal) -> bool {
    match (left, right) {
        // bitwise so that equality agrees with hashing
        (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
        (a, b) => a == b,
    }
}

pub fn structural_hash(expression: &Expression) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_into(expression, &mut hasher);
    hasher.finish()
}

fn hash_into<H: Hasher>(expression: &Expression, state: &mut H) {
    let expression = expression.unwrap_alias();
    std::mem::discriminant(expression).hash(state);
    match expression {
        Expression::Column(c) => {
            c.table_alias.hash(state);
            c.name.hash(state);
            c.ty.hash(state);
        }
        Expression::Alias(_) => {}
        Expression::Star(s) => s.table_alias.hash(state),
        Expression::SubqueryColumn(c) => {
            c.subquery_alias.hash(state);
            c.name.hash(state);
            c.ty.hash(state);
        }
        Expression::Constant(c) => {
            c.ty.hash(state);
            hash_literal(&c.value, state);
        }
        Expression::Parameter(p) => {
            p.name.hash(state);
            p.ty.hash(state);
        }
        Expression::RowNumber(r) => {
            r.order_keys.len().hash(state);
            for key in &r.order_keys {
                std::mem::discriminant(&key.order).hash(state);
                hash_into(&key.expression, state);
            }
        }
        Expression::Cast(c) => {
            c.ty.hash(state);
            hash_into(&c.operand, state);
        }
        Expression::Binary(b) => {
            std::mem::discriminant(&b.operator).hash(state);
            hash_into(&b.left, state);
            hash_into(&b.right, state);
        }
        Expression::Not(inner) => hash_into(inner, state),
        Expression::Function(f) => {
            f.name.hash(state);
            f.ty.hash(state);
            f.args.len().hash(state);
            for arg in &f.args {
                hash_into(arg, state);
            }
        }
        Expression::Exists(e) => e.query.alias().hash(state),
    }
}

fn hash_literal<H: Hasher>(literal: &Literal, state: &mut H) {
    std::mem::discriminant(literal).hash(state);
    match literal {
        Literal::Null => {}
        Literal::Boolean(b) => b.hash(state),
        Literal::Integer(i) => i.hash(state),
        Literal::Float(f) => f.to_bits().hash(state),
        Literal::String(s) => s.hash(state),
    }
}
