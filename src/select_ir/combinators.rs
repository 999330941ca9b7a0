//! Predicate Combinators for Expression
//!
//! Helpers for combining predicates with AND. `QueryNode` uses [`and_also`]
//! for every `add_predicate` call, the paging rewriter uses [`and`] to build
//! its row-number bounds.
//!
//! # Example
//! ```
//! use select_ir::select_ir::combinators::and;
//! use select_ir::Expression;
//!
//! let combined = and(vec![Expression::int(1), Expression::int(2)]);
//! assert!(combined.is_some());
//! ```

use super::expression::Expression;

/// Combine predicates with AND operator.
///
/// - Empty vec → None
/// - Single predicate → Some(predicate)
/// - Multiple → Some(((pred1 AND pred2) AND pred3) ...)
pub fn and(predicates: Vec<Expression>) -> Option<Expression> {
    predicates.into_iter().reduce(Expression::and)
}

/// AND `next` onto an optional existing predicate.
pub fn and_also(existing: Option<Expression>, next: Expression) -> Expression {
    match existing {
        Some(current) => Expression::and(current, next),
        None => next,
    }
}
