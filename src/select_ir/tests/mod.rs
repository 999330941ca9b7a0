mod binding_tests;

use super::{Expression, QueryNode, QuerySourceId, SqlType, TableRef};

pub(super) const CUSTOMERS: QuerySourceId = QuerySourceId(1);
pub(super) const ORDERS: QuerySourceId = QuerySourceId(2);

/// `SELECT ... FROM Customers AS c`
pub(super) fn customers() -> QueryNode {
    let mut query = QueryNode::new();
    query.add_table(TableRef::base("Customers", "c", Some(CUSTOMERS)));
    query
}

pub(super) fn customer_col(name: &str, ty: SqlType) -> Expression {
    Expression::column("c", Some(CUSTOMERS), name, ty)
}

pub(super) fn order_col(name: &str, ty: SqlType) -> Expression {
    Expression::column("o", Some(ORDERS), name, ty)
}
