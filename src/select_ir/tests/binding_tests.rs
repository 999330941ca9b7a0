//! Column and property binding against base, joined, nested and
//! star-projected tables.

use super::{customer_col, customers, order_col, CUSTOMERS, ORDERS};
use crate::config::IrConfig;
use crate::select_ir::{
    CompilationContext, Expression, InMemoryCatalog, IrError, JoinKind, QueryNode, QuerySourceId,
    SqlType, TableRef,
};

#[test]
fn test_bind_base_table_column() {
    let ctx = CompilationContext::new();
    let mut query = customers();

    let name = query
        .bind_column(&ctx, "Name", SqlType::text(), CUSTOMERS)
        .unwrap();

    assert_eq!(name, customer_col("Name", SqlType::text()));
    assert!(query.projection().is_empty());
}

#[test]
fn test_bind_join_target_column() {
    let ctx = CompilationContext::new();
    let mut query = customers();
    query.add_table(TableRef::join(
        JoinKind::Inner,
        TableRef::base("Orders", "o", Some(ORDERS)),
        Some(Expression::equal(
            order_col("CustomerId", SqlType::int32()),
            customer_col("Id", SqlType::int32()),
        )),
    ));

    let total = query
        .bind_column(&ctx, "Total", SqlType::int64(), ORDERS)
        .unwrap();
    assert_eq!(total, order_col("Total", SqlType::int64()));
}

#[test]
fn test_bind_returns_existing_projection_entry() {
    let ctx = CompilationContext::new();
    let mut query = customers();
    let aliased = Expression::alias("CustomerName", customer_col("Name", SqlType::text()));
    query.add_projection(aliased.clone(), false);

    let bound = query
        .bind_column(&ctx, "Name", SqlType::text(), CUSTOMERS)
        .unwrap();
    assert_eq!(bound, aliased);
}

#[test]
fn test_bind_unknown_query_source_fails() {
    let ctx = CompilationContext::new();
    let mut query = customers();
    assert_eq!(
        query.bind_column(&ctx, "Name", SqlType::text(), QuerySourceId(9)),
        Err(IrError::UnknownQuerySource(QuerySourceId(9)))
    );
}

#[test]
fn test_bind_empty_column_name_fails() {
    let ctx = CompilationContext::new();
    let mut query = customers();
    assert_eq!(
        query.bind_column(&ctx, "", SqlType::text(), CUSTOMERS),
        Err(IrError::EmptyIdentifier("column name"))
    );
}

#[test]
fn test_bind_through_nested_query_exposes_column() {
    let ctx = CompilationContext::new();
    let mut inner = QueryNode::with_alias("t");
    inner.add_table(TableRef::base("Customers", "c", Some(CUSTOMERS)));
    inner.add_projection(customer_col("Id", SqlType::int32()), false);

    let mut outer = QueryNode::new();
    outer.add_table(TableRef::nested(inner).unwrap());

    let name = outer
        .bind_column(&ctx, "Name", SqlType::text(), CUSTOMERS)
        .unwrap();

    assert_eq!(name, Expression::subquery_column("t", "Name", SqlType::text()));
    let inner = outer.tables()[0].nested_query().unwrap();
    assert_eq!(
        inner.projection(),
        &[customer_col("Id", SqlType::int32()), customer_col("Name", SqlType::text())]
    );
}

#[test]
fn test_bind_property_through_catalog() {
    let ctx = CompilationContext::new();
    let mut catalog = InMemoryCatalog::new();
    catalog.register(CUSTOMERS, "fullName", "full_name", SqlType::text());
    let mut query = customers();

    let bound = query
        .bind_property(&ctx, &catalog, "fullName", CUSTOMERS)
        .unwrap();
    assert_eq!(bound, customer_col("full_name", SqlType::text()));

    assert_eq!(
        query.bind_property(&ctx, &catalog, "age", CUSTOMERS),
        Err(IrError::UnmappedProperty {
            property: "age".to_string(),
            query_source: CUSTOMERS,
        })
    );
}

#[test]
fn test_star_bindings_are_memoized() {
    let ctx = CompilationContext::new();
    let mut query = customers();
    query.set_star_projected(true).unwrap();

    let first = query
        .bind_column(&ctx, "Name", SqlType::text(), CUSTOMERS)
        .unwrap();
    let second = query
        .bind_column(&ctx, "Name", SqlType::text(), CUSTOMERS)
        .unwrap();
    query
        .bind_column(&ctx, "Id", SqlType::int32(), CUSTOMERS)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(query.star_bindings().len(), 2);
    assert!(query.projection().is_empty());
}

#[test]
fn test_star_bindings_switch_to_hash_index() {
    let ctx = CompilationContext::with_config(IrConfig {
        star_index_threshold: 2,
        ..IrConfig::default()
    });
    let mut query = customers();
    query.set_star_projected(true).unwrap();

    for column in ["A", "B", "C"] {
        query
            .bind_column(&ctx, column, SqlType::int32(), CUSTOMERS)
            .unwrap();
    }
    assert!(query.star_bindings.is_indexed());

    let again = query
        .bind_column(&ctx, "B", SqlType::int32(), CUSTOMERS)
        .unwrap();
    assert_eq!(again, customer_col("B", SqlType::int32()));
    assert_eq!(query.star_bindings().len(), 3);
}

#[test]
fn test_star_table_must_be_resolvable() {
    let mut query = customers();
    query.add_table(TableRef::base("Orders", "o", Some(ORDERS)));

    assert_eq!(query.set_star_projected(true), Err(IrError::StarTableUnresolved(2)));
    assert_eq!(
        query.set_star_table("x"),
        Err(IrError::StarTableNotFound("x".to_string()))
    );

    query.set_star_table("o").unwrap();
    query.set_star_projected(true).unwrap();
    assert_eq!(query.star_table(), Some("o"));
}

#[test]
fn test_query_sources_follow_nesting() {
    let mut inner = QueryNode::with_alias("t");
    inner.add_table(TableRef::base("Customers", "c", Some(CUSTOMERS)));
    let mut outer = QueryNode::new();
    outer.add_table(TableRef::nested(inner).unwrap());
    outer.add_table(TableRef::base("Orders", "o", Some(ORDERS)));

    assert_eq!(outer.query_sources(), vec![CUSTOMERS, ORDERS]);
    assert!(outer.table_for_query_source(CUSTOMERS).unwrap().nested_query().is_some());
    assert_eq!(
        outer.table_for_query_source(QuerySourceId(5)),
        Err(IrError::UnknownQuerySource(QuerySourceId(5)))
    );
}
