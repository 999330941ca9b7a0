//! The IR is plain data: a finished tree survives a JSON round trip.

#[cfg(test)]
mod serialization_tests {
    use select_ir::{
        CompilationContext, Expression, OrderByOrder, QueryNode, QuerySourceId, SqlType, TableRef,
    };
    use serde_json::Value;

    fn pushed_down_query() -> QueryNode {
        let mut ctx = CompilationContext::new();
        let mut query = QueryNode::new();
        query.add_table(TableRef::base("Customers", "c", Some(QuerySourceId(1))));
        let name = query
            .bind_column(&ctx, "Name", SqlType::text(), QuerySourceId(1))
            .unwrap();
        query.add_projection(name.clone(), false);
        query.set_projection_for_member("Customer.Name", name.clone());
        query.add_ordering(name, OrderByOrder::Desc);
        query.set_limit(&mut ctx, Some(Expression::int(2))).unwrap();
        query.set_limit(&mut ctx, Some(Expression::int(1))).unwrap();
        query
    }

    #[test]
    fn test_query_round_trips_through_json() {
        let query = pushed_down_query();

        let json = serde_json::to_string(&query).unwrap();
        let restored: QueryNode = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, query);
        assert_eq!(restored.to_string(), query.to_string());
        assert_eq!(
            restored.projection_for_member("Customer.Name"),
            Some(&Expression::subquery_column("t", "Name", SqlType::text()))
        );
    }

    #[test]
    fn test_json_shape_names_nested_alias() {
        let value: Value = serde_json::to_value(pushed_down_query()).unwrap();

        assert_eq!(value["is_star_projected"], Value::Bool(true));
        assert_eq!(value["star_table"], Value::String("t".to_string()));
        assert_eq!(value["tables"][0]["Nested"]["alias"], Value::String("t".to_string()));
    }
}
