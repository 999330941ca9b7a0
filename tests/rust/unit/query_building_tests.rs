//! End-to-end construction of paged queries the way a query compiler drives
//! the IR: bind properties, filter, order, page twice, then emulate OFFSET
//! for a dialect without it.

#[cfg(test)]
mod query_building_tests {
    use select_ir::dialect::{get_dialect, RowNumberPagingRewriter};
    use select_ir::select_ir::visitors::count_queries;
    use select_ir::{
        CompilationContext, Expression, OrderByOrder, QueryNode, QuerySourceId, SqlType, TableRef,
    };
    use select_ir::select_ir::InMemoryCatalog;

    const CUSTOMERS: QuerySourceId = QuerySourceId(1);

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .register(CUSTOMERS, "Id", "id", SqlType::int32())
            .register(CUSTOMERS, "Name", "name", SqlType::text());
        catalog
    }

    /// customers.Where(Name == @name).OrderBy(Name).Select(Id).Skip(10).Take(5).Take(3)
    fn build(ctx: &mut CompilationContext) -> QueryNode {
        let catalog = catalog();
        ctx.reserve_alias("c");

        let mut query = QueryNode::new();
        query.add_table(TableRef::base("Customers", "c", Some(CUSTOMERS)));

        let id = query.bind_property(ctx, &catalog, "Id", CUSTOMERS).unwrap();
        query.add_projection(id, false);

        let name = query.bind_property(ctx, &catalog, "Name", CUSTOMERS).unwrap();
        query.add_predicate(Expression::equal(
            name.clone(),
            Expression::parameter("name", SqlType::text()),
        ));
        query.add_ordering(name, OrderByOrder::Asc);

        query.set_offset(ctx, Some(Expression::int(10))).unwrap();
        query.set_limit(ctx, Some(Expression::int(5))).unwrap();
        query.set_limit(ctx, Some(Expression::int(3))).unwrap();
        query
    }

    #[test]
    fn test_second_take_wraps_the_paged_query() {
        super::super::init_logging();
        let mut ctx = CompilationContext::new();
        let query = build(&mut ctx);

        assert_eq!(
            query.to_string(),
            "SELECT t.* FROM (SELECT c.id, c.name FROM Customers AS c \
             WHERE (c.name = @name) ORDER BY c.name ASC LIMIT 5 OFFSET 10) AS t \
             ORDER BY t.name ASC LIMIT 3"
        );
        assert_eq!(count_queries(&query), 2);
        assert!(!query.is_correlated());
    }

    #[test]
    fn test_row_number_paging_rewrites_inner_offset() {
        super::super::init_logging();
        let mut ctx = CompilationContext::new();
        let mut query = build(&mut ctx);
        let dialect = get_dialect("legacy_row_number").unwrap();

        let rewritten = RowNumberPagingRewriter::new(dialect.as_ref())
            .rewrite(&mut query, &mut ctx)
            .unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(
            query.to_string(),
            "SELECT t.* FROM (SELECT t0.id, t0.name FROM \
             (SELECT c.id, c.name, ROW_NUMBER() OVER(ORDER BY c.name ASC) AS __RowNumber__ \
             FROM Customers AS c WHERE (c.name = @name)) AS t0 \
             WHERE ((t0.__RowNumber__ > 10) AND (t0.__RowNumber__ <= 15))) AS t \
             ORDER BY t.name ASC LIMIT 3"
        );
        assert_eq!(count_queries(&query), 3);
        assert!(!query.is_correlated());
    }

    #[test]
    fn test_standard_dialect_keeps_offset() {
        let mut ctx = CompilationContext::new();
        let mut query = build(&mut ctx);
        let before = query.clone();
        let dialect = get_dialect("standard").unwrap();

        let rewritten = RowNumberPagingRewriter::new(dialect.as_ref())
            .rewrite(&mut query, &mut ctx)
            .unwrap();

        assert_eq!(rewritten, 0);
        assert_eq!(query, before);
    }

    #[test]
    fn test_independent_compilations_do_not_share_aliases() {
        let mut first = CompilationContext::new();
        let mut second = CompilationContext::new();
        assert_eq!(first.create_subquery_alias().unwrap(), "t");
        assert_eq!(second.create_subquery_alias().unwrap(), "t");
        assert_eq!(first.create_subquery_alias().unwrap(), "t0");
    }
}
