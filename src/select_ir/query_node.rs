use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::catalog::PropertyCatalog;
use super::combinators::and_also;
use super::compilation_ctx::CompilationContext;
use super::errors::{IrError, IrResult};
use super::expression::{Expression, OrderByItem, OrderByOrder};
use super::push_down::lift_or_fail;
use super::sql_types::SqlType;
use super::structural_eq::{structural_hash, structurally_equal};
use super::table_ref::{QuerySourceId, TableRef};
use crate::utils::alias_naming::{names_collide, next_free_name};

/// Base name for generated projection aliases (`c`, `c0`, `c1`, ...)
pub(crate) const PROJECTION_ALIAS_BASE: &str = "c";

/// Memo of the concrete columns handed out while a node is star-projected.
///
/// Lookups scan the list by structural equality; once the list reaches the
/// configured threshold a structural-hash index is maintained as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StarBindings {
    entries: Vec<Expression>,
    #[serde(skip)]
    index: HashMap<u64, Vec<usize>>,
}

impl PartialEq for StarBindings {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl StarBindings {
    pub(crate) fn entries(&self) -> &[Expression] {
        &self.entries
    }

    fn find(&self, expression: &Expression) -> Option<usize> {
        if self.index.is_empty() {
            return self
                .entries
                .iter()
                .position(|e| structurally_equal(e, expression));
        }
        self.index
            .get(&structural_hash(expression))?
            .iter()
            .copied()
            .find(|&i| structurally_equal(&self.entries[i], expression))
    }

    fn get_or_add(&mut self, expression: Expression, threshold: usize) -> Expression {
        if let Some(index) = self.find(&expression) {
            log::trace!("Star binding reused: {}", expression);
            return self.entries[index].clone();
        }

        self.entries.push(expression.clone());
        if !self.index.is_empty() {
            self.index
                .entry(structural_hash(&expression))
                .or_default()
                .push(self.entries.len() - 1);
        } else if self.entries.len() >= threshold {
            self.rebuild_index();
        }
        expression
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index.entry(structural_hash(entry)).or_default().push(i);
        }
    }

    pub(crate) fn is_indexed(&self) -> bool {
        !self.index.is_empty()
    }
}

/// Mutable SELECT node.
///
/// Built incrementally by the compiler and handed to the SQL generator once
/// binding is complete. Nested nodes are owned by the [`TableRef::Nested`]
/// entry that wraps them; there are no back-references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    pub(super) tables: Vec<TableRef>,
    pub(super) projection: Vec<Expression>,
    pub(super) predicate: Option<Expression>,
    pub(super) order_by: Vec<OrderByItem>,
    pub(super) limit: Option<Expression>,
    pub(super) offset: Option<Expression>,
    pub(super) is_distinct: bool,
    /// Set iff this node is nested as a table of an outer node
    pub(super) alias: Option<String>,
    pub(super) is_star_projected: bool,
    pub(super) star_table: Option<String>,
    pub(super) star_bindings: StarBindings,
    /// Logical member → projection slot, re-pointed on push-down
    pub(super) member_projections: HashMap<String, Expression>,
}

impl QueryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::default()
        }
    }

    /// Empty node carrying a freshly allocated subquery alias.
    pub fn new_nested(ctx: &mut CompilationContext) -> IrResult<Self> {
        Ok(Self::with_alias(ctx.create_subquery_alias()?))
    }

    pub fn tables(&self) -> &[TableRef] {
        &self.tables
    }

    pub fn projection(&self) -> &[Expression] {
        &self.projection
    }

    pub fn predicate(&self) -> Option<&Expression> {
        self.predicate.as_ref()
    }

    pub fn order_by(&self) -> &[OrderByItem] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<&Expression> {
        self.limit.as_ref()
    }

    pub fn offset(&self) -> Option<&Expression> {
        self.offset.as_ref()
    }

    pub fn is_distinct(&self) -> bool {
        self.is_distinct
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn is_star_projected(&self) -> bool {
        self.is_star_projected
    }

    /// Columns bound through the star projection so far.
    pub fn star_bindings(&self) -> &[Expression] {
        self.star_bindings.entries()
    }

    pub(crate) fn tables_mut(&mut self) -> &mut Vec<TableRef> {
        &mut self.tables
    }

    /// Every expression slot owned directly by this node.
    pub(crate) fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        let mut slots: Vec<&mut Expression> = self.projection.iter_mut().collect();
        slots.extend(self.predicate.as_mut());
        slots.extend(self.order_by.iter_mut().map(|o| &mut o.expression));
        slots.extend(self.limit.as_mut());
        slots.extend(self.offset.as_mut());
        slots
    }

    // ---- tables -------------------------------------------------------

    /// Append a table. Duplicate sources are legal (self-joins).
    pub fn add_table(&mut self, table: TableRef) {
        self.tables.push(table);
    }

    /// Remove the first table addressed by `alias`.
    pub fn remove_table(&mut self, alias: &str) -> Option<TableRef> {
        let index = self.tables.iter().position(|t| t.alias() == Some(alias))?;
        if self.star_table.as_deref() == Some(alias) {
            self.star_table = None;
        }
        Some(self.tables.remove(index))
    }

    /// Table the wildcard resolves against: the explicit choice, or the sole
    /// table when there is exactly one.
    pub fn star_table(&self) -> Option<&str> {
        match &self.star_table {
            Some(alias) => Some(alias),
            None if self.tables.len() == 1 => self.tables[0].alias(),
            None => None,
        }
    }

    pub fn set_star_table(&mut self, alias: &str) -> IrResult<()> {
        if !self.tables.iter().any(|t| t.alias() == Some(alias)) {
            return Err(IrError::StarTableNotFound(alias.to_string()));
        }
        self.star_table = Some(alias.to_string());
        Ok(())
    }

    pub fn set_star_projected(&mut self, star: bool) -> IrResult<()> {
        if star && self.star_table().is_none() {
            return Err(IrError::StarTableUnresolved(self.tables.len()));
        }
        self.is_star_projected = star;
        Ok(())
    }

    /// Query sources satisfied by this node's tables and anything nested
    /// below them.
    pub fn query_sources(&self) -> Vec<QuerySourceId> {
        let mut sources: Vec<QuerySourceId> = Vec::new();
        for source in self.tables.iter().flat_map(TableRef::query_sources) {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        sources
    }

    pub fn handles_query_source(&self, query_source: QuerySourceId) -> bool {
        self.tables
            .iter()
            .any(|t| t.handles_query_source(query_source))
    }

    pub fn has_table_alias(&self, alias: &str) -> bool {
        self.tables.iter().any(|t| t.contains_alias(alias))
    }

    pub fn table_for_query_source(&self, query_source: QuerySourceId) -> IrResult<&TableRef> {
        self.tables
            .iter()
            .find(|t| t.handles_query_source(query_source))
            .ok_or(IrError::UnknownQuerySource(query_source))
    }

    /// The single nested query this node wraps after a push-down.
    pub(crate) fn nested_child_mut(&mut self) -> IrResult<&mut QueryNode> {
        let found = self.tables.len();
        match self.tables.as_mut_slice() {
            [TableRef::Nested(child)] => Ok(child.as_mut()),
            _ => Err(IrError::ExpectedNestedTable(format!("{} table(s)", found))),
        }
    }

    // ---- binding ------------------------------------------------------

    /// Bind a column of the table that satisfies `query_source`.
    ///
    /// Base tables yield a column reference; nested queries expose the
    /// column through their projection and yield a lifted reference. While
    /// star-projected, repeated requests return the memoized binding.
    pub fn bind_column(
        &mut self,
        ctx: &CompilationContext,
        column: &str,
        ty: SqlType,
        query_source: QuerySourceId,
    ) -> IrResult<Expression> {
        if column.is_empty() {
            return Err(IrError::EmptyIdentifier("column name"));
        }

        let index = self
            .tables
            .iter()
            .position(|t| t.handles_query_source(query_source))
            .ok_or(IrError::UnknownQuerySource(query_source))?;

        let bound = match self.tables[index].resolve_mut() {
            TableRef::Base(base) => {
                Expression::column(base.alias.clone(), base.query_source, column, ty)
            }
            TableRef::Nested(inner) => inner.bind_exposed_column(ctx, column, ty, query_source)?,
            TableRef::Join(_) => return Err(IrError::UnknownQuerySource(query_source)),
        };

        if self.is_star_projected {
            let threshold = ctx.config().star_index_threshold;
            return Ok(self.star_bindings.get_or_add(bound, threshold));
        }

        Ok(self
            .projection
            .iter()
            .find(|e| structurally_equal(e, &bound))
            .cloned()
            .unwrap_or(bound))
    }

    /// Resolve a logical property through the catalog and bind its column.
    pub fn bind_property(
        &mut self,
        ctx: &CompilationContext,
        catalog: &dyn PropertyCatalog,
        property: &str,
        query_source: QuerySourceId,
    ) -> IrResult<Expression> {
        let (column, ty) = catalog.column_for(property, query_source).ok_or_else(|| {
            IrError::UnmappedProperty {
                property: property.to_string(),
                query_source,
            }
        })?;
        self.bind_column(ctx, &column, ty, query_source)
    }

    /// Called on a nested node: bind the column, make sure this node's
    /// output carries it, and return the reference the outer scope uses.
    fn bind_exposed_column(
        &mut self,
        ctx: &CompilationContext,
        column: &str,
        ty: SqlType,
        query_source: QuerySourceId,
    ) -> IrResult<Expression> {
        let subquery_alias = self.alias.clone().ok_or(IrError::NestedQueryWithoutAlias)?;
        let inner = self.bind_column(ctx, column, ty, query_source)?;

        let exposed = if self.is_star_projected && self.star_covers(&inner) {
            inner
        } else {
            let index = self.add_projection(inner, false);
            self.projection[index].clone()
        };
        lift_or_fail(&exposed, &subquery_alias)
    }

    /// Whether the wildcard of this node already outputs `expression`.
    fn star_covers(&self, expression: &Expression) -> bool {
        let owner = match expression.unwrap_alias() {
            Expression::Column(c) => &c.table_alias,
            Expression::SubqueryColumn(c) => &c.subquery_alias,
            _ => return false,
        };
        self.star_table() == Some(owner.as_str())
    }

    // ---- projection ---------------------------------------------------

    /// Add `expression` to the projection and return its slot index.
    ///
    /// Structurally equal entries share one slot. A computed expression that
    /// is also an ORDER BY key gets an alias, and the ordering is re-pointed
    /// at it. In a nested node every slot is given a name unique within the
    /// projection (case-insensitive).
    ///
    /// `reset_star` turns off the wildcard even when `expression` already
    /// has a slot, so the caller's explicit projection becomes the whole
    /// output either way.
    pub fn add_projection(&mut self, expression: Expression, reset_star: bool) -> usize {
        let mut expression = strip_redundant_cast(expression);

        if reset_star {
            self.is_star_projected = false;
        }

        if let Some(index) = self.projection_index_of(&expression) {
            log::trace!("Projection dedup hit at slot {}: {}", index, expression);
            return index;
        }

        let ordering_index = if expression.unwrap_alias().is_column_reference() {
            None
        } else {
            self.order_by
                .iter()
                .position(|o| structurally_equal(&o.expression, &expression))
        };

        if ordering_index.is_some() && !matches!(expression, Expression::Alias(_)) {
            let alias = self.unique_projection_alias(PROJECTION_ALIAS_BASE);
            expression = Expression::alias(alias, expression);
        }

        if self.alias.is_some() {
            expression = self.disambiguate(expression);
        }

        if let Some(index) = ordering_index {
            self.order_by[index].expression = expression.clone();
        }

        self.projection.push(expression);
        self.projection.len() - 1
    }

    pub fn projection_index_of(&self, expression: &Expression) -> Option<usize> {
        self.projection
            .iter()
            .position(|e| structurally_equal(e, expression))
    }

    /// Replace the whole projection with one expression. A node that is
    /// already limited or distinct is pushed down first.
    pub fn set_single_projection(
        &mut self,
        ctx: &mut CompilationContext,
        expression: Expression,
    ) -> IrResult<usize> {
        if self.limit.is_some() || self.is_distinct {
            self.push_down_subquery(ctx)?;
        }
        self.projection.clear();
        Ok(self.add_projection(expression, true))
    }

    pub fn clear_projection(&mut self) {
        self.projection.clear();
    }

    /// Append without dedup; used when copying a projection verbatim.
    pub(super) fn append_projection_verbatim(&mut self, expression: Expression) -> usize {
        let expression = if self.alias.is_some() {
            self.disambiguate(expression)
        } else {
            expression
        };
        self.projection.push(expression);
        self.projection.len() - 1
    }

    /// Give `expression` a name that no other slot uses.
    fn disambiguate(&self, expression: Expression) -> Expression {
        if matches!(expression, Expression::Star(_)) {
            return expression;
        }

        let Some(name) = expression.projection_name().map(str::to_string) else {
            let alias = self.unique_projection_alias(PROJECTION_ALIAS_BASE);
            return Expression::alias(alias, expression);
        };

        let unique = self.unique_projection_alias(&name);
        if unique == name {
            return expression;
        }

        log::debug!(
            "QueryNode {}: projection '{}' renamed to '{}'",
            self.alias.as_deref().unwrap_or("<root>"),
            name,
            unique
        );
        Expression::alias(unique, expression)
    }

    fn unique_projection_alias(&self, base: &str) -> String {
        let (name, _) = next_free_name(base, 0, |candidate| {
            self.projection
                .iter()
                .filter_map(Expression::projection_name)
                .any(|existing| names_collide(existing, candidate))
        });
        name
    }

    // ---- member mapping -----------------------------------------------

    pub fn set_projection_for_member(&mut self, member: impl Into<String>, expression: Expression) {
        self.member_projections.insert(member.into(), expression);
    }

    pub fn projection_for_member(&self, member: &str) -> Option<&Expression> {
        self.member_projections.get(member)
    }

    // ---- predicate / ordering -----------------------------------------

    /// AND `predicate` onto the existing WHERE clause.
    pub fn add_predicate(&mut self, predicate: Expression) {
        self.predicate = Some(and_also(self.predicate.take(), predicate));
    }

    pub fn set_predicate(&mut self, predicate: Option<Expression>) {
        self.predicate = predicate;
    }

    pub fn add_ordering(&mut self, expression: Expression, order: OrderByOrder) -> OrderByItem {
        if let Some(existing) = self
            .order_by
            .iter()
            .find(|o| o.order == order && structurally_equal(&o.expression, &expression))
        {
            return existing.clone();
        }

        let item = OrderByItem::new(expression, order);
        self.order_by.push(item.clone());
        item
    }

    /// Put `orderings` ahead of the current ORDER BY. The previous entries
    /// are re-added after them, dropping any that became duplicates.
    pub fn prepend_orderings(&mut self, orderings: Vec<OrderByItem>) {
        let previous = std::mem::replace(&mut self.order_by, orderings);
        for item in previous {
            self.add_ordering(item.expression, item.order);
        }
    }

    pub fn clear_order_by(&mut self) {
        self.order_by.clear();
    }

    // ---- paging / distinct --------------------------------------------

    /// Set LIMIT. A second LIMIT never overwrites the first: the current
    /// state is pushed down and the new limit applies to its result.
    pub fn set_limit(&mut self, ctx: &mut CompilationContext, limit: Option<Expression>) -> IrResult<()> {
        if limit.is_some() && self.limit.is_some() {
            log::debug!("set_limit on an already limited node, pushing down");
            self.push_down_subquery(ctx)?;
        }
        self.limit = limit;
        Ok(())
    }

    /// Set OFFSET. Skipping after a LIMIT or a previous OFFSET is applied to
    /// a pushed-down copy of the current state.
    pub fn set_offset(&mut self, ctx: &mut CompilationContext, offset: Option<Expression>) -> IrResult<()> {
        if offset.is_some() && (self.limit.is_some() || self.offset.is_some()) {
            log::debug!("set_offset on an already paged node, pushing down");
            self.push_down_subquery(ctx)?;
        }
        self.offset = offset;
        Ok(())
    }

    pub fn set_distinct(&mut self, ctx: &mut CompilationContext, distinct: bool) -> IrResult<()> {
        if distinct && (self.limit.is_some() || self.offset.is_some()) {
            log::debug!("set_distinct on a paged node, pushing down");
            self.push_down_subquery(ctx)?;
        }
        self.is_distinct = distinct;
        Ok(())
    }

    /// True when emitting this node would return its single source as is.
    pub fn is_identity_query(&self) -> bool {
        !self.is_star_projected
            && !self.is_distinct
            && self.predicate.is_none()
            && self.limit.is_none()
            && self.offset.is_none()
            && self.order_by.is_empty()
            && self.projection.is_empty()
            && self.tables.len() == 1
    }
}

/// Drop a numeric cast whose target equals the operand's type once
/// nullability is ignored.
fn strip_redundant_cast(expression: Expression) -> Expression {
    match expression {
        Expression::Cast(cast)
            if cast.ty.is_numeric() && cast.ty.unwrap_nullable() == cast.operand.ty().unwrap_nullable() =>
        {
            strip_redundant_cast(*cast.operand)
        }
        other => other,
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.is_distinct {
            write!(f, "DISTINCT ")?;
        }

        let mut columns: Vec<String> = Vec::new();
        if self.is_star_projected {
            columns.push(match self.star_table() {
                Some(alias) => format!("{}.*", alias),
                None => "*".to_string(),
            });
        }
        columns.extend(self.projection.iter().map(|e| e.to_string()));
        if columns.is_empty() {
            columns.push("*".to_string());
        }
        write!(f, "{}", columns.join(", "))?;

        for (i, table) in self.tables.iter().enumerate() {
            match (i, table) {
                (0, _) => write!(f, " FROM {}", table)?,
                (_, TableRef::Join(_)) => write!(f, " {}", table)?,
                _ => write!(f, ", {}", table)?,
            }
        }
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {}", predicate)?;
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}
