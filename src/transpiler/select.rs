//! Query-tree to SELECT assembly.
//!
//! `build` walks the query tree bottom-up, accumulating clauses into a
//! [`Sel`] without rendering anything. Clause expressions stay paired
//! with the scope they were bound in. `assemble` then emits the final
//! text in clause order, which keeps positional parameters aligned with
//! their placeholders for `?`-style dialects.
//!
//! A binder names its source: filtering `users` as `u` produces
//! `FROM users u WHERE u.age > $1`. When a step cannot be folded into
//! the current statement (a projection already applied, a LIMIT already
//! present, a DISTINCT in the way) the statement so far becomes an
//! aliased derived table and accumulation restarts on top of it.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{AggKind, Expr, Ident, IrType, JoinKind, Query, SortOrder, ValueKind};
use crate::error::{ForgeError, ForgeResult};
use crate::transpiler::expr::{
    precedence_of, render_expr, AliasTarget, ParamRef, RenderContext, Scope,
};
use crate::transpiler::traits::SqlGenerator;

/// A rendered statement with its positional parameter slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<ParamRef>,
}

/// An expression together with the scope it must be rendered in.
#[derive(Debug, Clone)]
struct Bound {
    scope: Scope,
    expr: Expr,
}

impl Bound {
    fn new(scope: Scope, expr: Expr) -> Self {
        Bound { scope, expr }
    }
}

#[derive(Debug, Clone)]
enum Projection {
    /// `*`, or `alias.*` once the source is aliased.
    Star,
    /// Named output columns, `expr AS "name"` each.
    Columns(Vec<(Bound, String)>),
    /// A single scalar output, exposed as `value` when nested.
    Scalar(Bound),
    /// An aggregate over the source rows. `None` operand means `COUNT(*)`.
    Aggregate(AggKind, Option<Bound>),
}

#[derive(Debug, Clone)]
enum FromItem {
    Table {
        name: String,
        alias: Option<String>,
    },
    Derived {
        inner: Box<Built>,
        scalar: bool,
        alias: String,
    },
    Join {
        kind: JoinKind,
        item: Box<FromItem>,
        on: Bound,
    },
}

/// What a binder placed on top of the current statement resolves to.
#[derive(Debug, Clone)]
enum BindTarget {
    /// The primary FROM item has not been claimed by a binder yet; the
    /// first binder's name becomes its alias.
    Fresh,
    Fixed(AliasTarget),
}

/// One SELECT statement under accumulation.
#[derive(Debug, Clone)]
struct Sel {
    distinct: bool,
    projection: Projection,
    from: Vec<FromItem>,
    filters: Vec<Bound>,
    order_by: Vec<(Bound, SortOrder)>,
    limit: Option<Bound>,
    offset: Option<Bound>,
    binding: BindTarget,
}

impl Sel {
    fn over_table(name: &str) -> Self {
        Sel {
            distinct: false,
            projection: Projection::Star,
            from: vec![FromItem::Table {
                name: name.to_string(),
                alias: None,
            }],
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            binding: BindTarget::Fresh,
        }
    }

    fn has_projection(&self) -> bool {
        !matches!(self.projection, Projection::Star)
    }

    fn has_row_bounds(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

#[derive(Debug, Clone)]
enum Built {
    Select(Sel),
    Union {
        left: Box<Built>,
        right: Box<Built>,
        all: bool,
    },
}

impl Built {
    /// Whether this statement's output is a single scalar column.
    fn is_scalar(&self) -> bool {
        match self {
            Built::Select(sel) => match &sel.projection {
                Projection::Scalar(_) | Projection::Aggregate(..) => true,
                Projection::Columns(_) => false,
                Projection::Star => matches!(
                    sel.binding,
                    BindTarget::Fixed(AliasTarget::Scalar(_))
                ),
            },
            Built::Union { left, .. } => left.is_scalar(),
        }
    }
}

pub struct QueryRenderer<'a> {
    ctx: RenderContext<'a>,
    used_names: BTreeSet<String>,
    alias_counter: usize,
}

impl<'a> QueryRenderer<'a> {
    pub fn new(sql_gen: &'a dyn SqlGenerator, query: &Query) -> Self {
        let mut used_names = BTreeSet::new();
        collect_binders(query, &mut used_names);
        QueryRenderer {
            ctx: RenderContext::new(sql_gen),
            used_names,
            alias_counter: 0,
        }
    }

    pub fn render(mut self, query: &Query) -> ForgeResult<Rendered> {
        let built = self.build(query, &Scope::new())?;
        let sql = self.assemble(&built, false)?;
        Ok(Rendered {
            sql,
            params: self.ctx.params,
        })
    }

    fn fresh_alias(&mut self) -> String {
        loop {
            let candidate = format!("t{}", self.alias_counter);
            self.alias_counter += 1;
            if !self.used_names.contains(&candidate) {
                return candidate;
            }
        }
    }

    // ---- tree -> Sel ----

    fn build(&mut self, query: &Query, outer: &Scope) -> ForgeResult<Built> {
        match query {
            Query::Entity { name, .. } => Ok(Built::Select(Sel::over_table(name))),
            Query::Filter {
                source,
                ident,
                predicate,
            } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.has_projection() || sel.has_row_bounds() || sel.distinct
                })?;
                let target = self.bind(&mut sel, ident)?;
                let scope = outer.clone().with(&ident.name, target);
                sel.filters.push(Bound::new(scope, predicate.clone()));
                Ok(Built::Select(sel))
            }
            Query::Map {
                source,
                ident,
                body,
            } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.has_projection() || sel.distinct
                })?;
                let target = self.bind(&mut sel, ident)?;
                let scope = outer.clone().with(&ident.name, target);
                sel.projection = projection_for(scope, body, &ident.name);
                Ok(Built::Select(sel))
            }
            Query::FlatMap {
                source,
                ident,
                body,
            } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.has_projection() || sel.has_row_bounds() || sel.distinct
                })?;
                let target = self.bind(&mut sel, ident)?;
                let inner_scope = outer.clone().with(&ident.name, target);
                let body_built = self.build(body, &inner_scope)?;
                let mut body_sel = match body_built {
                    Built::Select(s) => s,
                    Built::Union { .. } => {
                        return Err(ForgeError::InvariantViolation(
                            "correlated sub-query with a set operation cannot be flattened"
                                .to_string(),
                        ));
                    }
                };
                // A binder over the flattened result refers to the body's
                // rows, not the outer source's; pin the body's table down
                // before the FROM lists merge.
                if matches!(body_sel.binding, BindTarget::Fresh) {
                    if let Some(FromItem::Table { name, alias }) = body_sel.from.first() {
                        let a = alias.clone().unwrap_or_else(|| name.clone());
                        body_sel.binding = BindTarget::Fixed(AliasTarget::Row(a));
                    }
                }
                if body_sel.distinct || body_sel.has_row_bounds() || !body_sel.order_by.is_empty()
                {
                    return Err(ForgeError::InvariantViolation(
                        "correlated sub-query too complex to flatten into one statement"
                            .to_string(),
                    ));
                }
                sel.from.extend(body_sel.from);
                sel.filters.extend(body_sel.filters);
                sel.projection = body_sel.projection;
                sel.binding = body_sel.binding;
                Ok(Built::Select(sel))
            }
            Query::Join {
                kind,
                left,
                right,
                left_ident,
                right_ident,
                on,
            } => {
                let left_built = self.build(left, outer)?;
                let right_built = self.build(right, outer)?;
                let (left_item, left_target) = self.as_from_item(left_built, &left_ident.name)?;
                let (right_item, right_target) = self.as_from_item(right_built, &right_ident.name)?;

                let on_scope = outer
                    .clone()
                    .with(&left_ident.name, left_target)
                    .with(&right_ident.name, right_target);

                let mut sides = BTreeMap::new();
                sides.insert(left_ident.name.clone(), alias_of(&left_item));
                sides.insert(right_ident.name.clone(), alias_of(&right_item));

                let sel = Sel {
                    distinct: false,
                    projection: Projection::Star,
                    from: vec![
                        left_item,
                        FromItem::Join {
                            kind: *kind,
                            item: Box::new(right_item),
                            on: Bound::new(on_scope, on.clone()),
                        },
                    ],
                    filters: Vec::new(),
                    order_by: Vec::new(),
                    limit: None,
                    offset: None,
                    binding: BindTarget::Fixed(AliasTarget::Pair(sides)),
                };
                Ok(Built::Select(sel))
            }
            Query::Aggregation { source, op } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.distinct || sel.has_row_bounds()
                })?;
                let operand = match (*op, &sel.projection) {
                    (AggKind::Count, _) => None,
                    (_, Projection::Scalar(bound)) => Some(bound.clone()),
                    (_, Projection::Star) => Some(self.scalar_operand(&sel)?),
                    (_, Projection::Columns(_) | Projection::Aggregate(..)) => {
                        return Err(ForgeError::InvariantViolation(format!(
                            "{} aggregation over non-scalar rows",
                            op
                        )));
                    }
                };
                sel.projection = Projection::Aggregate(*op, operand);
                Ok(Built::Select(sel))
            }
            Query::SortBy {
                source,
                ident,
                key,
                order,
            } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.has_projection() || sel.has_row_bounds()
                })?;
                let target = self.bind(&mut sel, ident)?;
                let scope = outer.clone().with(&ident.name, target);
                // A sort applied later is the dominant key.
                sel.order_by.insert(0, (Bound::new(scope, key.clone()), *order));
                Ok(Built::Select(sel))
            }
            Query::Take { source, count } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| sel.limit.is_some())?;
                sel.limit = Some(Bound::new(outer.clone(), count.clone()));
                Ok(Built::Select(sel))
            }
            Query::Drop { source, count } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| {
                    sel.offset.is_some() || sel.limit.is_some()
                })?;
                sel.offset = Some(Bound::new(outer.clone(), count.clone()));
                Ok(Built::Select(sel))
            }
            Query::Distinct { source } => {
                let built = self.build(source, outer)?;
                let mut sel = self.as_accumulable(built, |sel| sel.has_row_bounds())?;
                sel.distinct = true;
                Ok(Built::Select(sel))
            }
            Query::Union { left, right } => Ok(Built::Union {
                left: Box::new(self.build(left, outer)?),
                right: Box::new(self.build(right, outer)?),
                all: false,
            }),
            Query::UnionAll { left, right } => Ok(Built::Union {
                left: Box::new(self.build(left, outer)?),
                right: Box::new(self.build(right, outer)?),
                all: true,
            }),
            Query::Nested { source } => {
                let built = self.build(source, outer)?;
                Ok(Built::Select(self.nest(built)))
            }
        }
    }

    /// Coerce into a [`Sel`] that can keep accumulating clauses, nesting
    /// the statement so far when `blocked` says the next clause would
    /// change its meaning.
    fn as_accumulable(
        &mut self,
        built: Built,
        blocked: impl Fn(&Sel) -> bool,
    ) -> ForgeResult<Sel> {
        match built {
            Built::Select(sel) if !blocked(&sel) => Ok(sel),
            other => Ok(self.nest(other)),
        }
    }

    /// Wrap a statement into an aliased derived table and restart
    /// accumulation on top of it.
    fn nest(&mut self, built: Built) -> Sel {
        let scalar = built.is_scalar();
        let alias = self.fresh_alias();
        let target = if scalar {
            AliasTarget::Scalar(alias.clone())
        } else {
            AliasTarget::Row(alias.clone())
        };
        Sel {
            distinct: false,
            projection: Projection::Star,
            from: vec![FromItem::Derived {
                inner: Box::new(built),
                scalar,
                alias,
            }],
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            binding: BindTarget::Fixed(target),
        }
    }

    /// Resolve what a binder over this statement refers to; the first
    /// binder on a fresh table becomes its alias.
    fn bind(&mut self, sel: &mut Sel, ident: &Ident) -> ForgeResult<AliasTarget> {
        match &sel.binding {
            BindTarget::Fixed(target) => Ok(target.clone()),
            BindTarget::Fresh => {
                let alias = match sel.from.first_mut() {
                    Some(FromItem::Table { alias, .. }) => {
                        if alias.is_none() {
                            *alias = Some(ident.name.clone());
                        }
                        alias.clone().unwrap_or_else(|| ident.name.clone())
                    }
                    _ => {
                        return Err(ForgeError::InvariantViolation(
                            "binder over a statement without a primary source".to_string(),
                        ));
                    }
                };
                let target = AliasTarget::Row(alias);
                sel.binding = BindTarget::Fixed(target.clone());
                Ok(target)
            }
        }
    }

    /// Turn a join side into a single FROM item aliased by its binder.
    fn as_from_item(
        &mut self,
        built: Built,
        binder: &str,
    ) -> ForgeResult<(FromItem, AliasTarget)> {
        match built {
            Built::Select(sel) if is_plain_table(&sel) => {
                let name = match &sel.from[0] {
                    FromItem::Table { name, .. } => name.clone(),
                    _ => unreachable!(),
                };
                Ok((
                    FromItem::Table {
                        name,
                        alias: Some(binder.to_string()),
                    },
                    AliasTarget::Row(binder.to_string()),
                ))
            }
            other => {
                let scalar = other.is_scalar();
                let target = if scalar {
                    AliasTarget::Scalar(binder.to_string())
                } else {
                    AliasTarget::Row(binder.to_string())
                };
                Ok((
                    FromItem::Derived {
                        inner: Box::new(other),
                        scalar,
                        alias: binder.to_string(),
                    },
                    target,
                ))
            }
        }
    }

    /// Column reference for aggregating a statement whose rows are
    /// already a single scalar column.
    fn scalar_operand(&self, sel: &Sel) -> ForgeResult<Bound> {
        match &sel.binding {
            BindTarget::Fixed(AliasTarget::Scalar(alias)) => {
                let scope = Scope::new().with(
                    "#agg",
                    AliasTarget::Scalar(alias.clone()),
                );
                Ok(Bound::new(
                    scope,
                    Expr::ident("#agg", IrType::Value(ValueKind::Int)),
                ))
            }
            _ => Err(ForgeError::InvariantViolation(
                "aggregation over non-scalar rows".to_string(),
            )),
        }
    }

    // ---- Sel -> text ----

    fn assemble(&mut self, built: &Built, alias_scalar: bool) -> ForgeResult<String> {
        match built {
            Built::Union { left, right, all } => {
                let left_sql = self.assemble_union_side(left, alias_scalar)?;
                let right_sql = self.assemble_union_side(right, alias_scalar)?;
                let keyword = if *all { "UNION ALL" } else { "UNION" };
                Ok(format!("{} {} {}", left_sql, keyword, right_sql))
            }
            Built::Select(sel) => self.assemble_select(sel, alias_scalar),
        }
    }

    fn assemble_union_side(&mut self, built: &Built, alias_scalar: bool) -> ForgeResult<String> {
        let needs_parens = match built {
            Built::Select(sel) => !sel.order_by.is_empty() || sel.has_row_bounds(),
            Built::Union { .. } => false,
        };
        let sql = self.assemble(built, alias_scalar)?;
        if needs_parens {
            Ok(format!("({})", sql))
        } else {
            Ok(sql)
        }
    }

    fn assemble_select(&mut self, sel: &Sel, alias_scalar: bool) -> ForgeResult<String> {
        let mut sql = String::from("SELECT ");
        if sel.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.projection_sql(sel, alias_scalar)?);

        sql.push_str(" FROM ");
        for (i, item) in sel.from.iter().enumerate() {
            match item {
                FromItem::Join { kind, item, on } => {
                    let item_sql = self.from_item_sql(item)?;
                    let on_sql = render_expr(&on.expr, &on.scope, &mut self.ctx)?;
                    sql.push_str(&format!(" {} {} ON {}", kind.sql_keyword(), item_sql, on_sql));
                }
                plain => {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push_str(&self.from_item_sql(plain)?);
                }
            }
        }

        if !sel.filters.is_empty() {
            let mut rendered = Vec::with_capacity(sel.filters.len());
            for bound in &sel.filters {
                let pred = render_expr(&bound.expr, &bound.scope, &mut self.ctx)?;
                // An OR at the top of a conjunct must keep its grouping.
                if sel.filters.len() > 1 && precedence_of(&bound.expr) < 2 {
                    rendered.push(format!("({})", pred));
                } else {
                    rendered.push(pred);
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.join(" AND "));
        }

        if !sel.order_by.is_empty() {
            let mut keys = Vec::with_capacity(sel.order_by.len());
            for (bound, order) in &sel.order_by {
                let key = render_expr(&bound.expr, &bound.scope, &mut self.ctx)?;
                keys.push(format!("{} {}", key, order.sql_keyword()));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        let limit = match &sel.limit {
            Some(bound) => Some(render_expr(&bound.expr, &bound.scope, &mut self.ctx)?),
            None => None,
        };
        let offset = match &sel.offset {
            Some(bound) => Some(render_expr(&bound.expr, &bound.scope, &mut self.ctx)?),
            None => None,
        };
        sql.push_str(&self.ctx.sql_gen.limit_offset(limit.as_deref(), offset.as_deref()));

        Ok(sql)
    }

    fn projection_sql(&mut self, sel: &Sel, alias_scalar: bool) -> ForgeResult<String> {
        match &sel.projection {
            Projection::Star => match &sel.binding {
                // Once a binder named the source, star-select its rows
                // rather than the whole FROM list.
                BindTarget::Fixed(AliasTarget::Row(alias))
                | BindTarget::Fixed(AliasTarget::Scalar(alias)) => {
                    Ok(format!("{}.*", self.ctx.sql_gen.quote_identifier(alias)))
                }
                _ => Ok("*".to_string()),
            },
            Projection::Columns(columns) => {
                let mut parts = Vec::with_capacity(columns.len());
                for (bound, name) in columns {
                    let value = render_expr(&bound.expr, &bound.scope, &mut self.ctx)?;
                    parts.push(format!(
                        "{} AS {}",
                        value,
                        self.ctx.sql_gen.quote_identifier(name)
                    ));
                }
                Ok(parts.join(", "))
            }
            Projection::Scalar(bound) => {
                let value = render_expr(&bound.expr, &bound.scope, &mut self.ctx)?;
                Ok(self.scalar_select(value, alias_scalar))
            }
            Projection::Aggregate(op, operand) => {
                let inner = match operand {
                    Some(bound) => render_expr(&bound.expr, &bound.scope, &mut self.ctx)?,
                    None => "*".to_string(),
                };
                Ok(self.scalar_select(format!("{}({})", op, inner), alias_scalar))
            }
        }
    }

    fn scalar_select(&self, value: String, alias_scalar: bool) -> String {
        if alias_scalar {
            format!("{} AS {}", value, self.ctx.sql_gen.quote_identifier("value"))
        } else {
            value
        }
    }

    fn from_item_sql(&mut self, item: &FromItem) -> ForgeResult<String> {
        match item {
            FromItem::Table { name, alias } => {
                let table = self.ctx.sql_gen.quote_identifier(name);
                Ok(match alias {
                    Some(a) if a != name => {
                        format!("{} {}", table, self.ctx.sql_gen.quote_identifier(a))
                    }
                    _ => table,
                })
            }
            FromItem::Derived {
                inner,
                scalar,
                alias,
            } => {
                let inner_sql = self.assemble(inner, *scalar)?;
                Ok(format!(
                    "({}) {}",
                    inner_sql,
                    self.ctx.sql_gen.quote_identifier(alias)
                ))
            }
            FromItem::Join { .. } => Err(ForgeError::InvariantViolation(
                "join item rendered outside a FROM list".to_string(),
            )),
        }
    }
}

/// Classify a map body into an output projection.
fn projection_for(scope: Scope, body: &Expr, binder: &str) -> Projection {
    match body {
        // Identity projection keeps the source rows as-is.
        Expr::Ident(ident) if ident.name == binder => Projection::Star,
        Expr::Product { fields } => Projection::Columns(
            fields
                .iter()
                .map(|(name, expr)| (Bound::new(scope.clone(), expr.clone()), name.clone()))
                .collect(),
        ),
        other => Projection::Scalar(Bound::new(scope, other.clone())),
    }
}

fn is_plain_table(sel: &Sel) -> bool {
    sel.filters.is_empty()
        && sel.order_by.is_empty()
        && !sel.distinct
        && !sel.has_row_bounds()
        && !sel.has_projection()
        && matches!(sel.from.as_slice(), [FromItem::Table { alias: None, .. }])
}

fn alias_of(item: &FromItem) -> String {
    match item {
        FromItem::Table {
            alias: Some(alias), ..
        }
        | FromItem::Derived { alias, .. } => alias.clone(),
        FromItem::Table { name, alias: None } => name.clone(),
        FromItem::Join { item, .. } => alias_of(item),
    }
}

/// Every binder name in the tree; synthesized derived-table aliases must
/// avoid them.
fn collect_binders(query: &Query, names: &mut BTreeSet<String>) {
    match query {
        Query::Entity { .. } => {}
        Query::Map { source, ident, .. }
        | Query::Filter { source, ident, .. }
        | Query::SortBy { source, ident, .. } => {
            names.insert(ident.name.clone());
            collect_binders(source, names);
        }
        Query::FlatMap {
            source,
            ident,
            body,
        } => {
            names.insert(ident.name.clone());
            collect_binders(source, names);
            collect_binders(body, names);
        }
        Query::Join {
            left,
            right,
            left_ident,
            right_ident,
            ..
        } => {
            names.insert(left_ident.name.clone());
            names.insert(right_ident.name.clone());
            collect_binders(left, names);
            collect_binders(right, names);
        }
        Query::Aggregation { source, .. }
        | Query::Take { source, .. }
        | Query::Drop { source, .. }
        | Query::Distinct { source }
        | Query::Nested { source } => collect_binders(source, names),
        Query::Union { left, right } | Query::UnionAll { left, right } => {
            collect_binders(left, names);
            collect_binders(right, names);
        }
    }
}
