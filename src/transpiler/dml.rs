//! Action rendering: INSERT / UPDATE / DELETE.
//!
//! Dialect legality is checked before any text is produced, so an
//! unsupported returning request or upsert never yields partial SQL.

use crate::ast::{Action, ActionKind, ConflictAction, Expr, Ident, OnConflict, Returning};
use crate::error::{ForgeError, ForgeResult};
use crate::transpiler::expr::{render_expr, AliasTarget, ParamRef, RenderContext, Scope};
use crate::transpiler::traits::{ReturningStyle, SqlGenerator};

/// How the caller retrieves affected-row data after executing the
/// statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningBehavior {
    /// Nothing beyond the affected-row count.
    None,
    /// The statement itself yields rows (RETURNING / OUTPUT clause).
    Rows,
    /// No clause is emitted; generated keys come through the driver.
    Keys,
}

/// A rendered action with its parameter slots and returning behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAction {
    pub kind: ActionKind,
    pub sql: String,
    pub params: Vec<ParamRef>,
    pub returning: ReturningBehavior,
}

/// Reject dialect-illegal actions before rendering starts.
fn check_support(action: &Action, sql_gen: &dyn SqlGenerator) -> ForgeResult<ReturningBehavior> {
    if let Action::Insert {
        on_conflict: Some(_),
        ..
    } = action
    {
        if !sql_gen.supports_on_conflict() {
            return Err(ForgeError::unsupported("ON CONFLICT", sql_gen.dialect_name()));
        }
    }
    match action.returning() {
        Returning::None => Ok(ReturningBehavior::None),
        Returning::Columns(_) => {
            if sql_gen.returning_style() == ReturningStyle::Unsupported {
                return Err(ForgeError::unsupported(
                    "returning affected rows",
                    sql_gen.dialect_name(),
                ));
            }
            Ok(ReturningBehavior::Rows)
        }
        Returning::Keys => {
            if !sql_gen.supports_returning_keys(action.kind()) {
                return Err(ForgeError::unsupported(
                    match action.kind() {
                        ActionKind::Insert => "generated keys from INSERT",
                        ActionKind::Update => "generated keys from UPDATE",
                        ActionKind::Delete => "generated keys from DELETE",
                    },
                    sql_gen.dialect_name(),
                ));
            }
            Ok(ReturningBehavior::Keys)
        }
    }
}

pub(crate) fn render_with(action: &Action, sql_gen: &dyn SqlGenerator) -> ForgeResult<RenderedAction> {
    let behavior = check_support(action, sql_gen)?;
    let mut ctx = RenderContext::new(sql_gen);
    let sql = match action {
        Action::Insert {
            entity,
            assignments,
            on_conflict,
            returning,
        } => render_insert(entity, assignments, on_conflict.as_ref(), returning, &mut ctx)?,
        Action::Update {
            entity,
            assignments,
            filter,
            returning,
        } => render_update(entity, assignments, filter.as_ref(), returning, &mut ctx)?,
        Action::Delete {
            entity,
            filter,
            returning,
        } => render_delete(entity, filter.as_ref(), returning, &mut ctx)?,
    };
    Ok(RenderedAction {
        kind: action.kind(),
        sql,
        params: ctx.params,
        returning: behavior,
    })
}

fn render_insert(
    entity: &str,
    assignments: &[(String, Expr)],
    on_conflict: Option<&OnConflict>,
    returning: &Returning,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    if assignments.is_empty() {
        return Err(ForgeError::InvariantViolation(
            "insert with no assignments".to_string(),
        ));
    }
    let scope = column_scope(None);
    let columns: Vec<String> = assignments
        .iter()
        .map(|(name, _)| ctx.sql_gen.quote_identifier(name))
        .collect();
    let mut sql = format!(
        "INSERT INTO {} ({})",
        ctx.sql_gen.quote_identifier(entity),
        columns.join(", ")
    );

    // T-SQL places OUTPUT between the column list and VALUES.
    let output = output_clause(returning, "INSERTED", ctx)?;
    if let Some(clause) = &output {
        sql.push_str(clause);
    }

    let mut values = Vec::with_capacity(assignments.len());
    for (_, expr) in assignments {
        values.push(render_expr(expr, &scope, ctx)?);
    }
    sql.push_str(&format!(" VALUES ({})", values.join(", ")));

    if let Some(conflict) = on_conflict {
        sql.push_str(&render_on_conflict(conflict, &scope, ctx)?);
    }

    if let Some(clause) = returning_clause(returning, &scope, ctx)? {
        sql.push_str(&clause);
    }
    Ok(sql)
}

fn render_update(
    entity: &str,
    assignments: &[(String, Expr)],
    filter: Option<&(Ident, Expr)>,
    returning: &Returning,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    if assignments.is_empty() {
        return Err(ForgeError::InvariantViolation(
            "update with no assignments".to_string(),
        ));
    }
    let scope = column_scope(None);
    let mut sets = Vec::with_capacity(assignments.len());
    for (name, expr) in assignments {
        sets.push(format!(
            "{} = {}",
            ctx.sql_gen.quote_identifier(name),
            render_expr(expr, &scope, ctx)?
        ));
    }
    let mut sql = format!(
        "UPDATE {} SET {}",
        ctx.sql_gen.quote_identifier(entity),
        sets.join(", ")
    );

    let output = output_clause(returning, "INSERTED", ctx)?;
    if let Some(clause) = &output {
        sql.push_str(clause);
    }

    sql.push_str(&filter_clause(filter, ctx)?);

    if let Some(clause) = returning_clause(returning, &scope, ctx)? {
        sql.push_str(&clause);
    }
    Ok(sql)
}

fn render_delete(
    entity: &str,
    filter: Option<&(Ident, Expr)>,
    returning: &Returning,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    let mut sql = format!("DELETE FROM {}", ctx.sql_gen.quote_identifier(entity));

    // Deleted rows are only visible through the DELETED pseudo-table.
    let output = output_clause(returning, "DELETED", ctx)?;
    if let Some(clause) = &output {
        sql.push_str(clause);
    }

    sql.push_str(&filter_clause(filter, ctx)?);

    if let Some(clause) = returning_clause(returning, &column_scope(None), ctx)? {
        sql.push_str(&clause);
    }
    Ok(sql)
}

/// Predicate scope for DML: the filter binder resolves to bare columns
/// of the target table.
fn filter_clause(
    filter: Option<&(Ident, Expr)>,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    match filter {
        Some((ident, predicate)) => {
            let scope = Scope::new().with(&ident.name, AliasTarget::Columns { prefix: None });
            let pred = render_expr(predicate, &scope, ctx)?;
            Ok(format!(" WHERE {}", pred))
        }
        None => Ok(String::new()),
    }
}

fn column_scope(prefix: Option<&'static str>) -> Scope {
    // DML column expressions carry no binder; any path that does appear
    // resolves against the target table's columns.
    Scope::new().with("", AliasTarget::Columns { prefix })
}

/// The trailing `RETURNING ...` clause for dialects that have one.
fn returning_clause(
    returning: &Returning,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<Option<String>> {
    match returning {
        Returning::Columns(exprs) if ctx.sql_gen.returning_style() == ReturningStyle::Returning => {
            let mut parts = Vec::with_capacity(exprs.len());
            for expr in exprs {
                parts.push(render_returning_expr(expr, scope, ctx)?);
            }
            Ok(Some(format!(" RETURNING {}", parts.join(", "))))
        }
        _ => Ok(None),
    }
}

/// The mid-statement `OUTPUT pseudo.col` clause for T-SQL.
fn output_clause(
    returning: &Returning,
    pseudo_table: &'static str,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<Option<String>> {
    match returning {
        Returning::Columns(exprs) if ctx.sql_gen.returning_style() == ReturningStyle::Output => {
            let scope = Scope::new().with(
                "",
                AliasTarget::Columns {
                    prefix: Some(pseudo_table),
                },
            );
            let mut parts = Vec::with_capacity(exprs.len());
            for expr in exprs {
                parts.push(render_returning_expr(expr, &scope, ctx)?);
            }
            Ok(Some(format!(" OUTPUT {}", parts.join(", "))))
        }
        _ => Ok(None),
    }
}

/// Returning expressions reference target-table columns directly, either
/// as bare properties or through an explicit row binder.
fn render_returning_expr(
    expr: &Expr,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    match expr {
        // A bare ident names a column, not a binder.
        Expr::Ident(ident) => render_expr(&column_ref(&ident.name), scope, ctx),
        // A property off a row binder also collapses to its column.
        Expr::Property { base, name } if matches!(base.as_ref(), Expr::Ident(_)) => {
            render_expr(&column_ref(name), scope, ctx)
        }
        other => render_expr(other, scope, ctx),
    }
}

fn column_ref(name: &str) -> Expr {
    Expr::Property {
        base: Box::new(Expr::Ident(Ident::new(
            "",
            crate::ast::IrType::Value(crate::ast::ValueKind::Null),
        ))),
        name: name.to_string(),
    }
}

fn render_on_conflict(
    conflict: &OnConflict,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
) -> ForgeResult<String> {
    let columns: Vec<String> = conflict
        .columns
        .iter()
        .map(|c| ctx.sql_gen.quote_identifier(c))
        .collect();
    let mut sql = format!(" ON CONFLICT ({})", columns.join(", "));
    match &conflict.action {
        ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
        ConflictAction::DoUpdate { assignments } => {
            let mut sets = Vec::with_capacity(assignments.len());
            for (name, expr) in assignments {
                sets.push(format!(
                    "{} = {}",
                    ctx.sql_gen.quote_identifier(name),
                    render_expr(expr, scope, ctx)?
                ));
            }
            sql.push_str(&format!(" DO UPDATE SET {}", sets.join(", ")));
        }
    }
    Ok(sql)
}
