//! The rewrite pipeline.
//!
//! `normalize` applies an ordered rule set to a query tree until a fixpoint
//! is reached, bounded by `MAX_PASSES`. Per node and per pass the rule order
//! is: beta-reduce pending applications, map fusion, filter fusion,
//! filter-through-map pushdown, expression simplification, nested-boundary
//! canonicalization. Lower-numbered rules win when several could fire on the
//! same node.

pub mod beta;
pub mod fuse;
pub mod nest;
pub mod simplify;

#[cfg(test)]
mod tests;

use crate::ast::{Action, ConflictAction, Expr, OnConflict, Query};
use crate::error::{ForgeError, ForgeResult};
use crate::subst::FreshNames;
use crate::typer;
use tracing::{debug, trace};

/// Defensive bound on fixpoint iteration. Exceeding it is an engine defect,
/// not a property of the input query.
pub const MAX_PASSES: usize = 64;

/// Normalize a query tree. Idempotent at its fixpoint:
/// `normalize(normalize(q)) == normalize(q)`.
pub fn normalize(query: Query) -> ForgeResult<Query> {
    typer::resolve_type(&query)?;
    let mut fresh = FreshNames::new();
    let mut current = query;
    for pass in 1..=MAX_PASSES {
        let mut changed = false;
        let before = current.clone();
        current = rewrite(current, &mut fresh, &mut changed)?;
        trace!(pass, changed, "normalization pass");
        if !changed {
            debug!(passes = pass, "normalization reached fixpoint");
            return Ok(current);
        }
        // Every rule is semantics-preserving; a changed element type means
        // an engine defect, caught here rather than at render time.
        typer::check_preserved(&before, &current)?;
    }
    Err(ForgeError::InvariantViolation(format!(
        "normalization did not reach a fixpoint within {} passes",
        MAX_PASSES
    )))
}

/// Normalize the expressions carried by an action: beta-reduce pending
/// applications and simplify, in the same rule order as query bodies.
pub fn normalize_action(action: Action) -> ForgeResult<Action> {
    let mut fresh = FreshNames::new();
    let mut rewrite_expr = |expr: Expr| -> ForgeResult<Expr> {
        let (expr, _) = beta::reduce_exprs(&expr, &mut fresh)?;
        let (expr, _) = simplify::simplify_expr(&expr);
        Ok(expr)
    };
    Ok(match action {
        Action::Insert {
            entity,
            assignments,
            on_conflict,
            returning,
        } => Action::Insert {
            entity,
            assignments: rewrite_assignments(assignments, &mut rewrite_expr)?,
            on_conflict: match on_conflict {
                Some(OnConflict { columns, action }) => Some(OnConflict {
                    columns,
                    action: match action {
                        ConflictAction::DoNothing => ConflictAction::DoNothing,
                        ConflictAction::DoUpdate { assignments } => ConflictAction::DoUpdate {
                            assignments: rewrite_assignments(assignments, &mut rewrite_expr)?,
                        },
                    },
                }),
                None => None,
            },
            returning,
        },
        Action::Update {
            entity,
            assignments,
            filter,
            returning,
        } => Action::Update {
            entity,
            assignments: rewrite_assignments(assignments, &mut rewrite_expr)?,
            filter: match filter {
                Some((ident, pred)) => Some((ident, rewrite_expr(pred)?)),
                None => None,
            },
            returning,
        },
        Action::Delete {
            entity,
            filter,
            returning,
        } => Action::Delete {
            entity,
            filter: match filter {
                Some((ident, pred)) => Some((ident, rewrite_expr(pred)?)),
                None => None,
            },
            returning,
        },
    })
}

fn rewrite_assignments(
    assignments: Vec<(String, Expr)>,
    rewrite_expr: &mut impl FnMut(Expr) -> ForgeResult<Expr>,
) -> ForgeResult<Vec<(String, Expr)>> {
    assignments
        .into_iter()
        .map(|(col, e)| Ok((col, rewrite_expr(e)?)))
        .collect()
}

/// One top-down pass over a node: expression rules, structural rules, then
/// descent into child queries.
fn rewrite(query: Query, fresh: &mut FreshNames, changed: &mut bool) -> ForgeResult<Query> {
    // Rule 1: resolve pending lambda applications before anything
    // structural looks at the node.
    let query = rewrite_exprs(query, changed, &mut |e| beta::reduce_exprs(e, fresh))?;

    // Rules 2-4, first match wins for this node in this pass.
    let query = if let Some(next) = fuse::fuse_map(&query, fresh) {
        *changed = true;
        next
    } else if let Some(next) = fuse::fuse_filter(&query, fresh) {
        *changed = true;
        next
    } else if let Some(next) = fuse::push_filter_through_map(&query, fresh) {
        *changed = true;
        next
    } else {
        query
    };

    // Rule 5: local expression simplification.
    let query = rewrite_exprs(query, changed, &mut |e| Ok(simplify::simplify_expr(e)))?;

    // Rule 6: cardinality-scope boundaries. Only ever adds a Nested marker.
    let query = if let Some(next) = nest::ensure_boundary(&query) {
        *changed = true;
        next
    } else {
        query
    };

    descend(query, fresh, changed)
}

/// Apply an expression rewriter to every expression carried by this node.
fn rewrite_exprs(
    query: Query,
    changed: &mut bool,
    f: &mut impl FnMut(&Expr) -> ForgeResult<(Expr, bool)>,
) -> ForgeResult<Query> {
    let mut apply = |expr: Expr, changed: &mut bool| -> ForgeResult<Expr> {
        let (next, fired) = f(&expr)?;
        *changed |= fired;
        Ok(next)
    };
    Ok(match query {
        Query::Map {
            source,
            ident,
            body,
        } => Query::Map {
            source,
            ident,
            body: apply(body, changed)?,
        },
        Query::Filter {
            source,
            ident,
            predicate,
        } => Query::Filter {
            source,
            ident,
            predicate: apply(predicate, changed)?,
        },
        Query::Join {
            kind,
            left,
            right,
            left_ident,
            right_ident,
            on,
        } => Query::Join {
            kind,
            left,
            right,
            left_ident,
            right_ident,
            on: apply(on, changed)?,
        },
        Query::SortBy {
            source,
            ident,
            key,
            order,
        } => Query::SortBy {
            source,
            ident,
            key: apply(key, changed)?,
            order,
        },
        Query::Take { source, count } => Query::Take {
            source,
            count: apply(count, changed)?,
        },
        Query::Drop { source, count } => Query::Drop {
            source,
            count: apply(count, changed)?,
        },
        other => other,
    })
}

/// Rebuild the node with the pass applied to each child query.
fn descend(query: Query, fresh: &mut FreshNames, changed: &mut bool) -> ForgeResult<Query> {
    Ok(match query {
        Query::Entity { .. } => query,
        Query::Map {
            source,
            ident,
            body,
        } => Query::Map {
            source: Box::new(rewrite(*source, fresh, changed)?),
            ident,
            body,
        },
        Query::Filter {
            source,
            ident,
            predicate,
        } => Query::Filter {
            source: Box::new(rewrite(*source, fresh, changed)?),
            ident,
            predicate,
        },
        Query::FlatMap {
            source,
            ident,
            body,
        } => Query::FlatMap {
            source: Box::new(rewrite(*source, fresh, changed)?),
            ident,
            body: Box::new(rewrite(*body, fresh, changed)?),
        },
        Query::Join {
            kind,
            left,
            right,
            left_ident,
            right_ident,
            on,
        } => Query::Join {
            kind,
            left: Box::new(rewrite(*left, fresh, changed)?),
            right: Box::new(rewrite(*right, fresh, changed)?),
            left_ident,
            right_ident,
            on,
        },
        Query::Aggregation { source, op } => Query::Aggregation {
            source: Box::new(rewrite(*source, fresh, changed)?),
            op,
        },
        Query::SortBy {
            source,
            ident,
            key,
            order,
        } => Query::SortBy {
            source: Box::new(rewrite(*source, fresh, changed)?),
            ident,
            key,
            order,
        },
        Query::Take { source, count } => Query::Take {
            source: Box::new(rewrite(*source, fresh, changed)?),
            count,
        },
        Query::Drop { source, count } => Query::Drop {
            source: Box::new(rewrite(*source, fresh, changed)?),
            count,
        },
        Query::Distinct { source } => Query::Distinct {
            source: Box::new(rewrite(*source, fresh, changed)?),
        },
        Query::Union { left, right } => Query::Union {
            left: Box::new(rewrite(*left, fresh, changed)?),
            right: Box::new(rewrite(*right, fresh, changed)?),
        },
        Query::UnionAll { left, right } => Query::UnionAll {
            left: Box::new(rewrite(*left, fresh, changed)?),
            right: Box::new(rewrite(*right, fresh, changed)?),
        },
        Query::Nested { source } => Query::Nested {
            source: Box::new(rewrite(*source, fresh, changed)?),
        },
    })
}
