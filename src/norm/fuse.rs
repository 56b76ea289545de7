//! Rules 2-4: structural fusion of adjacent query nodes.
//!
//! None of these look through a `Nested` boundary; the patterns match
//! direct composition only.

use crate::ast::{BinaryOperator, Expr, Query};
use crate::subst::{free_idents, substitute, FreshNames};

/// Rule 2: `Map(Map(src, x, f), y, g)` becomes `Map(src, x, g[y := f])`.
/// Removes the intermediate row shape so later rules see the true
/// structure.
pub fn fuse_map(query: &Query, fresh: &mut FreshNames) -> Option<Query> {
    let Query::Map {
        source,
        ident: outer_ident,
        body: outer_body,
    } = query
    else {
        return None;
    };
    let Query::Map {
        source: inner_source,
        ident: inner_ident,
        body: inner_body,
    } = source.as_ref()
    else {
        return None;
    };
    let fused = substitute(outer_body, outer_ident, inner_body, fresh);
    Some(Query::Map {
        source: inner_source.clone(),
        ident: inner_ident.clone(),
        body: fused,
    })
}

/// Rule 3: `Filter(Filter(src, x, p), y, q)` becomes
/// `Filter(src, x, p AND q[y := x])`. Conjunction order keeps `p` first;
/// predicate evaluation order can be observable for short-circuiting
/// vendor functions.
pub fn fuse_filter(query: &Query, fresh: &mut FreshNames) -> Option<Query> {
    let Query::Filter {
        source,
        ident: outer_ident,
        predicate: outer_pred,
    } = query
    else {
        return None;
    };
    let Query::Filter {
        source: inner_source,
        ident: inner_ident,
        predicate: inner_pred,
    } = source.as_ref()
    else {
        return None;
    };
    let rebased = substitute(
        outer_pred,
        outer_ident,
        &Expr::Ident(inner_ident.clone()),
        fresh,
    );
    Some(Query::Filter {
        source: inner_source.clone(),
        ident: inner_ident.clone(),
        predicate: Expr::binary(inner_pred.clone(), BinaryOperator::And, rebased),
    })
}

/// Rule 4: `Filter(Map(src, x, f), y, p)` becomes
/// `Map(Filter(src, x, p[y := f]), x, f)` when the substituted predicate is
/// expressible purely against `x`. When it is not, the nodes are left
/// composed; a missed pushdown loses no information.
pub fn push_filter_through_map(query: &Query, fresh: &mut FreshNames) -> Option<Query> {
    let Query::Filter {
        source,
        ident: filter_ident,
        predicate,
    } = query
    else {
        return None;
    };
    let Query::Map {
        source: map_source,
        ident: map_ident,
        body: map_body,
    } = source.as_ref()
    else {
        return None;
    };
    let pushed = substitute(predicate, filter_ident, map_body, fresh);
    let free = free_idents(&pushed);
    if !free.iter().all(|name| *name == map_ident.name) {
        return None;
    }
    Some(Query::Map {
        source: Box::new(Query::Filter {
            source: map_source.clone(),
            ident: map_ident.clone(),
            predicate: pushed,
        }),
        ident: map_ident.clone(),
        body: map_body.clone(),
    })
}
