//! Rule 6: cardinality-scope canonicalization.
//!
//! A binder placed directly on top of a node with distinct cardinality
//! semantics (`Distinct`, `Aggregation`, `Union`, `UnionAll`) gets a
//! `Nested` boundary inserted between them, so no later rule can merge the
//! two scopes. A `Nested` marker is only ever added, never removed.

use crate::ast::Query;

/// Insert a `Nested` boundary under a binder whose source needs one.
pub fn ensure_boundary(query: &Query) -> Option<Query> {
    match query {
        Query::Map {
            source,
            ident,
            body,
        } if source.needs_nesting_boundary() => Some(Query::Map {
            source: Box::new(Query::Nested {
                source: source.clone(),
            }),
            ident: ident.clone(),
            body: body.clone(),
        }),
        Query::Filter {
            source,
            ident,
            predicate,
        } if source.needs_nesting_boundary() => Some(Query::Filter {
            source: Box::new(Query::Nested {
                source: source.clone(),
            }),
            ident: ident.clone(),
            predicate: predicate.clone(),
        }),
        Query::SortBy {
            source,
            ident,
            key,
            order,
        } if source.needs_nesting_boundary() => Some(Query::SortBy {
            source: Box::new(Query::Nested {
                source: source.clone(),
            }),
            ident: ident.clone(),
            key: key.clone(),
            order: *order,
        }),
        Query::FlatMap {
            source,
            ident,
            body,
        } if source.needs_nesting_boundary() => Some(Query::FlatMap {
            source: Box::new(Query::Nested {
                source: source.clone(),
            }),
            ident: ident.clone(),
            body: body.clone(),
        }),
        _ => None,
    }
}
