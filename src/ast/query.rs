use crate::ast::{AggKind, Expr, Ident, JoinKind, ProductType, SortOrder};
use serde::{Deserialize, Serialize};

/// A query node. Each variant produces rows of a well-defined element type;
/// `crate::typer::resolve_type` derives it deterministically from the types
/// attached at the leaves and binders, so no rewrite can drop it silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    /// A table reference, leaf of a query tree.
    Entity { name: String, ty: ProductType },
    /// Row transformer; `ident` is bound only within `body`.
    Map {
        source: Box<Query>,
        ident: Ident,
        body: Expr,
    },
    /// Row filter; `predicate` must reduce to boolean.
    Filter {
        source: Box<Query>,
        ident: Ident,
        predicate: Expr,
    },
    /// Correlated sub-query composition: for each source row, `body` is
    /// evaluated with `ident` bound and its rows are concatenated.
    FlatMap {
        source: Box<Query>,
        ident: Ident,
        body: Box<Query>,
    },
    /// Binary join with an on-predicate over both bound row identifiers.
    Join {
        kind: JoinKind,
        left: Box<Query>,
        right: Box<Query>,
        left_ident: Ident,
        right_ident: Ident,
        on: Expr,
    },
    /// Scalar aggregation over the source rows.
    Aggregation { source: Box<Query>, op: AggKind },
    /// Sort by a key expression over the bound row identifier.
    SortBy {
        source: Box<Query>,
        ident: Ident,
        key: Expr,
        order: SortOrder,
    },
    /// LIMIT
    Take { source: Box<Query>, count: Expr },
    /// OFFSET
    Drop { source: Box<Query>, count: Expr },
    Distinct { source: Box<Query> },
    /// Set union, duplicates removed.
    Union { left: Box<Query>, right: Box<Query> },
    /// Set union, duplicates kept.
    UnionAll { left: Box<Query>, right: Box<Query> },
    /// Explicit sub-query boundary. Rewrite rules never flatten across it
    /// and the renderer emits it as an aliased derived table.
    Nested { source: Box<Query> },
}

impl Query {
    /// Variant name, used by diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Query::Entity { .. } => "Entity",
            Query::Map { .. } => "Map",
            Query::Filter { .. } => "Filter",
            Query::FlatMap { .. } => "FlatMap",
            Query::Join { .. } => "Join",
            Query::Aggregation { .. } => "Aggregation",
            Query::SortBy { .. } => "SortBy",
            Query::Take { .. } => "Take",
            Query::Drop { .. } => "Drop",
            Query::Distinct { .. } => "Distinct",
            Query::Union { .. } => "Union",
            Query::UnionAll { .. } => "UnionAll",
            Query::Nested { .. } => "Nested",
        }
    }

    /// The direct source of a single-source node, if any.
    pub fn source(&self) -> Option<&Query> {
        match self {
            Query::Map { source, .. }
            | Query::Filter { source, .. }
            | Query::FlatMap { source, .. }
            | Query::Aggregation { source, .. }
            | Query::SortBy { source, .. }
            | Query::Take { source, .. }
            | Query::Drop { source, .. }
            | Query::Distinct { source }
            | Query::Nested { source } => Some(source),
            Query::Entity { .. }
            | Query::Join { .. }
            | Query::Union { .. }
            | Query::UnionAll { .. } => None,
        }
    }

    /// Nodes whose output cardinality or scoping differs from their source:
    /// a binder placed directly on top of one of these must go through a
    /// `Nested` boundary.
    pub fn needs_nesting_boundary(&self) -> bool {
        matches!(
            self,
            Query::Distinct { .. }
                | Query::Aggregation { .. }
                | Query::Union { .. }
                | Query::UnionAll { .. }
        )
    }
}
