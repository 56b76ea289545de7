//! Ergonomic constructors for IR trees.
//!
//! The external parser and the test suite build trees through these instead
//! of spelling out boxed variants.

use crate::ast::{
    AggKind, BinaryOperator, ConstValue, Expr, Ident, IrType, JoinKind, ProductType, Query,
    SortOrder, UnaryOperator, ValueKind,
};

pub fn entity(name: impl Into<String>, ty: ProductType) -> Query {
    Query::Entity {
        name: name.into(),
        ty,
    }
}

pub fn map(source: Query, ident: Ident, body: Expr) -> Query {
    Query::Map {
        source: Box::new(source),
        ident,
        body,
    }
}

pub fn filter(source: Query, ident: Ident, predicate: Expr) -> Query {
    Query::Filter {
        source: Box::new(source),
        ident,
        predicate,
    }
}

pub fn flat_map(source: Query, ident: Ident, body: Query) -> Query {
    Query::FlatMap {
        source: Box::new(source),
        ident,
        body: Box::new(body),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn join(
    kind: JoinKind,
    left: Query,
    right: Query,
    left_ident: Ident,
    right_ident: Ident,
    on: Expr,
) -> Query {
    Query::Join {
        kind,
        left: Box::new(left),
        right: Box::new(right),
        left_ident,
        right_ident,
        on,
    }
}

pub fn aggregation(source: Query, op: AggKind) -> Query {
    Query::Aggregation {
        source: Box::new(source),
        op,
    }
}

pub fn sort_by(source: Query, ident: Ident, key: Expr, order: SortOrder) -> Query {
    Query::SortBy {
        source: Box::new(source),
        ident,
        key,
        order,
    }
}

pub fn take(source: Query, count: Expr) -> Query {
    Query::Take {
        source: Box::new(source),
        count,
    }
}

pub fn drop(source: Query, count: Expr) -> Query {
    Query::Drop {
        source: Box::new(source),
        count,
    }
}

pub fn distinct(source: Query) -> Query {
    Query::Distinct {
        source: Box::new(source),
    }
}

pub fn union(left: Query, right: Query) -> Query {
    Query::Union {
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn union_all(left: Query, right: Query) -> Query {
    Query::UnionAll {
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn nested(source: Query) -> Query {
    Query::Nested {
        source: Box::new(source),
    }
}

// Expression shorthands.

pub fn lit(value: impl Into<ConstValue>) -> Expr {
    Expr::Const(value.into())
}

pub fn ident(name: impl Into<String>, ty: impl Into<IrType>) -> Ident {
    Ident::new(name, ty)
}

/// `ident.field` projection.
pub fn prop(id: &Ident, field: impl Into<String>) -> Expr {
    Expr::property(Expr::Ident(id.clone()), field)
}

pub fn param(name: impl Into<String>, ty: ValueKind) -> Expr {
    Expr::param(name, ty)
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Eq, right)
}

pub fn ne(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Ne, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Lt, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Gt, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::And, right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Or, right)
}

pub fn not(expr: Expr) -> Expr {
    Expr::unary(UnaryOperator::Not, expr)
}

pub fn neg(expr: Expr) -> Expr {
    Expr::unary(UnaryOperator::Neg, expr)
}

pub fn add(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Add, right)
}

pub fn mul(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOperator::Mul, right)
}

pub fn product(fields: Vec<(&str, Expr)>) -> Expr {
    Expr::Product {
        fields: fields
            .into_iter()
            .map(|(name, e)| (name.to_string(), e))
            .collect(),
    }
}

/// Shorthand for a product type over scalar columns.
pub fn row_type(name: &str, fields: &[(&str, ValueKind)]) -> ProductType {
    ProductType::new(
        name,
        fields
            .iter()
            .map(|(f, k)| (f.to_string(), IrType::Value(*k)))
            .collect(),
    )
}
