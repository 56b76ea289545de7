//! Element-type resolution for queries and expressions.
//!
//! Types are attached at the leaves (`Entity`) and binders (`Ident`), so the
//! element type of any query node is derivable without inference. The
//! normalizer runs `check_preserved` after every rewrite pass that changed
//! the tree as its internal consistency check.

use crate::ast::{AggKind, Expr, Ident, IrType, ProductType, Query, ValueKind};
use crate::error::{ForgeError, ForgeResult};
use std::collections::BTreeMap;

/// Scope of bound row identifiers, name to type.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    bindings: BTreeMap<String, IrType>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, ident: &Ident) -> Self {
        let mut next = self.clone();
        next.bindings
            .insert(ident.name.clone(), ident.ty.clone());
        next
    }

    pub fn lookup(&self, name: &str) -> Option<&IrType> {
        self.bindings.get(name)
    }
}

/// Compute the type of an expression under an environment of bound row
/// identifiers.
pub fn type_of(expr: &Expr, env: &TypeEnv) -> ForgeResult<IrType> {
    match expr {
        Expr::Const(value) => Ok(IrType::Value(value.kind())),
        Expr::Param { ty, .. } => Ok(IrType::Value(*ty)),
        Expr::Ident(id) => match env.lookup(&id.name) {
            Some(bound) => {
                if *bound != id.ty {
                    return Err(ForgeError::type_mismatch(
                        bound.to_string(),
                        id.ty.to_string(),
                        format!("identifier '{}'", id.name),
                    ));
                }
                Ok(id.ty.clone())
            }
            None => Err(ForgeError::normalization(
                format!("unresolved identifier '{}'", id.name),
                id.name.clone(),
            )),
        },
        Expr::Property { base, name } => {
            let base_ty = type_of(base, env)?;
            let Some(product) = base_ty.as_product() else {
                return Err(ForgeError::type_mismatch(
                    "product type",
                    base_ty.to_string(),
                    format!("property access '.{}'", name),
                ));
            };
            product.field(name).cloned().ok_or_else(|| {
                ForgeError::type_mismatch(
                    format!("field '{}' in {}", name, product.name),
                    "missing field".to_string(),
                    format!("property access '.{}'", name),
                )
            })
        }
        Expr::Binary { left, op, right } => {
            let lt = type_of(left, env)?;
            let rt = type_of(right, env)?;
            if op.is_logical() {
                expect_bool(&lt, "logical operand")?;
                expect_bool(&rt, "logical operand")?;
                Ok(IrType::Value(ValueKind::Bool))
            } else if op.is_comparison() {
                if !comparable(&lt, &rt) {
                    return Err(ForgeError::type_mismatch(
                        lt.to_string(),
                        rt.to_string(),
                        format!("comparison '{}'", op),
                    ));
                }
                Ok(IrType::Value(ValueKind::Bool))
            } else if op.is_numeric() {
                let lk = numeric_kind(&lt, op)?;
                let rk = numeric_kind(&rt, op)?;
                let kind = if lk == ValueKind::Float || rk == ValueKind::Float {
                    ValueKind::Float
                } else {
                    ValueKind::Int
                };
                Ok(IrType::Value(kind))
            } else {
                // Concat
                Ok(IrType::Value(ValueKind::String))
            }
        }
        Expr::Unary { op, expr } => {
            let ty = type_of(expr, env)?;
            match op {
                crate::ast::UnaryOperator::Not => {
                    expect_bool(&ty, "NOT operand")?;
                    Ok(IrType::Value(ValueKind::Bool))
                }
                crate::ast::UnaryOperator::Neg => {
                    numeric_kind(&ty, &crate::ast::BinaryOperator::Sub)?;
                    Ok(ty)
                }
            }
        }
        Expr::Apply { func, args } => {
            let Expr::Function { params, body } = func.as_ref() else {
                return Err(ForgeError::normalization(
                    "application of a non-lambda expression",
                    "Apply",
                ));
            };
            if params.len() != args.len() {
                return Err(ForgeError::normalization(
                    format!(
                        "arity mismatch: {} params, {} args",
                        params.len(),
                        args.len()
                    ),
                    "Apply",
                ));
            }
            let mut inner = env.clone();
            for param in params {
                inner = inner.bind(param);
            }
            type_of(body, &inner)
        }
        Expr::Function { .. } => Err(ForgeError::normalization(
            "a lambda has no first-class type; it must be applied",
            "Function",
        )),
        Expr::When {
            branches,
            otherwise,
        } => {
            for (guard, _) in branches {
                let guard_ty = type_of(guard, env)?;
                expect_bool(&guard_ty, "When guard")?;
            }
            let mut result = type_of(otherwise, env)?;
            for (_, value) in branches {
                let value_ty = type_of(value, env)?;
                result = unify_branch(&result, &value_ty)?;
            }
            Ok(result)
        }
        Expr::Product { fields } => {
            let mut typed = Vec::with_capacity(fields.len());
            for (name, e) in fields {
                typed.push((name.clone(), type_of(e, env)?));
            }
            Ok(IrType::Product(ProductType::new("Row", typed)))
        }
    }
}

/// Compute the element type of a query node.
pub fn resolve_type(query: &Query) -> ForgeResult<IrType> {
    resolve_in(query, &TypeEnv::new())
}

/// Resolution under an environment of outer binders; `FlatMap` bodies see
/// the identifier bound over their source.
fn resolve_in(query: &Query, env: &TypeEnv) -> ForgeResult<IrType> {
    match query {
        Query::Entity { ty, .. } => Ok(IrType::Product(ty.clone())),
        Query::Map {
            source,
            ident,
            body,
        } => {
            let src_ty = resolve_in(source, env)?;
            check_binder(ident, &src_ty)?;
            type_of(body, &env.bind(ident))
        }
        Query::Filter {
            source,
            ident,
            predicate,
        } => {
            let src_ty = resolve_in(source, env)?;
            check_binder(ident, &src_ty)?;
            let pred_ty = type_of(predicate, &env.bind(ident))?;
            expect_bool(&pred_ty, "Filter predicate")?;
            Ok(src_ty)
        }
        Query::FlatMap {
            source,
            ident,
            body,
        } => {
            let src_ty = resolve_in(source, env)?;
            check_binder(ident, &src_ty)?;
            resolve_in(body, &env.bind(ident))
        }
        Query::Join {
            left,
            right,
            left_ident,
            right_ident,
            on,
            ..
        } => {
            let lt = resolve_in(left, env)?;
            let rt = resolve_in(right, env)?;
            check_binder(left_ident, &lt)?;
            check_binder(right_ident, &rt)?;
            let on_env = env.bind(left_ident).bind(right_ident);
            let on_ty = type_of(on, &on_env)?;
            expect_bool(&on_ty, "Join on-predicate")?;
            Ok(IrType::Product(ProductType::new(
                "Pair",
                vec![
                    (left_ident.name.clone(), lt),
                    (right_ident.name.clone(), rt),
                ],
            )))
        }
        Query::Aggregation { source, op } => {
            let src_ty = resolve_in(source, env)?;
            match op {
                AggKind::Count => Ok(IrType::Value(ValueKind::Int)),
                AggKind::Avg => {
                    scalar_kind(&src_ty, op)?;
                    Ok(IrType::Value(ValueKind::Float))
                }
                AggKind::Sum | AggKind::Min | AggKind::Max => {
                    let kind = scalar_kind(&src_ty, op)?;
                    Ok(IrType::Value(kind))
                }
            }
        }
        Query::SortBy {
            source,
            ident,
            key,
            ..
        } => {
            let src_ty = resolve_in(source, env)?;
            check_binder(ident, &src_ty)?;
            type_of(key, &env.bind(ident))?;
            Ok(src_ty)
        }
        Query::Take { source, .. } | Query::Drop { source, .. } => resolve_in(source, env),
        Query::Distinct { source } | Query::Nested { source } => resolve_in(source, env),
        Query::Union { left, right } | Query::UnionAll { left, right } => {
            let lt = resolve_in(left, env)?;
            let rt = resolve_in(right, env)?;
            if lt != rt {
                return Err(ForgeError::type_mismatch(
                    lt.to_string(),
                    rt.to_string(),
                    "set union branches",
                ));
            }
            Ok(lt)
        }
    }
}

/// A semantics-preserving rewrite must keep the element type unchanged.
pub fn check_preserved(before: &Query, after: &Query) -> ForgeResult<()> {
    let before_ty = resolve_type(before)?;
    check_type(after, &before_ty)
}

/// Verify that a query's computed element type matches the type carried
/// into a rewrite.
pub fn check_type(query: &Query, expected: &IrType) -> ForgeResult<()> {
    let found = resolve_type(query)?;
    if found != *expected {
        return Err(ForgeError::type_mismatch(
            expected.to_string(),
            found.to_string(),
            format!("rewrite of {}", query.variant_name()),
        ));
    }
    Ok(())
}

fn check_binder(ident: &Ident, source_ty: &IrType) -> ForgeResult<()> {
    if ident.ty != *source_ty {
        return Err(ForgeError::type_mismatch(
            source_ty.to_string(),
            ident.ty.to_string(),
            format!("binder '{}'", ident.name),
        ));
    }
    Ok(())
}

fn expect_bool(ty: &IrType, context: &str) -> ForgeResult<()> {
    if !ty.is_bool() {
        return Err(ForgeError::type_mismatch(
            "bool",
            ty.to_string(),
            context.to_string(),
        ));
    }
    Ok(())
}

fn comparable(left: &IrType, right: &IrType) -> bool {
    match (left, right) {
        (IrType::Value(ValueKind::Null), _) | (_, IrType::Value(ValueKind::Null)) => true,
        (IrType::Value(lk), IrType::Value(rk)) => {
            lk == rk
                || matches!(
                    (lk, rk),
                    (ValueKind::Int, ValueKind::Float) | (ValueKind::Float, ValueKind::Int)
                )
        }
        _ => false,
    }
}

fn numeric_kind(ty: &IrType, op: &crate::ast::BinaryOperator) -> ForgeResult<ValueKind> {
    match ty {
        IrType::Value(ValueKind::Int) => Ok(ValueKind::Int),
        IrType::Value(ValueKind::Float) => Ok(ValueKind::Float),
        other => Err(ForgeError::type_mismatch(
            "numeric type",
            other.to_string(),
            format!("operand of '{}'", op),
        )),
    }
}

fn scalar_kind(ty: &IrType, op: &AggKind) -> ForgeResult<ValueKind> {
    match ty {
        IrType::Value(kind) if *kind != ValueKind::Null => Ok(*kind),
        other => Err(ForgeError::type_mismatch(
            "scalar element type",
            other.to_string(),
            format!("aggregation {}", op),
        )),
    }
}

fn unify_branch(a: &IrType, b: &IrType) -> ForgeResult<IrType> {
    if a == b {
        return Ok(a.clone());
    }
    match (a, b) {
        (IrType::Value(ValueKind::Null), other) | (other, IrType::Value(ValueKind::Null)) => {
            Ok(other.clone())
        }
        (IrType::Value(ValueKind::Int), IrType::Value(ValueKind::Float))
        | (IrType::Value(ValueKind::Float), IrType::Value(ValueKind::Int)) => {
            Ok(IrType::Value(ValueKind::Float))
        }
        _ => Err(ForgeError::type_mismatch(
            a.to_string(),
            b.to_string(),
            "When branches",
        )),
    }
}
