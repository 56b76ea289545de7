//! Scalar expression rendering.
//!
//! Expressions are rendered bottom-up with precedence-minimal
//! parenthesization: a child is wrapped only when leaving it bare would
//! rebind it to the parent operator. Positional parameters are collected
//! in render order, which is the order the placeholders appear in the
//! final text.

use std::collections::BTreeMap;

use crate::ast::{BinaryOperator, ConstValue, Expr, UnaryOperator, ValueKind};
use crate::error::{ForgeError, ForgeResult};
use crate::transpiler::traits::SqlGenerator;

/// One named parameter slot, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRef {
    pub name: String,
    pub ty: ValueKind,
}

/// What an in-scope binder resolves to in the surrounding statement.
#[derive(Debug, Clone)]
pub enum AliasTarget {
    /// Rows of an aliased table or derived table. A property access
    /// becomes `alias.col`.
    Row(String),
    /// A derived table projecting a single scalar column named `value`.
    Scalar(String),
    /// A two-sided join result. Top-level fields name the sides; a
    /// nested property access becomes `side_alias.col`.
    Pair(BTreeMap<String, String>),
    /// Bare column references, optionally qualified with a fixed prefix
    /// (e.g. `INSERTED` in T-SQL OUTPUT clauses).
    Columns { prefix: Option<&'static str> },
}

/// Binder-to-alias bindings, innermost last.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<(String, AliasTarget)>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with(mut self, name: &str, target: AliasTarget) -> Self {
        self.bindings.push((name.to_string(), target));
        self
    }

    pub fn bind(&mut self, name: &str, target: AliasTarget) {
        self.bindings.push((name.to_string(), target));
    }

    pub fn lookup(&self, name: &str) -> Option<&AliasTarget> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}

/// Shared rendering state: the dialect strategy plus the parameter
/// slots collected so far.
pub struct RenderContext<'a> {
    pub sql_gen: &'a dyn SqlGenerator,
    pub params: Vec<ParamRef>,
}

impl<'a> RenderContext<'a> {
    pub fn new(sql_gen: &'a dyn SqlGenerator) -> Self {
        RenderContext {
            sql_gen,
            params: Vec::new(),
        }
    }

    /// Record a parameter slot and return its dialect placeholder.
    pub fn push_param(&mut self, name: &str, ty: ValueKind) -> String {
        self.params.push(ParamRef {
            name: name.to_string(),
            ty,
        });
        self.sql_gen.placeholder(self.params.len())
    }
}

/// Render an expression in the given scope.
pub fn render_expr(expr: &Expr, scope: &Scope, ctx: &mut RenderContext<'_>) -> ForgeResult<String> {
    render_prec(expr, scope, ctx)
}

const ATOM_PREC: u8 = u8::MAX;

pub(crate) fn precedence_of(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { op, .. } => op.precedence(),
        _ => ATOM_PREC,
    }
}

fn is_associative(op: BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::And
            | BinaryOperator::Or
            | BinaryOperator::Add
            | BinaryOperator::Mul
            | BinaryOperator::Concat
    )
}

fn render_prec(expr: &Expr, scope: &Scope, ctx: &mut RenderContext<'_>) -> ForgeResult<String> {
    match expr {
        Expr::Const(value) => Ok(render_const(value, ctx)),
        Expr::Ident(_) | Expr::Property { .. } => render_path(expr, scope, ctx),
        Expr::Param { name, ty } => Ok(ctx.push_param(name, *ty)),
        Expr::Binary { left, op, right } => {
            let parent = op.precedence();
            let left_sql = render_child(left, scope, ctx, |child| child < parent)?;
            let right_sql = render_child(right, scope, ctx, |child| {
                child < parent || (child == parent && !same_associative(*op, right))
            })?;
            Ok(format!("{} {} {}", left_sql, op.sql_symbol(), right_sql))
        }
        Expr::Unary {
            op: UnaryOperator::Not,
            expr,
        } => {
            let inner = render_child(expr, scope, ctx, |child| child < 3)?;
            Ok(format!("NOT {}", inner))
        }
        Expr::Unary {
            op: UnaryOperator::Neg,
            expr,
        } => {
            let inner = render_child(expr, scope, ctx, |child| child < 7)?;
            Ok(format!("-{}", inner))
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            let mut sql = String::from("CASE");
            for (guard, value) in branches {
                let guard_sql = render_prec(guard, scope, ctx)?;
                let value_sql = render_prec(value, scope, ctx)?;
                sql.push_str(&format!(" WHEN {} THEN {}", guard_sql, value_sql));
            }
            let else_sql = render_prec(otherwise, scope, ctx)?;
            sql.push_str(&format!(" ELSE {} END", else_sql));
            Ok(sql)
        }
        Expr::Apply { .. } => Err(ForgeError::InvariantViolation(
            "residual function application in rendered expression; normalize first".to_string(),
        )),
        Expr::Function { .. } => Err(ForgeError::InvariantViolation(
            "bare function value cannot be rendered as SQL".to_string(),
        )),
        Expr::Product { .. } => Err(ForgeError::InvariantViolation(
            "row constructor outside projection position".to_string(),
        )),
    }
}

fn same_associative(op: BinaryOperator, right: &Expr) -> bool {
    match right {
        Expr::Binary { op: child_op, .. } => *child_op == op && is_associative(op),
        _ => false,
    }
}

fn render_child(
    expr: &Expr,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
    needs_parens: impl Fn(u8) -> bool,
) -> ForgeResult<String> {
    let sql = render_prec(expr, scope, ctx)?;
    if needs_parens(precedence_of(expr)) {
        Ok(format!("({})", sql))
    } else {
        Ok(sql)
    }
}

fn render_const(value: &ConstValue, ctx: &mut RenderContext<'_>) -> String {
    match value {
        ConstValue::Null => "NULL".to_string(),
        ConstValue::Bool(b) => ctx.sql_gen.bool_literal(*b),
        ConstValue::Int(i) => i.to_string(),
        ConstValue::Float(f) => f.to_string(),
        ConstValue::String(s) => ctx.sql_gen.escape_string(s),
        ConstValue::Uuid(u) => format!("'{}'", u),
    }
}

/// Resolve an ident-or-property chain against the scope.
///
/// The chain is flattened to a base binder plus a field path, then the
/// binder's [`AliasTarget`] decides the column text.
fn render_path(expr: &Expr, scope: &Scope, ctx: &mut RenderContext<'_>) -> ForgeResult<String> {
    let (base, path) = flatten_path(expr)?;
    let target = scope.lookup(base).ok_or_else(|| {
        ForgeError::InvariantViolation(format!("unbound identifier '{}' in rendered expression", base))
    })?;
    match target {
        AliasTarget::Row(alias) => match path.as_slice() {
            [col] => Ok(format!(
                "{}.{}",
                ctx.sql_gen.quote_identifier(alias),
                ctx.sql_gen.quote_identifier(col)
            )),
            _ => Err(ForgeError::InvariantViolation(format!(
                "row binder '{}' used without a single column access",
                base
            ))),
        },
        AliasTarget::Scalar(alias) => match path.as_slice() {
            [] => Ok(format!(
                "{}.{}",
                ctx.sql_gen.quote_identifier(alias),
                ctx.sql_gen.quote_identifier("value")
            )),
            _ => Err(ForgeError::InvariantViolation(format!(
                "scalar binder '{}' has no fields to access",
                base
            ))),
        },
        AliasTarget::Pair(sides) => match path.as_slice() {
            // A side that projects a single scalar exposes it as `value`.
            [side] => {
                let alias = sides.get(side.as_str()).ok_or_else(|| {
                    ForgeError::InvariantViolation(format!(
                        "unknown join side '{}' on binder '{}'",
                        side, base
                    ))
                })?;
                Ok(format!(
                    "{}.{}",
                    ctx.sql_gen.quote_identifier(alias),
                    ctx.sql_gen.quote_identifier("value")
                ))
            }
            [side, col] => {
                let alias = sides.get(side.as_str()).ok_or_else(|| {
                    ForgeError::InvariantViolation(format!(
                        "unknown join side '{}' on binder '{}'",
                        side, base
                    ))
                })?;
                Ok(format!(
                    "{}.{}",
                    ctx.sql_gen.quote_identifier(alias),
                    ctx.sql_gen.quote_identifier(col)
                ))
            }
            _ => Err(ForgeError::InvariantViolation(format!(
                "join binder '{}' requires a side and a column access",
                base
            ))),
        },
        AliasTarget::Columns { prefix } => match path.as_slice() {
            [col] => {
                let quoted = ctx.sql_gen.quote_identifier(col);
                Ok(match prefix {
                    Some(p) => format!("{}.{}", p, quoted),
                    None => quoted,
                })
            }
            _ => Err(ForgeError::InvariantViolation(format!(
                "column binder '{}' used without a single column access",
                base
            ))),
        },
    }
}

/// Flatten `Property(Property(Ident(x), "a"), "b")` into `(x, ["a", "b"])`.
fn flatten_path(expr: &Expr) -> ForgeResult<(&str, Vec<String>)> {
    match expr {
        Expr::Ident(ident) => Ok((ident.name.as_str(), Vec::new())),
        Expr::Property { base, name } => {
            let (root, mut path) = flatten_path(base)?;
            path.push(name.clone());
            Ok((root, path))
        }
        other => Err(ForgeError::InvariantViolation(format!(
            "expected a column path, found {:?}",
            other
        ))),
    }
}
