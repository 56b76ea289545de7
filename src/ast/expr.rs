use crate::ast::{BinaryOperator, ConstValue, IrType, UnaryOperator, ValueKind};
use serde::{Deserialize, Serialize};

/// A bound variable: its name and the type it was bound at.
///
/// Identifiers are compared by name within a scope; binders introduce them
/// (`Map`, `Filter`, lambda params) and substitution renames them when a
/// rewrite would otherwise capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub ty: IrType,
}

impl Ident {
    pub fn new(name: impl Into<String>, ty: impl Into<IrType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Same binding site, different name. Used by alpha-renaming.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: self.ty.clone(),
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal of a primitive kind.
    Const(ConstValue),
    /// Reference to a bound variable.
    Ident(Ident),
    /// Field projection off a product-typed expression.
    Property { base: Box<Expr>, name: String },
    /// left op right
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// op expr
    Unary { op: UnaryOperator, expr: Box<Expr> },
    /// A lambda application pending beta-reduction.
    Apply { func: Box<Expr>, args: Vec<Expr> },
    /// A lambda value.
    Function { params: Vec<Ident>, body: Box<Expr> },
    /// Conditional: branches evaluated in order, first true guard wins.
    /// The else branch is mandatory so the expression is total.
    When {
        branches: Vec<(Expr, Expr)>,
        otherwise: Box<Expr>,
    },
    /// Row construction. Field order is significant and preserved.
    Product { fields: Vec<(String, Expr)> },
    /// A bind-site marker; rendering collects these in traversal order to
    /// build the positional parameter list.
    Param { name: String, ty: ValueKind },
}

impl Expr {
    pub fn ident(name: impl Into<String>, ty: impl Into<IrType>) -> Self {
        Expr::Ident(Ident::new(name, ty))
    }

    pub fn property(base: Expr, name: impl Into<String>) -> Self {
        Expr::Property {
            base: Box::new(base),
            name: name.into(),
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn apply(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Apply {
            func: Box::new(func),
            args,
        }
    }

    pub fn function(params: Vec<Ident>, body: Expr) -> Self {
        Expr::Function {
            params,
            body: Box::new(body),
        }
    }

    pub fn param(name: impl Into<String>, ty: ValueKind) -> Self {
        Expr::Param {
            name: name.into(),
            ty,
        }
    }

    /// True for `Const(Bool(b))` matching `b`.
    pub fn is_bool_const(&self, b: bool) -> bool {
        matches!(self, Expr::Const(ConstValue::Bool(v)) if *v == b)
    }
}
