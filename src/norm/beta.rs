//! Rule 1: resolve pending lambda applications.

use crate::ast::Expr;
use crate::error::ForgeResult;
use crate::subst::{beta_reduce, FreshNames};

/// Reduce every `Apply` inside `expr`, bottom-up, so that the function
/// position is in normal form before the application itself is reduced.
/// An application whose function position is still not a lambda after its
/// own reduction is unreducible and fails the whole call.
pub fn reduce_exprs(expr: &Expr, fresh: &mut FreshNames) -> ForgeResult<(Expr, bool)> {
    match expr {
        Expr::Const(_) | Expr::Ident(_) | Expr::Param { .. } => Ok((expr.clone(), false)),
        Expr::Property { base, name } => {
            let (base, changed) = reduce_exprs(base, fresh)?;
            Ok((
                Expr::Property {
                    base: Box::new(base),
                    name: name.clone(),
                },
                changed,
            ))
        }
        Expr::Binary { left, op, right } => {
            let (left, lc) = reduce_exprs(left, fresh)?;
            let (right, rc) = reduce_exprs(right, fresh)?;
            Ok((
                Expr::Binary {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                },
                lc || rc,
            ))
        }
        Expr::Unary { op, expr } => {
            let (inner, changed) = reduce_exprs(expr, fresh)?;
            Ok((
                Expr::Unary {
                    op: *op,
                    expr: Box::new(inner),
                },
                changed,
            ))
        }
        Expr::Apply { func, args } => {
            let (func, _) = reduce_exprs(func, fresh)?;
            let mut reduced_args = Vec::with_capacity(args.len());
            for arg in args {
                let (arg, _) = reduce_exprs(arg, fresh)?;
                reduced_args.push(arg);
            }
            let result = beta_reduce(&func, &reduced_args, fresh)?;
            // The substituted body may itself contain applications.
            let (result, _) = reduce_exprs(&result, fresh)?;
            Ok((result, true))
        }
        Expr::Function { params, body } => {
            let (body, changed) = reduce_exprs(body, fresh)?;
            Ok((
                Expr::Function {
                    params: params.clone(),
                    body: Box::new(body),
                },
                changed,
            ))
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            let mut changed = false;
            let mut out = Vec::with_capacity(branches.len());
            for (guard, value) in branches {
                let (guard, gc) = reduce_exprs(guard, fresh)?;
                let (value, vc) = reduce_exprs(value, fresh)?;
                changed |= gc || vc;
                out.push((guard, value));
            }
            let (otherwise, oc) = reduce_exprs(otherwise, fresh)?;
            Ok((
                Expr::When {
                    branches: out,
                    otherwise: Box::new(otherwise),
                },
                changed || oc,
            ))
        }
        Expr::Product { fields } => {
            let mut changed = false;
            let mut out = Vec::with_capacity(fields.len());
            for (name, e) in fields {
                let (e, c) = reduce_exprs(e, fresh)?;
                changed |= c;
                out.push((name.clone(), e));
            }
            Ok((Expr::Product { fields: out }, changed))
        }
    }
}
