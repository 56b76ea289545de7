//! Capture-avoiding substitution and beta-reduction.
//!
//! `substitute` replaces free occurrences of a binder inside an expression,
//! leaving occurrences under a shadowing binder of the same name untouched.
//! When the argument carries a free identifier that collides with an inner
//! binder, that binder is alpha-renamed to a fresh name before descending.

use crate::ast::{Expr, Ident};
use crate::error::{ForgeError, ForgeResult};
use std::collections::BTreeSet;

/// Call-scoped fresh-name source for alpha-renaming. Names are derived from
/// the colliding binder plus a monotonically increasing counter, skipping
/// anything already in use.
#[derive(Debug, Default)]
pub struct FreshNames {
    counter: usize,
}

impl FreshNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a name based on `base` that does not occur in `used`.
    pub fn fresh(&mut self, base: &str, used: &BTreeSet<String>) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{}{}", base, self.counter);
            if !used.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// Every identifier name occurring free in `expr`.
pub fn free_idents(expr: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_free(expr, &mut BTreeSet::new(), &mut out);
    out
}

fn collect_free(expr: &Expr, bound: &mut BTreeSet<String>, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Const(_) | Expr::Param { .. } => {}
        Expr::Ident(id) => {
            if !bound.contains(&id.name) {
                out.insert(id.name.clone());
            }
        }
        Expr::Property { base, .. } => collect_free(base, bound, out),
        Expr::Binary { left, right, .. } => {
            collect_free(left, bound, out);
            collect_free(right, bound, out);
        }
        Expr::Unary { expr, .. } => collect_free(expr, bound, out),
        Expr::Apply { func, args } => {
            collect_free(func, bound, out);
            for arg in args {
                collect_free(arg, bound, out);
            }
        }
        Expr::Function { params, body } => {
            let added: Vec<String> = params
                .iter()
                .filter(|p| bound.insert(p.name.clone()))
                .map(|p| p.name.clone())
                .collect();
            collect_free(body, bound, out);
            for name in added {
                bound.remove(&name);
            }
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            for (guard, value) in branches {
                collect_free(guard, bound, out);
                collect_free(value, bound, out);
            }
            collect_free(otherwise, bound, out);
        }
        Expr::Product { fields } => {
            for (_, e) in fields {
                collect_free(e, bound, out);
            }
        }
    }
}

/// Every identifier name occurring in `expr`, free or bound. Used to seed
/// the fresh-name exclusion set.
pub fn all_idents(expr: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_all(expr, &mut out);
    out
}

fn collect_all(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Const(_) | Expr::Param { .. } => {}
        Expr::Ident(id) => {
            out.insert(id.name.clone());
        }
        Expr::Property { base, .. } => collect_all(base, out),
        Expr::Binary { left, right, .. } => {
            collect_all(left, out);
            collect_all(right, out);
        }
        Expr::Unary { expr, .. } => collect_all(expr, out),
        Expr::Apply { func, args } => {
            collect_all(func, out);
            for arg in args {
                collect_all(arg, out);
            }
        }
        Expr::Function { params, body } => {
            for p in params {
                out.insert(p.name.clone());
            }
            collect_all(body, out);
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            for (guard, value) in branches {
                collect_all(guard, out);
                collect_all(value, out);
            }
            collect_all(otherwise, out);
        }
        Expr::Product { fields } => {
            for (_, e) in fields {
                collect_all(e, out);
            }
        }
    }
}

/// Replace every free occurrence of `binder` inside `target` with
/// `argument`.
pub fn substitute(target: &Expr, binder: &Ident, argument: &Expr, fresh: &mut FreshNames) -> Expr {
    match target {
        Expr::Const(_) | Expr::Param { .. } => target.clone(),
        Expr::Ident(id) => {
            if id.name == binder.name {
                argument.clone()
            } else {
                target.clone()
            }
        }
        Expr::Property { base, name } => Expr::Property {
            base: Box::new(substitute(base, binder, argument, fresh)),
            name: name.clone(),
        },
        Expr::Binary { left, op, right } => Expr::Binary {
            left: Box::new(substitute(left, binder, argument, fresh)),
            op: *op,
            right: Box::new(substitute(right, binder, argument, fresh)),
        },
        Expr::Unary { op, expr } => Expr::Unary {
            op: *op,
            expr: Box::new(substitute(expr, binder, argument, fresh)),
        },
        Expr::Apply { func, args } => Expr::Apply {
            func: Box::new(substitute(func, binder, argument, fresh)),
            args: args
                .iter()
                .map(|a| substitute(a, binder, argument, fresh))
                .collect(),
        },
        Expr::Function { params, body } => {
            // Shadowed: the binder is rebound here, stop descending.
            if params.iter().any(|p| p.name == binder.name) {
                return target.clone();
            }
            let arg_free = free_idents(argument);
            let mut params = params.clone();
            let mut body = (**body).clone();
            for param in params.iter_mut() {
                if arg_free.contains(&param.name) {
                    // Capture: rename this param before substituting into
                    // the body.
                    let mut used = all_idents(&body);
                    used.extend(arg_free.iter().cloned());
                    used.insert(binder.name.clone());
                    let new_name = fresh.fresh(&param.name, &used);
                    let renamed = param.renamed(new_name);
                    body = substitute(&body, param, &Expr::Ident(renamed.clone()), fresh);
                    *param = renamed;
                }
            }
            Expr::Function {
                params,
                body: Box::new(substitute(&body, binder, argument, fresh)),
            }
        }
        Expr::When {
            branches,
            otherwise,
        } => Expr::When {
            branches: branches
                .iter()
                .map(|(guard, value)| {
                    (
                        substitute(guard, binder, argument, fresh),
                        substitute(value, binder, argument, fresh),
                    )
                })
                .collect(),
            otherwise: Box::new(substitute(otherwise, binder, argument, fresh)),
        },
        Expr::Product { fields } => Expr::Product {
            fields: fields
                .iter()
                .map(|(name, e)| (name.clone(), substitute(e, binder, argument, fresh)))
                .collect(),
        },
    }
}

/// Reduce an application of `func` to `args`, one parameter at a time.
///
/// The function position must already be a concrete `Function`; anything
/// else is an unreducible application. The normalizer reduces the function
/// position to normal form before calling this.
pub fn beta_reduce(func: &Expr, args: &[Expr], fresh: &mut FreshNames) -> ForgeResult<Expr> {
    let Expr::Function { params, body } = func else {
        return Err(ForgeError::UnreducibleApplication(format!(
            "function position is not a lambda: {:?}",
            variant_of(func)
        )));
    };
    if params.len() != args.len() {
        return Err(ForgeError::UnreducibleApplication(format!(
            "arity mismatch: {} params applied to {} args",
            params.len(),
            args.len()
        )));
    }
    // Folding substitutions left to right would let a later parameter
    // rewrite a free identifier inside an earlier argument. Renaming every
    // parameter that collides with an argument's free identifiers first
    // makes the sequential fold equivalent to simultaneous substitution.
    let mut args_free = BTreeSet::new();
    for arg in args {
        args_free.extend(free_idents(arg));
    }
    let mut params = params.clone();
    let mut body = (**body).clone();
    for param in params.iter_mut() {
        if args_free.contains(&param.name) {
            let mut used = all_idents(&body);
            used.extend(args_free.iter().cloned());
            let new_name = fresh.fresh(&param.name, &used);
            let renamed = param.renamed(new_name);
            body = substitute(&body, param, &Expr::Ident(renamed.clone()), fresh);
            *param = renamed;
        }
    }
    let mut result = body;
    for (param, arg) in params.iter().zip(args) {
        result = substitute(&result, param, arg, fresh);
    }
    Ok(result)
}

fn variant_of(expr: &Expr) -> &'static str {
    match expr {
        Expr::Const(_) => "Const",
        Expr::Ident(_) => "Ident",
        Expr::Property { .. } => "Property",
        Expr::Binary { .. } => "Binary",
        Expr::Unary { .. } => "Unary",
        Expr::Apply { .. } => "Apply",
        Expr::Function { .. } => "Function",
        Expr::When { .. } => "When",
        Expr::Product { .. } => "Product",
        Expr::Param { .. } => "Param",
    }
}
