//! Rule 5: local boolean and arithmetic simplification.
//!
//! Constant folding, identity elimination, double negation, De Morgan
//! normalization, and dead `When` branch pruning. Purely local; applied to
//! any expression regardless of query context.

use crate::ast::{BinaryOperator, ConstValue, Expr, UnaryOperator};

/// Simplify bottom-up until this subtree is stable. Returns the rewritten
/// expression and whether anything fired.
pub fn simplify_expr(expr: &Expr) -> (Expr, bool) {
    let (expr, changed) = simplify_once(expr);
    if changed {
        // Folding can expose further folds (e.g. !!x after De Morgan).
        let (expr, _) = simplify_expr(&expr);
        (expr, true)
    } else {
        (expr, false)
    }
}

fn simplify_once(expr: &Expr) -> (Expr, bool) {
    match expr {
        Expr::Const(_) | Expr::Ident(_) | Expr::Param { .. } => (expr.clone(), false),
        Expr::Property { base, name } => {
            let (base, changed) = simplify_once(base);
            (
                Expr::Property {
                    base: Box::new(base),
                    name: name.clone(),
                },
                changed,
            )
        }
        Expr::Binary { left, op, right } => {
            let (left, lc) = simplify_once(left);
            let (right, rc) = simplify_once(right);
            let (folded, fc) = fold_binary(left, *op, right);
            (folded, lc || rc || fc)
        }
        Expr::Unary { op, expr } => {
            let (inner, ic) = simplify_once(expr);
            let (folded, fc) = fold_unary(*op, inner);
            (folded, ic || fc)
        }
        Expr::Apply { func, args } => {
            let (func, fc) = simplify_once(func);
            let mut changed = fc;
            let args = args
                .iter()
                .map(|a| {
                    let (a, c) = simplify_once(a);
                    changed |= c;
                    a
                })
                .collect();
            (
                Expr::Apply {
                    func: Box::new(func),
                    args,
                },
                changed,
            )
        }
        Expr::Function { params, body } => {
            let (body, changed) = simplify_once(body);
            (
                Expr::Function {
                    params: params.clone(),
                    body: Box::new(body),
                },
                changed,
            )
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            let mut changed = false;
            let mut kept: Vec<(Expr, Expr)> = Vec::with_capacity(branches.len());
            let (otherwise, oc) = simplify_once(otherwise);
            changed |= oc;
            for (guard, value) in branches {
                let (guard, gc) = simplify_once(guard);
                let (value, vc) = simplify_once(value);
                changed |= gc || vc;
                if guard.is_bool_const(false) {
                    // Dead branch.
                    changed = true;
                    continue;
                }
                let always_true = guard.is_bool_const(true);
                kept.push((guard, value));
                if always_true {
                    // Later branches and the else can never be reached.
                    break;
                }
            }
            match kept.first() {
                Some((guard, value)) if kept.len() == 1 && guard.is_bool_const(true) => {
                    (value.clone(), true)
                }
                None => (otherwise, true),
                _ => {
                    let last_always_true =
                        matches!(kept.last(), Some((guard, _)) if guard.is_bool_const(true));
                    let otherwise = if last_always_true {
                        changed = true;
                        match kept.pop() {
                            Some((_, value)) => value,
                            None => otherwise,
                        }
                    } else {
                        otherwise
                    };
                    (
                        Expr::When {
                            branches: kept,
                            otherwise: Box::new(otherwise),
                        },
                        changed,
                    )
                }
            }
        }
        Expr::Product { fields } => {
            let mut changed = false;
            let fields = fields
                .iter()
                .map(|(name, e)| {
                    let (e, c) = simplify_once(e);
                    changed |= c;
                    (name.clone(), e)
                })
                .collect();
            (Expr::Product { fields }, changed)
        }
    }
}

fn fold_binary(left: Expr, op: BinaryOperator, right: Expr) -> (Expr, bool) {
    use BinaryOperator::*;
    match op {
        And => {
            if left.is_bool_const(true) {
                return (right, true);
            }
            if right.is_bool_const(true) {
                return (left, true);
            }
            if left.is_bool_const(false) || right.is_bool_const(false) {
                return (Expr::Const(ConstValue::Bool(false)), true);
            }
        }
        Or => {
            if left.is_bool_const(false) {
                return (right, true);
            }
            if right.is_bool_const(false) {
                return (left, true);
            }
            if left.is_bool_const(true) || right.is_bool_const(true) {
                return (Expr::Const(ConstValue::Bool(true)), true);
            }
        }
        Add | Sub | Mul => {
            if let (Expr::Const(ConstValue::Int(a)), Expr::Const(ConstValue::Int(b))) =
                (&left, &right)
            {
                let folded = match op {
                    Add => a.checked_add(*b),
                    Sub => a.checked_sub(*b),
                    Mul => a.checked_mul(*b),
                    _ => unreachable!(),
                };
                // Overflow stays unfolded; the database evaluates it.
                if let Some(n) = folded {
                    return (Expr::Const(ConstValue::Int(n)), true);
                }
            }
        }
        Eq | Ne | Lt | Le | Gt | Ge => {
            if let (Expr::Const(ConstValue::Int(a)), Expr::Const(ConstValue::Int(b))) =
                (&left, &right)
            {
                let result = match op {
                    Eq => a == b,
                    Ne => a != b,
                    Lt => a < b,
                    Le => a <= b,
                    Gt => a > b,
                    Ge => a >= b,
                    _ => unreachable!(),
                };
                return (Expr::Const(ConstValue::Bool(result)), true);
            }
            if let (Expr::Const(ConstValue::Bool(a)), Expr::Const(ConstValue::Bool(b))) =
                (&left, &right)
            {
                let result = match op {
                    Eq => a == b,
                    Ne => a != b,
                    _ => return (Expr::binary(left, op, right), false),
                };
                return (Expr::Const(ConstValue::Bool(result)), true);
            }
        }
        _ => {}
    }
    (Expr::binary(left, op, right), false)
}

fn fold_unary(op: UnaryOperator, inner: Expr) -> (Expr, bool) {
    match op {
        UnaryOperator::Not => {
            // !const
            if let Expr::Const(ConstValue::Bool(b)) = inner {
                return (Expr::Const(ConstValue::Bool(!b)), true);
            }
            // !!x
            if let Expr::Unary {
                op: UnaryOperator::Not,
                expr,
            } = &inner
            {
                return ((**expr).clone(), true);
            }
            // De Morgan: !(a && b) and !(a || b)
            if let Expr::Binary { left, op: bop, right } = &inner {
                match bop {
                    BinaryOperator::And => {
                        return (
                            Expr::binary(
                                Expr::unary(UnaryOperator::Not, (**left).clone()),
                                BinaryOperator::Or,
                                Expr::unary(UnaryOperator::Not, (**right).clone()),
                            ),
                            true,
                        );
                    }
                    BinaryOperator::Or => {
                        return (
                            Expr::binary(
                                Expr::unary(UnaryOperator::Not, (**left).clone()),
                                BinaryOperator::And,
                                Expr::unary(UnaryOperator::Not, (**right).clone()),
                            ),
                            true,
                        );
                    }
                    _ => {}
                }
            }
        }
        UnaryOperator::Neg => {
            if let Expr::Const(ConstValue::Int(n)) = inner {
                if let Some(neg) = n.checked_neg() {
                    return (Expr::Const(ConstValue::Int(neg)), true);
                }
            }
            if let Expr::Const(ConstValue::Float(f)) = inner {
                return (Expr::Const(ConstValue::Float(-f)), true);
            }
        }
    }
    (Expr::unary(op, inner), false)
}
