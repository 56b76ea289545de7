use pretty_assertions::assert_eq;

use crate::ast::builders::*;
use crate::ast::{BinaryOperator, Expr, ValueKind};
use crate::transpiler::{render_expr, AliasTarget, Dialect, RenderContext, Scope};

fn col(name: &str) -> Expr {
    Expr::property(Expr::ident("row", ValueKind::Bool), name)
}

fn pg(expr: &Expr) -> String {
    let sql_gen = Dialect::Postgres.generator();
    let mut ctx = RenderContext::new(sql_gen.as_ref());
    let scope = Scope::new().with("row", AliasTarget::Columns { prefix: None });
    render_expr(expr, &scope, &mut ctx).unwrap()
}

#[test]
fn test_parens_only_when_binding_changes() {
    assert_eq!(pg(&mul(add(lit(1), lit(2)), lit(3))), "(1 + 2) * 3");
    assert_eq!(pg(&add(lit(1), mul(lit(2), lit(3)))), "1 + 2 * 3");
}

#[test]
fn test_left_associative_chains_stay_flat() {
    assert_eq!(pg(&add(add(lit(1), lit(2)), lit(3))), "1 + 2 + 3");
    assert_eq!(pg(&and(and(col("a"), col("b")), col("c"))), "a AND b AND c");
}

#[test]
fn test_non_associative_right_child_keeps_parens() {
    let e = Expr::binary(
        lit(10),
        BinaryOperator::Sub,
        Expr::binary(lit(5), BinaryOperator::Sub, lit(2)),
    );
    assert_eq!(pg(&e), "10 - (5 - 2)");
}

#[test]
fn test_associative_right_child_stays_flat() {
    assert_eq!(pg(&add(lit(1), add(lit(2), lit(3)))), "1 + 2 + 3");
    assert_eq!(pg(&and(col("a"), and(col("b"), col("c")))), "a AND b AND c");
}

#[test]
fn test_or_under_and_keeps_parens() {
    assert_eq!(pg(&and(or(col("a"), col("b")), col("c"))), "(a OR b) AND c");
    assert_eq!(pg(&or(col("a"), and(col("b"), col("c")))), "a OR b AND c");
}

#[test]
fn test_not_groups_looser_operands() {
    assert_eq!(pg(&not(and(col("a"), col("b")))), "NOT (a AND b)");
    assert_eq!(pg(&not(eq(col("a"), col("b")))), "NOT a = b");
}

#[test]
fn test_neg_groups_arithmetic() {
    assert_eq!(pg(&neg(add(col("a"), lit(1)))), "-(a + 1)");
    assert_eq!(pg(&neg(lit(7))), "-7");
}

#[test]
fn test_comparison_over_arithmetic_stays_flat() {
    assert_eq!(pg(&eq(add(col("a"), col("b")), col("c"))), "a + b = c");
}

#[test]
fn test_case_expression() {
    let e = Expr::When {
        branches: vec![(gt(col("age"), lit(18)), lit("adult"))],
        otherwise: Box::new(lit("minor")),
    };
    assert_eq!(
        pg(&e),
        "CASE WHEN age > 18 THEN 'adult' ELSE 'minor' END"
    );
}

#[test]
fn test_string_literal_escaping() {
    assert_eq!(pg(&lit("it's")), "'it''s'");
}

#[test]
fn test_params_number_in_traversal_order() {
    let sql_gen = Dialect::Postgres.generator();
    let mut ctx = RenderContext::new(sql_gen.as_ref());
    let scope = Scope::new();
    let e = add(param("a", ValueKind::Int), param("b", ValueKind::Int));
    assert_eq!(render_expr(&e, &scope, &mut ctx).unwrap(), "$1 + $2");
    let names: Vec<&str> = ctx.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
