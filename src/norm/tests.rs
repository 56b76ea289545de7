//! Normalizer tests: rule behavior, idempotence, type preservation.

use crate::ast::builders::*;
use crate::ast::{
    Action, BinaryOperator, ConflictAction, Expr, OnConflict, ProductType, Query, Returning,
    ValueKind,
};
use crate::error::ForgeError;
use crate::norm::{normalize, normalize_action};
use crate::typer;
use pretty_assertions::assert_eq;

fn person() -> ProductType {
    row_type(
        "Person",
        &[
            ("name", ValueKind::String),
            ("age", ValueKind::Int),
        ],
    )
}

#[test]
fn test_filter_fusion() {
    let x = ident("x", person());
    let y = ident("y", person());
    let q = filter(
        filter(
            entity("Person", person()),
            x.clone(),
            gt(prop(&x, "age"), lit(10)),
        ),
        y.clone(),
        lt(prop(&y, "age"), lit(50)),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        and(
            gt(prop(&x, "age"), lit(10)),
            lt(prop(&x, "age"), lit(50)),
        ),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_filter_fusion_keeps_inner_predicate_first() {
    let x = ident("x", person());
    let y = ident("y", person());
    let q = filter(
        filter(
            entity("Person", person()),
            x.clone(),
            gt(prop(&x, "age"), lit(10)),
        ),
        y.clone(),
        eq(prop(&y, "name"), lit("ada")),
    );
    let Query::Filter { predicate, .. } = normalize(q).unwrap() else {
        panic!("expected a filter");
    };
    let Expr::Binary { left, op, .. } = predicate else {
        panic!("expected a conjunction");
    };
    assert_eq!(op, BinaryOperator::And);
    assert_eq!(*left, gt(prop(&x, "age"), lit(10)));
}

#[test]
fn test_map_fusion() {
    let x = ident("x", person());
    let y = ident("y", ValueKind::String);
    let q = map(
        map(entity("Person", person()), x.clone(), prop(&x, "name")),
        y.clone(),
        Expr::binary(
            Expr::Ident(y.clone()),
            BinaryOperator::Concat,
            lit("!"),
        ),
    );
    let expected = map(
        entity("Person", person()),
        x.clone(),
        Expr::binary(prop(&x, "name"), BinaryOperator::Concat, lit("!")),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_filter_pushdown_through_map() {
    let x = ident("x", person());
    let y = ident("y", ValueKind::Int);
    let q = filter(
        map(entity("Person", person()), x.clone(), prop(&x, "age")),
        y.clone(),
        gt(Expr::Ident(y.clone()), lit(10)),
    );
    let expected = map(
        filter(
            entity("Person", person()),
            x.clone(),
            gt(prop(&x, "age"), lit(10)),
        ),
        x.clone(),
        prop(&x, "age"),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_beta_reduction_in_filter_body() {
    let x = ident("x", person());
    let p = ident("p", person());
    let pred_fn = Expr::function(vec![p.clone()], gt(prop(&p, "age"), lit(21)));
    let q = filter(
        entity("Person", person()),
        x.clone(),
        Expr::apply(pred_fn, vec![Expr::Ident(x.clone())]),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&x, "age"), lit(21)),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_boolean_identity_elimination() {
    let x = ident("x", person());
    let q = filter(
        entity("Person", person()),
        x.clone(),
        and(lit(true), gt(prop(&x, "age"), lit(10))),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&x, "age"), lit(10)),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_double_negation_elimination() {
    let x = ident("x", person());
    let q = filter(
        entity("Person", person()),
        x.clone(),
        not(not(gt(prop(&x, "age"), lit(10)))),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&x, "age"), lit(10)),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_de_morgan_normalization() {
    let x = ident("x", person());
    let a = gt(prop(&x, "age"), lit(10));
    let b = eq(prop(&x, "name"), lit("ada"));
    let q = filter(
        entity("Person", person()),
        x.clone(),
        not(and(a.clone(), b.clone())),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        or(not(a), not(b)),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_constant_folding_arithmetic() {
    let x = ident("x", person());
    let q = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&x, "age"), add(lit(1), lit(1))),
    );
    let expected = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&x, "age"), lit(2)),
    );
    assert_eq!(normalize(q).unwrap(), expected);
}

#[test]
fn test_nested_boundary_inserted_over_distinct() {
    let x = ident("x", person());
    let q = filter(
        distinct(entity("Person", person())),
        x.clone(),
        gt(prop(&x, "age"), lit(10)),
    );
    let normalized = normalize(q).unwrap();
    let Query::Filter { source, .. } = &normalized else {
        panic!("expected a filter");
    };
    assert!(matches!(source.as_ref(), Query::Nested { .. }));
}

#[test]
fn test_nested_marker_never_removed() {
    let x = ident("x", person());
    let q = map(
        nested(filter(
            entity("Person", person()),
            x.clone(),
            gt(prop(&x, "age"), lit(10)),
        )),
        x.clone(),
        prop(&x, "name"),
    );
    let normalized = normalize(q).unwrap();
    let Query::Map { source, .. } = &normalized else {
        panic!("expected a map");
    };
    assert!(matches!(source.as_ref(), Query::Nested { .. }));
}

#[test]
fn test_fusion_blocked_by_nested_boundary() {
    let x = ident("x", person());
    let y = ident("y", person());
    let q = filter(
        nested(filter(
            entity("Person", person()),
            x.clone(),
            gt(prop(&x, "age"), lit(10)),
        )),
        y.clone(),
        lt(prop(&y, "age"), lit(50)),
    );
    let normalized = normalize(q.clone()).unwrap();
    // The outer filter still sits above the boundary.
    assert!(matches!(
        &normalized,
        Query::Filter { source, .. } if matches!(source.as_ref(), Query::Nested { .. })
    ));
}

#[test]
fn test_idempotence() {
    let x = ident("x", person());
    let y = ident("y", person());
    let q = filter(
        filter(
            map(
                map(entity("Person", person()), x.clone(), Expr::Ident(x.clone())),
                x.clone(),
                Expr::Ident(x.clone()),
            ),
            x.clone(),
            and(lit(true), gt(prop(&x, "age"), lit(10))),
        ),
        y.clone(),
        not(not(lt(prop(&y, "age"), lit(50)))),
    );
    let once = normalize(q).unwrap();
    let twice = normalize(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_type_preserved_across_normalization() {
    let x = ident("x", person());
    let y = ident("y", ValueKind::Int);
    let q = filter(
        map(entity("Person", person()), x.clone(), prop(&x, "age")),
        y.clone(),
        gt(Expr::Ident(y.clone()), lit(0)),
    );
    let before = typer::resolve_type(&q).unwrap();
    let normalized = normalize(q).unwrap();
    assert_eq!(typer::resolve_type(&normalized).unwrap(), before);
}

#[test]
fn test_malformed_tree_rejected_whole() {
    let x = ident("x", person());
    // Predicate references an identifier bound nowhere.
    let z = ident("z", person());
    let q = filter(
        entity("Person", person()),
        x.clone(),
        gt(prop(&z, "age"), lit(10)),
    );
    let err = normalize(q).unwrap_err();
    assert!(matches!(err, ForgeError::Normalization { .. }));
}

#[test]
fn test_unreducible_application_rejected() {
    let x = ident("x", person());
    let q = filter(
        entity("Person", person()),
        x.clone(),
        Expr::apply(prop(&x, "age"), vec![lit(1)]),
    );
    let err = normalize(q).unwrap_err();
    // Malformed before the rules even run: resolve_type sees the
    // non-lambda application first.
    assert!(matches!(
        err,
        ForgeError::Normalization { .. } | ForgeError::UnreducibleApplication(_)
    ));
}

#[test]
fn test_when_branch_pruning() {
    let x = ident("x", person());
    let q = map(
        entity("Person", person()),
        x.clone(),
        Expr::When {
            branches: vec![
                (lit(false), lit(0)),
                (gt(prop(&x, "age"), lit(18)), lit(1)),
            ],
            otherwise: Box::new(lit(2)),
        },
    );
    let Query::Map { body, .. } = normalize(q).unwrap() else {
        panic!("expected a map");
    };
    let Expr::When { branches, .. } = body else {
        panic!("expected a when");
    };
    assert_eq!(branches.len(), 1);
}

#[test]
fn test_normalize_action_reduces_assignment_exprs() {
    let x = ident("x", ValueKind::Int);
    let action = Action::Insert {
        entity: "users".to_string(),
        assignments: vec![(
            "age".to_string(),
            Expr::apply(
                Expr::function(vec![x.clone()], add(Expr::Ident(x.clone()), lit(1))),
                vec![lit(41)],
            ),
        )],
        on_conflict: None,
        returning: Returning::None,
    };
    let Action::Insert { assignments, .. } = normalize_action(action).unwrap() else {
        panic!("expected an insert");
    };
    assert_eq!(assignments[0].1, lit(42));
}

#[test]
fn test_normalize_action_reaches_upsert_assignments() {
    let action = Action::Insert {
        entity: "users".to_string(),
        assignments: vec![("age".to_string(), lit(30))],
        on_conflict: Some(OnConflict {
            columns: vec!["id".to_string()],
            action: ConflictAction::DoUpdate {
                assignments: vec![("age".to_string(), add(lit(40), lit(2)))],
            },
        }),
        returning: Returning::None,
    };
    let Action::Insert { on_conflict, .. } = normalize_action(action).unwrap() else {
        panic!("expected an insert");
    };
    let Some(OnConflict {
        action: ConflictAction::DoUpdate { assignments },
        ..
    }) = on_conflict
    else {
        panic!("expected a do-update conflict action");
    };
    assert_eq!(assignments[0].1, lit(42));
}
