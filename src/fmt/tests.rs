use pretty_assertions::assert_eq;

use super::{dump_action, dump_tree, expr_text};
use crate::ast::builders::*;
use crate::ast::{Action, Returning, ValueKind};

fn user_entity() -> crate::ast::Query {
    entity(
        "users",
        row_type(
            "User",
            &[("id", ValueKind::Int), ("age", ValueKind::Int)],
        ),
    )
}

#[test]
fn test_dump_filter_tree() {
    let x = ident("x", ValueKind::Int);
    let q = filter(user_entity(), x.clone(), gt(prop(&x, "age"), lit(18)));
    assert_eq!(
        dump_tree(&q),
        "Filter x if (x.age > 18)\n  Entity users : User\n"
    );
}

#[test]
fn test_dump_nested_pipeline() {
    let x = ident("x", ValueKind::Int);
    let q = take(
        map(
            filter(user_entity(), x.clone(), gt(prop(&x, "age"), lit(18))),
            x.clone(),
            prop(&x, "id"),
        ),
        lit(10),
    );
    assert_eq!(
        dump_tree(&q),
        "Take 10\n  Map x -> x.id\n    Filter x if (x.age > 18)\n      Entity users : User\n"
    );
}

#[test]
fn test_dump_is_deterministic() {
    let x = ident("x", ValueKind::Int);
    let q = distinct(filter(user_entity(), x.clone(), gt(prop(&x, "age"), lit(18))));
    assert_eq!(dump_tree(&q), dump_tree(&q));
}

#[test]
fn test_expr_text_shapes() {
    let x = ident("x", ValueKind::Int);
    assert_eq!(expr_text(&lit(1)), "1");
    assert_eq!(expr_text(&lit("hi")), "'hi'");
    assert_eq!(
        expr_text(&and(gt(prop(&x, "age"), lit(18)), not(prop(&x, "banned")))),
        "((x.age > 18) AND (NOT x.banned))"
    );
    assert_eq!(
        expr_text(&product(vec![("id", prop(&x, "id"))])),
        "{id: x.id}"
    );
    assert_eq!(expr_text(&param("n", ValueKind::Int)), "$n:int");
}

#[test]
fn test_json_dump_round_trips() {
    let x = ident("x", ValueKind::Int);
    let q = filter(user_entity(), x.clone(), gt(prop(&x, "age"), lit(18)));
    let json = super::dump_json(&q).unwrap();
    let parsed: crate::ast::Query = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, q);
}

#[test]
fn test_dump_action() {
    let action = Action::Insert {
        entity: "users".to_string(),
        assignments: vec![("age".to_string(), lit(30))],
        on_conflict: None,
        returning: Returning::Keys,
    };
    assert_eq!(
        dump_action(&action),
        "Insert users\n  set age = 30\n  returning keys\n"
    );
}
