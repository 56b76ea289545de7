use pretty_assertions::assert_eq;

use super::{u, users};
use crate::ast::builders::*;
use crate::ast::ValueKind;
use crate::transpiler::{render, Dialect};

#[test]
fn test_mysql_backticks_and_placeholder() {
    let q = filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int)));
    let rendered = render(&q, Dialect::MySql).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT `u`.* FROM `users` `u` WHERE `u`.`age` > ?"
    );
}

#[test]
fn test_sqlite_quotes_and_placeholder() {
    let q = filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int)));
    let rendered = render(&q, Dialect::Sqlite).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT \"u\".* FROM \"users\" \"u\" WHERE \"u\".\"age\" > ?"
    );
}

#[test]
fn test_sqlserver_offset_fetch() {
    let q = take(drop(users(), lit(5)), lit(10));
    let rendered = render(&q, Dialect::SqlServer).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM [users] OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_sqlserver_take_without_drop_gets_zero_offset() {
    let q = take(users(), lit(10));
    let rendered = render(&q, Dialect::SqlServer).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM [users] OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_oracle_fetch_and_numbered_placeholder() {
    let q = take(
        filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int))),
        lit(10),
    );
    let rendered = render(&q, Dialect::Oracle).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT \"u\".* FROM \"users\" \"u\" WHERE \"u\".\"age\" > :1 FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_mysql_offset_without_limit() {
    let q = drop(users(), lit(5));
    let rendered = render(&q, Dialect::MySql).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM `users` LIMIT 18446744073709551615 OFFSET 5"
    );
}

#[test]
fn test_h2_bool_literal() {
    let q = filter(users(), u(), eq(prop(&u(), "active"), lit(true)));
    let rendered = render(&q, Dialect::H2).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT \"u\".* FROM \"users\" \"u\" WHERE \"u\".\"active\" = true"
    );
}

#[test]
fn test_mysql_bool_literal_is_numeric() {
    let q = filter(users(), u(), eq(prop(&u(), "active"), lit(true)));
    let rendered = render(&q, Dialect::MySql).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT `u`.* FROM `users` `u` WHERE `u`.`active` = 1"
    );
}

#[test]
fn test_postgres_quotes_reserved_words_only() {
    let ty = row_type("Thing", &[("order", ValueKind::Int)]);
    let t = ident("t", ty.clone());
    let q = filter(entity("order", ty), t.clone(), gt(prop(&t, "order"), lit(0)));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t.* FROM \"order\" t WHERE t.\"order\" > 0"
    );
}

#[test]
fn test_generic_dialect_uses_question_marks() {
    let q = filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int)));
    let rendered = render(&q, Dialect::Generic).unwrap();
    assert_eq!(rendered.sql, "SELECT u.* FROM users u WHERE u.age > ?");
}

#[test]
fn test_every_dialect_renders_simple_queries() {
    let q = take(
        filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int))),
        lit(10),
    );
    for dialect in Dialect::all() {
        let rendered = render(&q, *dialect)
            .unwrap_or_else(|e| panic!("dialect {} failed: {}", dialect, e));
        assert!(rendered.sql.starts_with("SELECT "));
        assert_eq!(rendered.params.len(), 1);
    }
}
