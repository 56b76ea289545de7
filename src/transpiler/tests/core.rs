use pretty_assertions::assert_eq;

use super::{orders, u, user_type, users};
use crate::ast::builders::*;
use crate::ast::{AggKind, Expr, JoinKind, SortOrder, ValueKind};
use crate::error::ForgeError;
use crate::transpiler::{render, Dialect, ParamRef};

#[test]
fn test_render_bare_entity() {
    let rendered = render(&users(), Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT * FROM users");
    assert!(rendered.params.is_empty());
}

#[test]
fn test_render_filter_binds_table_alias() {
    let q = filter(users(), u(), gt(prop(&u(), "age"), lit(18)));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT u.* FROM users u WHERE u.age > 18");
}

#[test]
fn test_render_filter_with_param() {
    let q = filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int)));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT u.* FROM users u WHERE u.age > $1");
    assert_eq!(
        rendered.params,
        vec![ParamRef {
            name: "min_age".to_string(),
            ty: ValueKind::Int,
        }]
    );
}

#[test]
fn test_render_map_product_projection() {
    let q = map(
        users(),
        u(),
        product(vec![("id", prop(&u(), "id")), ("name", prop(&u(), "name"))]),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT u.id AS id, u.name AS name FROM users u");
}

#[test]
fn test_render_map_scalar_projection() {
    let q = map(users(), u(), prop(&u(), "age"));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT u.age FROM users u");
}

#[test]
fn test_render_identity_map_keeps_star() {
    let q = map(users(), u(), Expr::Ident(u()));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT u.* FROM users u");
}

#[test]
fn test_filter_over_projection_nests() {
    let projected = map(
        users(),
        u(),
        product(vec![("id", prop(&u(), "id")), ("name", prop(&u(), "name"))]),
    );
    let x = ident("x", user_type());
    let q = filter(projected, x.clone(), eq(prop(&x, "id"), lit(1)));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t0.* FROM (SELECT u.id AS id, u.name AS name FROM users u) t0 WHERE t0.id = 1"
    );
}

#[test]
fn test_render_sort_and_take() {
    let s = ident("s", user_type());
    let q = take(
        sort_by(
            filter(users(), u(), gt(prop(&u(), "age"), lit(18))),
            s.clone(),
            prop(&s, "name"),
            SortOrder::Desc,
        ),
        lit(10),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT u.* FROM users u WHERE u.age > 18 ORDER BY u.name DESC LIMIT 10"
    );
}

#[test]
fn test_render_take_over_drop() {
    let q = take(drop(users(), lit(5)), lit(10));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT * FROM users LIMIT 10 OFFSET 5");
}

#[test]
fn test_drop_over_take_nests() {
    // Dropping rows from an already-limited result must not merge the
    // bounds into one clause pair.
    let q = drop(take(users(), lit(10)), lit(5));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t0.* FROM (SELECT * FROM users LIMIT 10) t0 OFFSET 5"
    );
}

#[test]
fn test_render_distinct_projection() {
    let q = distinct(map(users(), u(), prop(&u(), "age")));
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT DISTINCT u.age FROM users u");
}

#[test]
fn test_filter_over_nested_distinct() {
    let x = ident("x", user_type());
    let q = filter(
        nested(distinct(users())),
        x.clone(),
        gt(prop(&x, "age"), lit(18)),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t0.* FROM (SELECT DISTINCT * FROM users) t0 WHERE t0.age > 18"
    );
}

#[test]
fn test_filter_over_nested_scalar_uses_value_column() {
    let v = ident("v", ValueKind::Int);
    let q = filter(
        nested(map(users(), u(), prop(&u(), "age"))),
        v.clone(),
        gt(Expr::Ident(v), lit(21)),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t0.* FROM (SELECT u.age AS value FROM users u) t0 WHERE t0.value > 21"
    );
}

#[test]
fn test_render_join_with_pair_projection() {
    let l = ident("u", user_type());
    let r = ident("o", super::order_type());
    let pair = ident("p", user_type());
    let q = map(
        join(
            JoinKind::Inner,
            users(),
            orders(),
            l.clone(),
            r.clone(),
            eq(prop(&l, "id"), prop(&r, "user_id")),
        ),
        pair.clone(),
        product(vec![
            ("name", Expr::property(prop(&pair, "u"), "name")),
            ("total", Expr::property(prop(&pair, "o"), "total")),
        ]),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT u.name AS name, o.total AS total FROM users u INNER JOIN orders o ON u.id = o.user_id"
    );
}

#[test]
fn test_render_left_join_keyword() {
    let l = ident("u", user_type());
    let r = ident("o", super::order_type());
    let q = join(
        JoinKind::Left,
        users(),
        orders(),
        l.clone(),
        r.clone(),
        eq(prop(&l, "id"), prop(&r, "user_id")),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM users u LEFT JOIN orders o ON u.id = o.user_id"
    );
}

#[test]
fn test_render_count_star() {
    let q = aggregation(users(), AggKind::Count);
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT COUNT(*) FROM users");
}

#[test]
fn test_render_sum_over_scalar_map() {
    let q = aggregation(map(users(), u(), prop(&u(), "age")), AggKind::Sum);
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(rendered.sql, "SELECT SUM(u.age) FROM users u");
}

#[test]
fn test_render_avg_over_nested_scalar() {
    let q = aggregation(nested(map(users(), u(), prop(&u(), "age"))), AggKind::Avg);
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT AVG(t0.value) FROM (SELECT u.age AS value FROM users u) t0"
    );
}

#[test]
fn test_render_union() {
    let q = union(
        filter(users(), u(), gt(prop(&u(), "age"), lit(65))),
        filter(users(), u(), lt(prop(&u(), "age"), lit(18))),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT u.* FROM users u WHERE u.age > 65 UNION SELECT u.* FROM users u WHERE u.age < 18"
    );
}

#[test]
fn test_render_union_all_of_scalars_nested() {
    let q = take(
        nested(union_all(
            map(users(), u(), prop(&u(), "age")),
            map(users(), u(), prop(&u(), "age")),
        )),
        lit(10),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT t0.* FROM (SELECT u.age AS value FROM users u UNION ALL SELECT u.age AS value FROM users u) t0 LIMIT 10"
    );
}

#[test]
fn test_render_flat_map_as_comma_join() {
    let o = ident("o", super::order_type());
    let q = flat_map(
        users(),
        u(),
        filter(orders(), o.clone(), eq(prop(&o, "user_id"), prop(&u(), "id"))),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT o.* FROM users u, orders o WHERE o.user_id = u.id"
    );
}

#[test]
fn test_params_collected_in_clause_order() {
    let q = take(
        filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int))),
        param("page_size", ValueKind::Int),
    );
    let rendered = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT u.* FROM users u WHERE u.age > $1 LIMIT $2"
    );
    let names: Vec<&str> = rendered.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["min_age", "page_size"]);
}

#[test]
fn test_render_is_deterministic() {
    let q = take(
        sort_by(
            filter(users(), u(), gt(prop(&u(), "age"), param("min_age", ValueKind::Int))),
            u(),
            prop(&u(), "name"),
            SortOrder::Asc,
        ),
        lit(25),
    );
    let first = render(&q, Dialect::Postgres).unwrap();
    let second = render(&q, Dialect::Postgres).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_to_sql_trait_default_dialect() {
    use crate::transpiler::ToSql;
    let rendered = users().to_postgres().unwrap();
    assert_eq!(rendered.sql, "SELECT * FROM users");
}

#[test]
fn test_normalized_pipeline_renders_fused_sql() {
    let y = ident("y", user_type());
    let q = filter(
        filter(users(), u(), gt(prop(&u(), "age"), lit(18))),
        y.clone(),
        lt(prop(&y, "age"), lit(65)),
    );
    let normalized = crate::norm::normalize(q).unwrap();
    let rendered = render(&normalized, Dialect::Postgres).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT u.* FROM users u WHERE u.age > 18 AND u.age < 65"
    );
}

#[test]
fn test_residual_application_is_rejected() {
    let pred = Expr::apply(
        Expr::function(vec![u()], gt(prop(&u(), "age"), lit(18))),
        vec![Expr::Ident(u())],
    );
    let q = filter(users(), u(), pred);
    let err = render(&q, Dialect::Postgres).unwrap_err();
    assert!(matches!(err, ForgeError::InvariantViolation(_)));
}

#[test]
fn test_flat_map_over_union_body_is_rejected() {
    let q = flat_map(users(), u(), union(orders(), orders()));
    let err = render(&q, Dialect::Postgres).unwrap_err();
    assert!(matches!(err, ForgeError::InvariantViolation(_)));
}
