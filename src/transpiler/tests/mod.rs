//! Rendering tests, split by concern: `core` covers query assembly on
//! the default dialect, `dialects` the per-vendor differences,
//! `precedence` scalar expression text, `actions` DML statements.

mod core;
mod dialects;
mod precedence;

use crate::ast::builders::*;
use crate::ast::{Ident, ProductType, Query, ValueKind};

pub fn user_type() -> ProductType {
    row_type(
        "User",
        &[
            ("id", ValueKind::Int),
            ("name", ValueKind::String),
            ("age", ValueKind::Int),
            ("active", ValueKind::Bool),
        ],
    )
}

pub fn order_type() -> ProductType {
    row_type(
        "Order",
        &[
            ("id", ValueKind::Int),
            ("user_id", ValueKind::Int),
            ("total", ValueKind::Float),
        ],
    )
}

pub fn users() -> Query {
    entity("users", user_type())
}

pub fn orders() -> Query {
    entity("orders", order_type())
}

pub fn u() -> Ident {
    ident("u", user_type())
}
