pub mod action;
pub mod builders;
pub mod expr;
pub mod operators;
pub mod query;
pub mod types;
pub mod values;

pub use self::action::{Action, ActionKind, ConflictAction, OnConflict, Returning};
pub use self::expr::{Expr, Ident};
pub use self::operators::{AggKind, BinaryOperator, JoinKind, SortOrder, UnaryOperator};
pub use self::query::Query;
pub use self::types::{IrType, ProductType, ValueKind};
pub use self::values::ConstValue;
