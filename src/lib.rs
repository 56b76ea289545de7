pub mod ast;
pub mod error;
pub mod fmt;
pub mod norm;
pub mod subst;
pub mod transpiler;
pub mod typer;

pub use norm::{normalize, normalize_action};
pub use transpiler::{render, render_action};

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::norm::{normalize, normalize_action};
    pub use crate::transpiler::{Dialect, ToSql};
}
