//! Dialect-aware SQL rendering.
//!
//! Rendering is total over normalized trees: any tree `normalize`
//! accepts renders on every dialect or fails with an
//! [`UnsupportedFeature`](crate::error::ForgeError::UnsupportedFeature)
//! before emitting text. Output is deterministic; rendering the same
//! tree twice yields identical SQL and parameter lists.

mod dialect;
mod dml;
mod expr;
mod select;
mod sql;
mod traits;

pub use dialect::Dialect;
pub use dml::{RenderedAction, ReturningBehavior};
pub use expr::{render_expr, AliasTarget, ParamRef, RenderContext, Scope};
pub use select::Rendered;
pub use traits::{escape_identifier, ReturningStyle, SqlGenerator};

use crate::ast::{Action, Query};
use crate::error::ForgeResult;
use select::QueryRenderer;

/// Render a query tree to SQL for the given dialect.
///
/// The tree should already be normalized; residual lambda applications
/// are rejected.
pub fn render(query: &Query, dialect: Dialect) -> ForgeResult<Rendered> {
    let sql_gen = dialect.generator();
    tracing::debug!(dialect = %dialect, "rendering query");
    QueryRenderer::new(sql_gen.as_ref(), query).render(query)
}

/// Render an action to SQL for the given dialect.
pub fn render_action(action: &Action, dialect: Dialect) -> ForgeResult<RenderedAction> {
    let sql_gen = dialect.generator();
    tracing::debug!(dialect = %dialect, kind = %action.kind(), "rendering action");
    dml::render_with(action, sql_gen.as_ref())
}

/// Convenience trait for one-call rendering.
pub trait ToSql {
    type Output;

    fn to_sql(&self, dialect: Dialect) -> ForgeResult<Self::Output>;

    /// Render against the default dialect.
    fn to_postgres(&self) -> ForgeResult<Self::Output> {
        self.to_sql(Dialect::Postgres)
    }
}

impl ToSql for Query {
    type Output = Rendered;

    fn to_sql(&self, dialect: Dialect) -> ForgeResult<Rendered> {
        render(self, dialect)
    }
}

impl ToSql for Action {
    type Output = RenderedAction;

    fn to_sql(&self, dialect: Dialect) -> ForgeResult<RenderedAction> {
        render_action(self, dialect)
    }
}

#[cfg(test)]
mod tests;
