use crate::ast::ActionKind;
use crate::transpiler::traits::{escape_identifier, ReturningStyle, SqlGenerator};

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn dialect_name(&self) -> &'static str {
        "Postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn bool_literal(&self, val: bool) -> String {
        val.to_string()
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Returning
    }

    fn supports_returning_keys(&self, _kind: ActionKind) -> bool {
        // RETURNING works on INSERT, UPDATE, and DELETE alike.
        true
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }
}
