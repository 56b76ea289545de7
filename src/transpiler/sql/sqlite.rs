use crate::transpiler::traits::{ReturningStyle, SqlGenerator};

pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn dialect_name(&self) -> &'static str {
        "Sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Returning
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }
}
