use crate::transpiler::traits::{escape_identifier, SqlGenerator};

/// Lowest-common-denominator SQL for vendors without a dedicated
/// generator.
pub struct GenericGenerator;

impl SqlGenerator for GenericGenerator {
    fn dialect_name(&self) -> &'static str {
        "Generic"
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        val.to_string()
    }
}
