use crate::transpiler::traits::SqlGenerator;

pub struct H2Generator;

impl SqlGenerator for H2Generator {
    fn dialect_name(&self) -> &'static str {
        "H2"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        val.to_string()
    }

    // No row-returning clause; generated keys are INSERT-only via the
    // driver.
}
