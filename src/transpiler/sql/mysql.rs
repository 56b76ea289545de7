use crate::transpiler::traits::SqlGenerator;

pub struct MysqlGenerator;

impl SqlGenerator for MysqlGenerator {
    fn dialect_name(&self) -> &'static str {
        "MySql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn limit_offset(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        // MySQL has no bare OFFSET; an offset without a limit needs the
        // documented all-rows LIMIT sentinel.
        match (limit, offset) {
            (None, Some(off)) => format!(" LIMIT 18446744073709551615 OFFSET {}", off),
            (Some(lim), Some(off)) => format!(" LIMIT {} OFFSET {}", lim, off),
            (Some(lim), None) => format!(" LIMIT {}", lim),
            (None, None) => String::new(),
        }
    }

    // Generated keys come from the driver; no textual clause exists, so
    // returning_style stays Unsupported and keys are INSERT-only.
}
