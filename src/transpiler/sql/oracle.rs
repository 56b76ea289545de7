use crate::ast::ActionKind;
use crate::transpiler::traits::{ReturningStyle, SqlGenerator};

pub struct OracleGenerator;

impl SqlGenerator for OracleGenerator {
    fn dialect_name(&self) -> &'static str {
        "Oracle"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn limit_offset(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        let mut sql = String::new();
        if let Some(off) = offset {
            sql.push_str(&format!(" OFFSET {} ROWS", off));
        }
        if let Some(lim) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", lim));
        }
        sql
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Returning
    }

    fn supports_returning_keys(&self, _kind: ActionKind) -> bool {
        true
    }
}
