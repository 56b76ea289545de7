use crate::transpiler::traits::{ReturningStyle, SqlGenerator};

pub struct SqlServerGenerator;

impl SqlGenerator for SqlServerGenerator {
    fn dialect_name(&self) -> &'static str {
        "SqlServer"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn limit_offset(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        // T-SQL: OFFSET n ROWS FETCH NEXT m ROWS ONLY. OFFSET is mandatory
        // when fetching.
        let mut sql = String::new();
        if limit.is_some() || offset.is_some() {
            sql.push_str(&format!(" OFFSET {} ROWS", offset.unwrap_or("0")));
            if let Some(lim) = limit {
                sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", lim));
            }
        }
        sql
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Output
    }
}
