//! Dialect strategy trait and identifier escaping.

use crate::ast::ActionKind;

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "order", "group", "user", "table", "select", "from", "where", "join", "left", "right",
    "inner", "outer", "full", "on", "and", "or", "not", "null", "true", "false", "limit",
    "offset", "as", "in", "is", "like", "between", "having", "union", "all", "distinct", "case",
    "when", "then", "else", "end", "insert", "update", "delete", "values", "set", "returning",
    "output", "key", "primary", "default", "constraint", "check",
];

/// Escape an identifier if it's a reserved word or contains special chars.
/// Returns the identifier quoted with double quotes if needed.
pub fn escape_identifier(name: &str) -> String {
    let lower = name.to_lowercase();
    let needs_escaping = RESERVED_WORDS.contains(&lower.as_str())
        || name.chars().any(|c| !c.is_alphanumeric() && c != '_')
        || name.chars().next().map(|c| c.is_numeric()).unwrap_or(false);

    if needs_escaping {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// How a dialect expresses an affected-rows clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningStyle {
    /// `RETURNING expr, ...` after the statement body.
    Returning,
    /// T-SQL `OUTPUT INSERTED.col, ...` before VALUES/WHERE.
    Output,
    /// No textual clause exists.
    Unsupported,
}

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator {
    /// Dialect name used in error messages.
    fn dialect_name(&self) -> &'static str;
    /// Quote an identifier (table, column, or alias name).
    fn quote_identifier(&self, name: &str) -> String;
    /// Generate the parameter placeholder (e.g. $1, ?, @p1) for a 1-based
    /// index.
    fn placeholder(&self, index: usize) -> String;
    /// Get the boolean literal (true/false vs 1/0).
    fn bool_literal(&self, val: bool) -> String;
    /// Escape and quote a string literal.
    fn escape_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
    /// Render the limit/offset tail. Inputs are already-rendered
    /// expressions (literals or placeholders).
    fn limit_offset(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        let mut sql = String::new();
        if let Some(lim) = limit {
            sql.push_str(&format!(" LIMIT {}", lim));
        }
        if let Some(off) = offset {
            sql.push_str(&format!(" OFFSET {}", off));
        }
        sql
    }
    /// How (or whether) this dialect renders an affected-rows clause.
    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Unsupported
    }
    /// Whether generated-keys retrieval is expressible for this statement
    /// kind. Every dialect supports it for INSERT; only some can return
    /// keys from UPDATE/DELETE.
    fn supports_returning_keys(&self, kind: ActionKind) -> bool {
        kind == ActionKind::Insert
    }
    /// Whether `ON CONFLICT` upserts are expressible.
    fn supports_on_conflict(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_identifier() {
        assert_eq!(escape_identifier("age"), "age");
    }

    #[test]
    fn test_escape_reserved_word() {
        assert_eq!(escape_identifier("order"), "\"order\"");
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape_identifier("my col"), "\"my col\"");
        assert_eq!(escape_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
