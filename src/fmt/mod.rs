//! Human-readable tree dumps for diagnostics.
//!
//! Output is deterministic: one node per line, two-space indentation,
//! expressions inlined in a compact prefix-free notation. Error
//! messages and the snapshot tests both rely on the exact text.

use std::fmt::{Result, Write};

use crate::ast::{Action, ConflictAction, Expr, Query, Returning};

#[cfg(test)]
mod tests;

pub struct Formatter {
    indent_level: usize,
    buffer: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            buffer: String::new(),
        }
    }

    pub fn format(mut self, query: &Query) -> std::result::Result<String, std::fmt::Error> {
        self.visit_query(query)?;
        Ok(self.buffer)
    }

    pub fn format_action(mut self, action: &Action) -> std::result::Result<String, std::fmt::Error> {
        self.visit_action(action)?;
        Ok(self.buffer)
    }

    fn indent(&mut self) -> Result {
        for _ in 0..self.indent_level {
            write!(self.buffer, "  ")?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str) -> Result {
        self.indent()?;
        writeln!(self.buffer, "{}", text)
    }

    fn child<F: FnOnce(&mut Self) -> Result>(&mut self, f: F) -> Result {
        self.indent_level += 1;
        let result = f(self);
        self.indent_level -= 1;
        result
    }

    fn visit_query(&mut self, query: &Query) -> Result {
        match query {
            Query::Entity { name, ty } => self.line(&format!("Entity {} : {}", name, ty.name)),
            Query::Map {
                source,
                ident,
                body,
            } => {
                self.line(&format!("Map {} -> {}", ident.name, expr_text(body)))?;
                self.child(|f| f.visit_query(source))
            }
            Query::Filter {
                source,
                ident,
                predicate,
            } => {
                self.line(&format!("Filter {} if {}", ident.name, expr_text(predicate)))?;
                self.child(|f| f.visit_query(source))
            }
            Query::FlatMap {
                source,
                ident,
                body,
            } => {
                self.line(&format!("FlatMap {}", ident.name))?;
                self.child(|f| {
                    f.visit_query(source)?;
                    f.visit_query(body)
                })
            }
            Query::Join {
                kind,
                left,
                right,
                left_ident,
                right_ident,
                on,
            } => {
                self.line(&format!(
                    "Join {:?} {} {} on {}",
                    kind,
                    left_ident.name,
                    right_ident.name,
                    expr_text(on)
                ))?;
                self.child(|f| {
                    f.visit_query(left)?;
                    f.visit_query(right)
                })
            }
            Query::Aggregation { source, op } => {
                self.line(&format!("Aggregation {}", op))?;
                self.child(|f| f.visit_query(source))
            }
            Query::SortBy {
                source,
                ident,
                key,
                order,
            } => {
                self.line(&format!(
                    "SortBy {} by {} {}",
                    ident.name,
                    expr_text(key),
                    order.sql_keyword()
                ))?;
                self.child(|f| f.visit_query(source))
            }
            Query::Take { source, count } => {
                self.line(&format!("Take {}", expr_text(count)))?;
                self.child(|f| f.visit_query(source))
            }
            Query::Drop { source, count } => {
                self.line(&format!("Drop {}", expr_text(count)))?;
                self.child(|f| f.visit_query(source))
            }
            Query::Distinct { source } => {
                self.line("Distinct")?;
                self.child(|f| f.visit_query(source))
            }
            Query::Union { left, right } => {
                self.line("Union")?;
                self.child(|f| {
                    f.visit_query(left)?;
                    f.visit_query(right)
                })
            }
            Query::UnionAll { left, right } => {
                self.line("UnionAll")?;
                self.child(|f| {
                    f.visit_query(left)?;
                    f.visit_query(right)
                })
            }
            Query::Nested { source } => {
                self.line("Nested")?;
                self.child(|f| f.visit_query(source))
            }
        }
    }

    fn visit_action(&mut self, action: &Action) -> Result {
        match action {
            Action::Insert {
                entity,
                assignments,
                on_conflict,
                returning,
            } => {
                self.line(&format!("Insert {}", entity))?;
                self.child(|f| {
                    f.visit_assignments(assignments)?;
                    if let Some(conflict) = on_conflict {
                        f.line(&format!("on conflict ({})", conflict.columns.join(", ")))?;
                        f.child(|f| match &conflict.action {
                            ConflictAction::DoNothing => f.line("do nothing"),
                            ConflictAction::DoUpdate { assignments } => {
                                f.line("do update")?;
                                f.child(|f| f.visit_assignments(assignments))
                            }
                        })?;
                    }
                    f.visit_returning(returning)
                })
            }
            Action::Update {
                entity,
                assignments,
                filter,
                returning,
            } => {
                self.line(&format!("Update {}", entity))?;
                self.child(|f| {
                    f.visit_assignments(assignments)?;
                    if let Some((ident, predicate)) = filter {
                        f.line(&format!("where {} if {}", ident.name, expr_text(predicate)))?;
                    }
                    f.visit_returning(returning)
                })
            }
            Action::Delete {
                entity,
                filter,
                returning,
            } => {
                self.line(&format!("Delete {}", entity))?;
                self.child(|f| {
                    if let Some((ident, predicate)) = filter {
                        f.line(&format!("where {} if {}", ident.name, expr_text(predicate)))?;
                    }
                    f.visit_returning(returning)
                })
            }
        }
    }

    fn visit_assignments(&mut self, assignments: &[(String, Expr)]) -> Result {
        for (column, value) in assignments {
            self.line(&format!("set {} = {}", column, expr_text(value)))?;
        }
        Ok(())
    }

    fn visit_returning(&mut self, returning: &Returning) -> Result {
        match returning {
            Returning::None => Ok(()),
            Returning::Columns(exprs) => {
                let cols: Vec<String> = exprs.iter().map(expr_text).collect();
                self.line(&format!("returning {}", cols.join(", ")))
            }
            Returning::Keys => self.line("returning keys"),
        }
    }
}

/// Dump a query tree, one node per line.
pub fn dump_tree(query: &Query) -> String {
    Formatter::new().format(query).unwrap_or_default()
}

/// Machine-readable dump for bug reports and tooling.
pub fn dump_json(query: &Query) -> serde_json::Result<String> {
    serde_json::to_string_pretty(query)
}

/// Dump an action the same way.
pub fn dump_action(action: &Action) -> String {
    Formatter::new().format_action(action).unwrap_or_default()
}

/// Compact single-line expression text.
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Const(value) => value.to_string(),
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Property { base, name } => format!("{}.{}", expr_text(base), name),
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", expr_text(left), op, expr_text(right))
        }
        Expr::Unary { op, expr } => format!("({} {})", op, expr_text(expr)),
        Expr::Apply { func, args } => {
            let rendered: Vec<String> = args.iter().map(expr_text).collect();
            format!("{}({})", expr_text(func), rendered.join(", "))
        }
        Expr::Function { params, body } => {
            let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
            format!("fn({}) -> {}", names.join(", "), expr_text(body))
        }
        Expr::When {
            branches,
            otherwise,
        } => {
            let mut text = String::from("when {");
            for (guard, value) in branches {
                let _ = write!(text, " {} => {},", expr_text(guard), expr_text(value));
            }
            let _ = write!(text, " else => {} }}", expr_text(otherwise));
            text
        }
        Expr::Product { fields } => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name, expr_text(value)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
        Expr::Param { name, ty } => format!("${}:{}", name, ty),
    }
}
