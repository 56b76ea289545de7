use crate::ast::{Expr, Ident};
use serde::{Deserialize, Serialize};

/// The statement kind an action renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Insert => write!(f, "INSERT"),
            ActionKind::Update => write!(f, "UPDATE"),
            ActionKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// What an action hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Returning {
    /// Nothing beyond the affected-row count.
    None,
    /// Column expressions from affected rows (RETURNING / OUTPUT).
    Columns(Vec<Expr>),
    /// Generated keys only.
    Keys,
}

/// ON CONFLICT (upsert) clause for inserts. Dialect-gated at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnConflict {
    pub columns: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate { assignments: Vec<(String, Expr)> },
}

/// A data-modifying statement. Assignment lists render in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Insert {
        entity: String,
        assignments: Vec<(String, Expr)>,
        on_conflict: Option<OnConflict>,
        returning: Returning,
    },
    Update {
        entity: String,
        assignments: Vec<(String, Expr)>,
        /// Row identifier plus predicate, same shape as `Query::Filter`.
        filter: Option<(Ident, Expr)>,
        returning: Returning,
    },
    Delete {
        entity: String,
        filter: Option<(Ident, Expr)>,
        returning: Returning,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Insert { .. } => ActionKind::Insert,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            Action::Insert { entity, .. }
            | Action::Update { entity, .. }
            | Action::Delete { entity, .. } => entity,
        }
    }

    pub fn returning(&self) -> &Returning {
        match self {
            Action::Insert { returning, .. }
            | Action::Update { returning, .. }
            | Action::Delete { returning, .. } => returning,
        }
    }
}
