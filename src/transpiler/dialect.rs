use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transpiler::sql::generic::GenericGenerator;
use crate::transpiler::sql::h2::H2Generator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::oracle::OracleGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::sql::sqlserver::SqlServerGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Target SQL dialect for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    H2,
    Oracle,
    /// Lowest-common-denominator output for vendors without a dedicated
    /// generator.
    Generic,
}

impl Dialect {
    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::Postgres => Box::new(PostgresGenerator),
            Dialect::MySql => Box::new(MysqlGenerator),
            Dialect::Sqlite => Box::new(SqliteGenerator),
            Dialect::SqlServer => Box::new(SqlServerGenerator),
            Dialect::H2 => Box::new(H2Generator),
            Dialect::Oracle => Box::new(OracleGenerator),
            Dialect::Generic => Box::new(GenericGenerator),
        }
    }

    pub fn all() -> &'static [Dialect] {
        &[
            Dialect::Postgres,
            Dialect::MySql,
            Dialect::Sqlite,
            Dialect::SqlServer,
            Dialect::H2,
            Dialect::Oracle,
            Dialect::Generic,
        ]
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generator().dialect_name())
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Postgres
    }
}
