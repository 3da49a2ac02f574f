//! PostgreSQL dialect.

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::types::TypeCode;

use super::{DialectId, SqlDialect};

/// PostgreSQL dialect strategy.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    caps: Capabilities,
}

impl PostgresDialect {
    /// Creates the PostgreSQL strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: Capabilities::standard("postgresql")
                .max_identifiers(63)
                .comments(true)
                .with_native_type(TypeCode::TinyInt, "SMALLINT")
                .with_native_type(TypeCode::Blob, "BYTEA")
                .with_native_type(TypeCode::Binary, "BYTEA")
                .with_native_type(TypeCode::Varbinary, "BYTEA")
                .with_native_type(TypeCode::LongVarbinary, "BYTEA")
                .with_native_type(TypeCode::Clob, "TEXT")
                .with_native_type(TypeCode::LongVarchar, "TEXT")
                .suppress_size(TypeCode::Binary)
                .suppress_size(TypeCode::Varbinary),
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn id(&self) -> DialectId {
        DialectId::Postgres
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        Some("GENERATED BY DEFAULT AS IDENTITY")
    }

    fn drop_primary_key(&self, table_name: &str) -> Result<Vec<String>> {
        // The implicit primary key constraint is named <table>_pkey.
        Ok(vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote(table_name),
            self.quote(&format!("{table_name}_pkey"))
        )])
    }
}
