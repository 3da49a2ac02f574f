//! SQLite dialect.
//!
//! SQLite embeds foreign keys in CREATE TABLE (there is no
//! ADD CONSTRAINT), requires `AUTOINCREMENT` to sit inside an inline
//! `INTEGER PRIMARY KEY` clause, and has no ALTER COLUMN at all, so
//! type changes go through the temporary-column copy.

use crate::capabilities::Capabilities;
use crate::error::{DdlError, Result};
use crate::model::Column;
use crate::reader::ReadAdjustments;
use crate::types::TypeCode;

use super::{DialectId, SqlDialect};

/// SQLite dialect strategy.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    caps: Capabilities,
}

impl SqliteDialect {
    /// Creates the SQLite strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: Capabilities::standard("sqlite")
                .embed_foreign_keys(true)
                .native_alter_column_type(false),
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SqliteDialect {
    fn id(&self) -> DialectId {
        DialectId::Sqlite
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn read_adjustments(&self) -> ReadAdjustments {
        ReadAdjustments::new()
            .internal_pk_index_prefixes(&["sqlite_autoindex_"])
            .internal_fk_index_prefixes(&["sqlite_autoindex_"])
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        Some("AUTOINCREMENT")
    }

    fn inlines_identity_primary_key(&self) -> bool {
        true
    }

    fn sql_type(&self, column: &Column) -> Result<String> {
        // AUTOINCREMENT is only valid on INTEGER PRIMARY KEY columns,
        // whatever integer width the model asked for.
        if column.auto_increment
            && matches!(
                column.type_code,
                TypeCode::TinyInt | TypeCode::SmallInt | TypeCode::Integer | TypeCode::BigInt
            )
        {
            return Ok(String::from("INTEGER"));
        }
        super::render_sql_type(&self.caps, column)
    }

    fn set_nullable_sql(
        &self,
        _table_name: &str,
        _column_name: &str,
        _required: bool,
    ) -> Result<String> {
        Err(DdlError::unsupported(
            self.name(),
            "changing a column's nullability",
        ))
    }

    fn set_default_sql(&self, _table_name: &str, _column: &Column) -> Result<String> {
        Err(DdlError::unsupported(
            self.name(),
            "changing a column's default value",
        ))
    }

    fn add_primary_key(&self, _table_name: &str, _columns: &[String]) -> Result<Vec<String>> {
        Err(DdlError::unsupported(
            self.name(),
            "adding a primary key to an existing table",
        ))
    }

    fn drop_primary_key(&self, _table_name: &str) -> Result<Vec<String>> {
        Err(DdlError::unsupported(
            self.name(),
            "dropping a primary key from an existing table",
        ))
    }
}
