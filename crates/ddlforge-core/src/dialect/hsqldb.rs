//! HSQLDB dialect.
//!
//! HSQLDB's driver does not report identity status through table
//! metadata, so the reader corrections for this dialect probe the
//! result-set metadata instead; see
//! [`ReadAdjustments::probe_auto_increment`].

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::model::Column;
use crate::reader::ReadAdjustments;
use crate::types::TypeCode;

use super::{DialectId, SqlDialect};

/// HSQLDB dialect strategy.
#[derive(Debug, Clone)]
pub struct HsqldbDialect {
    caps: Capabilities,
}

impl HsqldbDialect {
    /// Creates the HSQLDB strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: Capabilities::standard("hsqldb")
                .with_native_type(TypeCode::Blob, "LONGVARBINARY")
                .with_native_type(TypeCode::Clob, "LONGVARCHAR")
                .with_native_type(TypeCode::LongVarchar, "LONGVARCHAR")
                .with_native_type(TypeCode::LongVarbinary, "LONGVARBINARY")
                .with_native_type(TypeCode::Double, "DOUBLE"),
        }
    }
}

impl Default for HsqldbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for HsqldbDialect {
    fn id(&self) -> DialectId {
        DialectId::Hsqldb
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn read_adjustments(&self) -> ReadAdjustments {
        ReadAdjustments::new()
            .probe_auto_increment(true)
            .internal_pk_index_prefixes(&["SYS_PK_"])
            .internal_fk_index_prefixes(&["SYS_IDX_"])
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        Some("GENERATED BY DEFAULT AS IDENTITY")
    }

    fn alter_column_type_sql(&self, table_name: &str, column: &Column) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
            self.quote(table_name),
            self.quote(&column.name),
            self.sql_type(column)?
        ))
    }
}
