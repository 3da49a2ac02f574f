//! Apache Derby dialect.
//!
//! Derby cannot convert numeric values to VARCHAR in a CAST, though it
//! can convert them to CHAR; the cast rendering substitutes the
//! fixed-length type during the copy while the final column keeps its
//! requested definition.

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::model::Column;
use crate::types::{DefaultValue, TypeCode};

use super::{DialectId, SqlDialect};

/// Derby dialect strategy.
#[derive(Debug, Clone)]
pub struct DerbyDialect {
    caps: Capabilities,
}

impl DerbyDialect {
    /// Creates the Derby strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: Capabilities::standard("derby")
                .native_alter_column_type(false)
                .with_native_type(TypeCode::Bit, "SMALLINT")
                .with_native_type(TypeCode::Boolean, "SMALLINT")
                .with_native_type(TypeCode::TinyInt, "SMALLINT")
                .with_native_type(TypeCode::Double, "DOUBLE")
                .with_native_type(TypeCode::LongVarchar, "LONG VARCHAR")
                .with_native_type(TypeCode::LongVarbinary, "LONG VARCHAR FOR BIT DATA"),
        }
    }
}

impl Default for DerbyDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DerbyDialect {
    fn id(&self) -> DialectId {
        DialectId::Derby
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        Some("GENERATED BY DEFAULT AS IDENTITY")
    }

    fn default_value_sql(&self, column: &Column) -> Option<String> {
        // Boolean-ish columns are stored as SMALLINT, so their
        // defaults become numeric literals.
        if matches!(column.type_code, TypeCode::Bit | TypeCode::Boolean) {
            if let Some(DefaultValue::Boolean(b)) = &column.default {
                return Some(String::from(if *b { "1" } else { "0" }));
            }
        }
        column.default.as_ref().map(DefaultValue::to_sql)
    }

    fn cast_expression(&self, source: &Column, target: &Column) -> Result<String> {
        let mut native = self.sql_type(target)?;
        if source.type_code.is_numeric() && native.starts_with("VARCHAR") {
            native = native.replacen("VARCHAR", "CHAR", 1);
        }
        Ok(format!(
            "CAST({} AS {native})",
            self.quote(&source.name)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_to_varchar_casts_through_char() {
        let dialect = DerbyDialect::new();
        let source = Column::new("amount", TypeCode::Integer);
        let target = Column::new("amount", TypeCode::Varchar).size(20);
        assert_eq!(
            dialect.cast_expression(&source, &target).unwrap(),
            "CAST(\"amount\" AS CHAR(20))"
        );

        // Non-numeric sources keep the requested target type.
        let source = Column::new("label", TypeCode::Char).size(10);
        assert_eq!(
            dialect.cast_expression(&source, &target).unwrap(),
            "CAST(\"label\" AS VARCHAR(20))"
        );
    }

    #[test]
    fn type_change_copies_through_a_temporary_column() {
        let dialect = DerbyDialect::new();
        let before = Column::new("amount", TypeCode::Integer).not_null();
        let after = Column::new("amount", TypeCode::Varchar).size(20).not_null();
        let sql = dialect.modify_column("invoices", &before, &after).unwrap();

        assert_eq!(sql.len(), 5);
        assert!(sql[0].contains("ADD COLUMN \"amount_new\" VARCHAR(20)"));
        assert!(sql[1].contains("SET \"amount_new\" = CAST(\"amount\" AS CHAR(20))"));
        assert!(sql[2].contains("DROP COLUMN \"amount\""));
        assert!(sql[3].contains("RENAME COLUMN \"amount_new\" TO \"amount\""));
        assert!(sql[4].contains("SET NOT NULL"));
    }

    #[test]
    fn boolean_defaults_become_numeric() {
        let dialect = DerbyDialect::new();
        let col = Column::new("active", TypeCode::Boolean)
            .not_null()
            .default(DefaultValue::Boolean(true));
        assert_eq!(
            dialect.column_definition(&col).unwrap(),
            "\"active\" SMALLINT NOT NULL DEFAULT 1"
        );
    }
}
