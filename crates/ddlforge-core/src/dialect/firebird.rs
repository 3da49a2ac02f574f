//! Firebird / InterBase dialect.
//!
//! No native identity syntax: an auto-increment column is emulated by
//! a generator plus a BEFORE INSERT trigger, created right after the
//! owning table and dropped, in reverse order, right before it. DDL
//! runs in transactions, so every create/drop group is followed by an
//! explicit COMMIT; a later statement in the same script may otherwise
//! fail against objects the server does not consider committed yet.

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::model::Column;
use crate::reader::ReadAdjustments;
use crate::types::TypeCode;

use super::{DialectId, SqlDialect};

/// Firebird dialect strategy.
#[derive(Debug, Clone)]
pub struct FirebirdDialect {
    caps: Capabilities,
}

impl FirebirdDialect {
    /// Creates the Firebird strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: Capabilities::standard("firebird")
                .max_identifiers(31)
                .delimited_identifiers(false)
                .comments(true)
                .commit_after_ddl(true)
                .require_size(TypeCode::Binary, 254)
                .require_size(TypeCode::Varbinary, 254)
                .with_native_type(TypeCode::Array, "BLOB")
                .with_native_type(TypeCode::BigInt, "DECIMAL(38,0)")
                .with_native_type(TypeCode::Binary, "CHAR")
                .with_native_type(TypeCode::Bit, "DECIMAL(1,0)")
                .with_native_type(TypeCode::Boolean, "DECIMAL(1,0)")
                .with_native_type(TypeCode::Clob, "BLOB SUB_TYPE TEXT")
                .with_native_type(TypeCode::Float, "DOUBLE PRECISION")
                .with_native_type(TypeCode::LongVarbinary, "BLOB")
                .with_native_type(TypeCode::LongVarchar, "BLOB SUB_TYPE TEXT")
                .with_native_type(TypeCode::Other, "BLOB")
                .with_native_type(TypeCode::Real, "FLOAT")
                .with_native_type(TypeCode::TinyInt, "SMALLINT")
                .with_native_type(TypeCode::Varbinary, "VARCHAR"),
        }
    }

    fn generator_name(&self, table_name: &str, column: &Column) -> String {
        self.caps
            .shorten(&format!("gen_{}_{}", table_name, column.name))
    }

    fn trigger_name(&self, table_name: &str, column: &Column) -> String {
        self.caps
            .shorten(&format!("trg_{}_{}", table_name, column.name))
    }
}

impl Default for FirebirdDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for FirebirdDialect {
    fn id(&self) -> DialectId {
        DialectId::Firebird
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn read_adjustments(&self) -> ReadAdjustments {
        ReadAdjustments::new()
            .internal_pk_index_prefixes(&["RDB$PRIMARY"])
            .internal_fk_index_prefixes(&["RDB$FOREIGN"])
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        None
    }

    fn sql_type(&self, column: &Column) -> Result<String> {
        let mut sql = super::render_sql_type(&self.caps, column)?;
        // Binary types are stored as character columns with the octet
        // character set; the size must always be explicit.
        if matches!(column.type_code, TypeCode::Binary | TypeCode::Varbinary) {
            sql.push_str(" CHARACTER SET OCTETS");
        }
        Ok(sql)
    }

    fn alter_column_type_sql(&self, table_name: &str, column: &Column) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER {} TYPE {}",
            self.quote(table_name),
            self.quote(&column.name),
            self.sql_type(column)?
        ))
    }

    fn auxiliary_object_names(&self, table_name: &str, column: &Column) -> Vec<String> {
        vec![
            self.generator_name(table_name, column),
            self.trigger_name(table_name, column),
        ]
    }

    fn auxiliary_create_statements(
        &self,
        table_name: &str,
        column: &Column,
    ) -> Result<Vec<String>> {
        let generator = self.generator_name(table_name, column);
        let trigger = self.trigger_name(table_name, column);
        let table = self.quote(table_name);
        let col = self.quote(&column.name);
        Ok(vec![
            format!("CREATE GENERATOR {generator}"),
            format!(
                "CREATE TRIGGER {trigger} FOR {table}\n\
                 ACTIVE BEFORE INSERT POSITION 0\n\
                 AS\n\
                 BEGIN\n\
                 IF (NEW.{col} IS NULL) THEN\n\
                 NEW.{col} = GEN_ID({generator}, 1);\n\
                 END"
            ),
        ])
    }

    fn auxiliary_drop_statements(
        &self,
        table_name: &str,
        column: &Column,
    ) -> Result<Vec<String>> {
        Ok(vec![
            format!("DROP TRIGGER {}", self.trigger_name(table_name, column)),
            format!("DROP GENERATOR {}", self.generator_name(table_name, column)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    fn orders() -> Table {
        Table::new("orders")
            .column(
                Column::new("id", TypeCode::Integer)
                    .not_null()
                    .auto_increment(),
            )
            .column(Column::new("customer", TypeCode::Varchar).size(40))
            .primary_key(vec!["id".into()])
    }

    #[test]
    fn create_table_schedules_generator_and_trigger() {
        let dialect = FirebirdDialect::new();
        let sql = dialect.create_table(&orders()).unwrap();

        assert_eq!(sql.len(), 4);
        assert!(sql[0].starts_with("CREATE TABLE orders"));
        // No identity syntax on the column itself.
        assert!(sql[0].contains("id INTEGER NOT NULL"));
        assert!(!sql[0].to_uppercase().contains("IDENTITY"));
        assert_eq!(sql[1], "CREATE GENERATOR gen_orders_id");
        assert!(sql[2].starts_with("CREATE TRIGGER trg_orders_id FOR orders"));
        assert!(sql[2].contains("GEN_ID(gen_orders_id, 1)"));
        assert_eq!(sql[3], "COMMIT");
    }

    #[test]
    fn drop_table_drops_auxiliaries_first_in_reverse_order() {
        let dialect = FirebirdDialect::new();
        let sql = dialect.drop_table(&orders()).unwrap();
        assert_eq!(
            sql,
            vec![
                "DROP TRIGGER trg_orders_id".to_string(),
                "DROP GENERATOR gen_orders_id".to_string(),
                "DROP TABLE orders".to_string(),
                "COMMIT".to_string(),
            ]
        );
    }

    #[test]
    fn auxiliary_names_are_reproducible_and_length_bounded() {
        let dialect = FirebirdDialect::new();
        let column = Column::new("a_rather_long_column_name", TypeCode::Integer)
            .not_null()
            .auto_increment();
        let first = dialect.auxiliary_object_names("a_table_with_a_long_name", &column);
        let second = dialect.auxiliary_object_names("a_table_with_a_long_name", &column);
        assert_eq!(first, second);
        for name in &first {
            assert!(name.len() <= 31, "{name} exceeds the identifier limit");
        }
        // Generator and trigger names never collapse onto each other.
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn bit_maps_to_decimal_one_zero() {
        let dialect = FirebirdDialect::new();
        let col = Column::new("flag", TypeCode::Bit);
        assert_eq!(dialect.sql_type(&col).unwrap(), "DECIMAL(1,0)");
        let col = Column::new("flag", TypeCode::Boolean);
        assert_eq!(dialect.sql_type(&col).unwrap(), "DECIMAL(1,0)");
    }

    #[test]
    fn binary_types_carry_size_and_octet_charset() {
        let dialect = FirebirdDialect::new();
        let col = Column::new("payload", TypeCode::Varbinary).size(16);
        assert_eq!(
            dialect.sql_type(&col).unwrap(),
            "VARCHAR(16) CHARACTER SET OCTETS"
        );
        // The size is mandatory for binary types; the descriptor
        // supplies one when the model has none.
        let col = Column::new("payload", TypeCode::Binary);
        assert_eq!(
            dialect.sql_type(&col).unwrap(),
            "CHAR(254) CHARACTER SET OCTETS"
        );
    }

    #[test]
    fn array_columns_fall_back_to_blob() {
        let dialect = FirebirdDialect::new();
        let col = Column::new("tags", TypeCode::Array);
        assert_eq!(dialect.sql_type(&col).unwrap(), "BLOB");
    }

    #[test]
    fn drop_and_recreate_keeps_group_order_and_commits() {
        use crate::model::Database;

        let dialect = FirebirdDialect::new();
        let model = Database::new("shop").table(orders());

        let mut script = dialect.drop_script(&model).unwrap();
        script.extend(dialect.create_script(&model).unwrap());
        assert_eq!(
            script,
            vec![
                "DROP TRIGGER trg_orders_id".to_string(),
                "DROP GENERATOR gen_orders_id".to_string(),
                "DROP TABLE orders".to_string(),
                "COMMIT".to_string(),
                "CREATE TABLE orders (\n    id INTEGER NOT NULL,\n    \
                 customer VARCHAR(40),\n    PRIMARY KEY (id)\n)"
                    .to_string(),
                "CREATE GENERATOR gen_orders_id".to_string(),
                "CREATE TRIGGER trg_orders_id FOR orders\n\
                 ACTIVE BEFORE INSERT POSITION 0\n\
                 AS\n\
                 BEGIN\n\
                 IF (NEW.id IS NULL) THEN\n\
                 NEW.id = GEN_ID(gen_orders_id, 1);\n\
                 END"
                    .to_string(),
                "COMMIT".to_string(),
            ]
        );
    }

    #[test]
    fn colliding_auxiliary_names_are_reported() {
        use crate::model::Database;

        // gen_a_b_c derives from both (table "a", column "b_c") and
        // (table "a_b", column "c").
        let dialect = FirebirdDialect::new();
        let model = Database::new("clash")
            .table(Table::new("a").column(
                Column::new("b_c", TypeCode::Integer).not_null().auto_increment(),
            ))
            .table(Table::new("a_b").column(
                Column::new("c", TypeCode::Integer).not_null().auto_increment(),
            ));

        let err = dialect.create_script(&model).unwrap_err();
        assert!(matches!(
            err,
            crate::error::DdlError::NameCollision(ref name) if name == "gen_a_b_c"
        ));
    }

    #[test]
    fn external_foreign_keys_commit_immediately() {
        let dialect = FirebirdDialect::new();
        let fk = crate::model::ForeignKey::new(
            vec!["customer_id".into()],
            "customers",
            vec!["id".into()],
        );
        let sql = dialect.add_foreign_key("orders", &fk).unwrap();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("ALTER TABLE orders ADD CONSTRAINT"));
        assert_eq!(sql[1], "COMMIT");
    }
}
