//! Dialect strategies for DDL generation.
//!
//! One [`SqlDialect`] implementation exists per supported product.
//! Default method bodies on the trait cover the portable rendering;
//! each dialect supplies only the deltas that actually vary: identity
//! syntax or its emulation, cast rendering, type-mapping overrides,
//! and commit-boundary placement.

mod derby;
mod firebird;
mod hsqldb;
mod postgres;
mod sqlite;

pub use derby::DerbyDialect;
pub use firebird::FirebirdDialect;
pub use hsqldb::HsqldbDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::collections::HashSet;

use crate::capabilities::Capabilities;
use crate::change::Change;
use crate::error::{DdlError, Result};
use crate::model::{Column, Database, ForeignKey, Index, Table};
use crate::reader::ReadAdjustments;
use crate::types::DefaultValue;

/// Identifier for a supported dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectId {
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// HSQLDB.
    Hsqldb,
    /// Apache Derby.
    Derby,
    /// Firebird / InterBase.
    Firebird,
}

impl DialectId {
    /// All supported dialects.
    #[must_use]
    pub fn all() -> [Self; 5] {
        [
            Self::Sqlite,
            Self::Postgres,
            Self::Hsqldb,
            Self::Derby,
            Self::Firebird,
        ]
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgresql",
            Self::Hsqldb => "hsqldb",
            Self::Derby => "derby",
            Self::Firebird => "firebird",
        }
    }

    /// Parses a dialect identifier, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "hsqldb" | "hsql" => Some(Self::Hsqldb),
            "derby" => Some(Self::Derby),
            "firebird" | "interbase" => Some(Self::Firebird),
            _ => None,
        }
    }
}

/// Returns the strategy for a dialect identifier.
#[must_use]
pub fn dialect_for(id: DialectId) -> Box<dyn SqlDialect> {
    match id {
        DialectId::Sqlite => Box::new(SqliteDialect::new()),
        DialectId::Postgres => Box::new(PostgresDialect::new()),
        DialectId::Hsqldb => Box::new(HsqldbDialect::new()),
        DialectId::Derby => Box::new(DerbyDialect::new()),
        DialectId::Firebird => Box::new(FirebirdDialect::new()),
    }
}

/// Looks a dialect up by name.
#[must_use]
pub fn dialect_by_name(name: &str) -> Option<Box<dyn SqlDialect>> {
    DialectId::from_name(name).map(dialect_for)
}

/// Dialect-specific DDL generation.
///
/// Every method that can encounter a construct the product cannot
/// express returns `Result` and fails with
/// [`DdlError::UnsupportedFeature`] before any statement text is
/// produced, so callers can abort with no partial output.
pub trait SqlDialect: Send + Sync {
    /// The dialect identifier.
    fn id(&self) -> DialectId;

    /// The dialect name.
    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    /// The capability descriptor for this dialect.
    fn capabilities(&self) -> &Capabilities;

    /// Correction facts for the model reader.
    fn read_adjustments(&self) -> ReadAdjustments {
        ReadAdjustments::default()
    }

    /// Quotes an identifier per the capability descriptor.
    fn quote(&self, identifier: &str) -> String {
        self.capabilities().quote(identifier)
    }

    /// The identity clause appended to an auto-increment column, or
    /// `None` when the dialect emulates identity through auxiliary
    /// objects.
    fn auto_increment_clause(&self) -> Option<&'static str>;

    /// Whether a single-column auto-increment primary key must be
    /// declared inline on the column rather than as a table-level
    /// PRIMARY KEY clause.
    fn inlines_identity_primary_key(&self) -> bool {
        false
    }

    // ---- type and column rendering -----------------------------------

    /// Renders the native SQL type for a column, applying size or
    /// precision/scale where the descriptor or the type code requires
    /// it. A mapping that already carries its own arguments (e.g.
    /// `DECIMAL(1,0)`) is used verbatim.
    fn sql_type(&self, column: &Column) -> Result<String> {
        render_sql_type(self.capabilities(), column)
    }

    /// Renders a column's default value, or `None` when it has none.
    fn default_value_sql(&self, column: &Column) -> Option<String> {
        column.default.as_ref().map(DefaultValue::to_sql)
    }

    /// Renders a column definition without identity syntax; identity
    /// placement belongs to the statement being built.
    fn column_definition(&self, column: &Column) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote(&column.name),
            self.sql_type(column)?
        );
        if column.required {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default_value_sql(column) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        Ok(sql)
    }

    // ---- auxiliary identity emulation --------------------------------

    /// Names of the auxiliary objects that emulate identity for a
    /// column, in creation order. Empty for dialects with native
    /// identity syntax.
    fn auxiliary_object_names(&self, table_name: &str, column: &Column) -> Vec<String> {
        let _ = (table_name, column);
        Vec::new()
    }

    /// Statements creating the auxiliary identity objects, emitted
    /// after the owning table is created.
    fn auxiliary_create_statements(
        &self,
        table_name: &str,
        column: &Column,
    ) -> Result<Vec<String>> {
        let _ = (table_name, column);
        Err(DdlError::unsupported(
            self.name(),
            "auto-increment columns",
        ))
    }

    /// Statements dropping the auxiliary identity objects, emitted
    /// before the owning table is dropped, in reverse creation order.
    fn auxiliary_drop_statements(
        &self,
        table_name: &str,
        column: &Column,
    ) -> Result<Vec<String>> {
        let _ = (table_name, column);
        Err(DdlError::unsupported(
            self.name(),
            "auto-increment columns",
        ))
    }

    // ---- table statements --------------------------------------------

    /// Renders CREATE TABLE plus any auxiliary statements and, when
    /// the descriptor requires it, the commit boundary for the group.
    fn create_table(&self, table: &Table) -> Result<Vec<String>> {
        if table.auto_increment_columns().len() > 1 {
            return Err(DdlError::validation(format!(
                "table '{}' declares more than one auto-increment column",
                table.name
            )));
        }
        let caps = self.capabilities();
        let inline_pk = self.inlines_identity_primary_key()
            && table.primary_key.len() == 1
            && table
                .auto_increment_column()
                .is_some_and(|c| c.name.eq_ignore_ascii_case(&table.primary_key[0]));

        let mut parts = Vec::new();
        for column in &table.columns {
            let mut def = self.column_definition(column)?;
            if column.auto_increment {
                if inline_pk {
                    def.push_str(" PRIMARY KEY");
                }
                if let Some(clause) = self.auto_increment_clause() {
                    def.push(' ');
                    def.push_str(clause);
                }
            }
            parts.push(format!("    {def}"));
        }
        if !inline_pk && !table.primary_key.is_empty() {
            parts.push(format!(
                "    PRIMARY KEY ({})",
                self.quoted_list(&table.primary_key)
            ));
        }
        if caps.embeds_foreign_keys_in_create_table() {
            for fk in &table.foreign_keys {
                parts.push(format!(
                    "    {}",
                    self.foreign_key_clause(&table.name, fk)
                ));
            }
        }
        if caps.embeds_indexes_in_create_table() {
            for index in &table.indexes {
                let unique = if index.unique { "UNIQUE " } else { "" };
                parts.push(format!(
                    "    {unique}INDEX {} ({})",
                    self.quote(&index.name),
                    self.quoted_list(&index.columns)
                ));
            }
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote(&table.name),
            parts.join(",\n")
        )];
        if let Some(column) = table.auto_increment_column() {
            if self.auto_increment_clause().is_none() {
                statements.extend(self.auxiliary_create_statements(&table.name, column)?);
            }
        }
        if caps.requires_commit_after_ddl() {
            statements.push(self.commit_statement());
        }
        Ok(statements)
    }

    /// Renders DROP TABLE, preceded by auxiliary drops where identity
    /// is emulated, followed by the commit boundary where required.
    fn drop_table(&self, table: &Table) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        if let Some(column) = table.auto_increment_column() {
            if self.auto_increment_clause().is_none() {
                statements.extend(self.auxiliary_drop_statements(&table.name, column)?);
            }
        }
        statements.push(format!("DROP TABLE {}", self.quote(&table.name)));
        if self.capabilities().requires_commit_after_ddl() {
            statements.push(self.commit_statement());
        }
        Ok(statements)
    }

    // ---- column statements -------------------------------------------

    /// Renders ALTER TABLE ... ADD COLUMN.
    fn add_column(&self, table_name: &str, column: &Column) -> Result<Vec<String>> {
        let mut def = self.column_definition(column)?;
        if column.auto_increment {
            if let Some(clause) = self.auto_increment_clause() {
                def.push(' ');
                def.push_str(clause);
            }
        }
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {def}",
            self.quote(table_name)
        )];
        if column.auto_increment && self.auto_increment_clause().is_none() {
            statements.extend(self.auxiliary_create_statements(table_name, column)?);
        }
        Ok(statements)
    }

    /// Renders ALTER TABLE ... DROP COLUMN.
    fn drop_column(&self, table_name: &str, column_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote(table_name),
            self.quote(column_name)
        )]
    }

    /// Renders the statements changing one column definition into
    /// another. A direct ALTER is used where the product has one; the
    /// portable emulation copies values through a temporary column
    /// using [`SqlDialect::cast_expression`].
    fn modify_column(
        &self,
        table_name: &str,
        before: &Column,
        after: &Column,
    ) -> Result<Vec<String>> {
        let caps = self.capabilities();
        let type_changed = before.type_code != after.type_code
            || before.size != after.size
            || before.precision != after.precision
            || before.scale != after.scale;

        let mut statements = Vec::new();
        let mut need_nullability = before.required != after.required;
        let mut need_default = before.default != after.default;

        if type_changed {
            if caps.supports_native_alter_column_type() {
                statements.push(self.alter_column_type_sql(table_name, after)?);
            } else {
                // The temporary column starts nullable and bare; the
                // trailing statements below restore the constraints.
                let tmp_name = caps.shorten(&format!("{}_new", after.name));
                let mut tmp = after.clone();
                tmp.name.clone_from(&tmp_name);
                tmp.required = false;
                tmp.default = None;
                tmp.auto_increment = false;

                let table = self.quote(table_name);
                statements.push(format!(
                    "ALTER TABLE {table} ADD COLUMN {}",
                    self.column_definition(&tmp)?
                ));
                statements.push(format!(
                    "UPDATE {table} SET {} = {}",
                    self.quote(&tmp_name),
                    self.cast_expression(before, after)?
                ));
                statements.extend(self.drop_column(table_name, &before.name));
                statements.push(self.rename_column_sql(table_name, &tmp_name, &after.name));
                need_nullability = after.required;
                need_default = after.default.is_some();
            }
        }

        if need_nullability {
            statements.push(self.set_nullable_sql(table_name, &after.name, after.required)?);
        }
        if need_default {
            statements.push(self.set_default_sql(table_name, after)?);
        }
        Ok(statements)
    }

    /// Renders the direct type-change statement.
    fn alter_column_type_sql(&self, table_name: &str, column: &Column) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote(table_name),
            self.quote(&column.name),
            self.sql_type(column)?
        ))
    }

    /// Renders the expression converting an existing column's values
    /// to a target definition.
    fn cast_expression(&self, source: &Column, target: &Column) -> Result<String> {
        Ok(format!(
            "CAST({} AS {})",
            self.quote(&source.name),
            self.sql_type(target)?
        ))
    }

    /// Renders RENAME COLUMN.
    fn rename_column_sql(&self, table_name: &str, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote(table_name),
            self.quote(from),
            self.quote(to)
        )
    }

    /// Renders the statement setting or dropping NOT NULL.
    fn set_nullable_sql(
        &self,
        table_name: &str,
        column_name: &str,
        required: bool,
    ) -> Result<String> {
        let action = if required {
            "SET NOT NULL"
        } else {
            "DROP NOT NULL"
        };
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {action}",
            self.quote(table_name),
            self.quote(column_name)
        ))
    }

    /// Renders the statement setting or dropping the default value.
    fn set_default_sql(&self, table_name: &str, column: &Column) -> Result<String> {
        let table = self.quote(table_name);
        let name = self.quote(&column.name);
        Ok(match self.default_value_sql(column) {
            Some(default) => {
                format!("ALTER TABLE {table} ALTER COLUMN {name} SET DEFAULT {default}")
            }
            None => format!("ALTER TABLE {table} ALTER COLUMN {name} DROP DEFAULT"),
        })
    }

    // ---- keys and indexes --------------------------------------------

    /// Renders ALTER TABLE ... ADD PRIMARY KEY.
    fn add_primary_key(&self, table_name: &str, columns: &[String]) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            self.quote(table_name),
            self.quoted_list(columns)
        )])
    }

    /// Renders the primary key drop.
    fn drop_primary_key(&self, table_name: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} DROP PRIMARY KEY",
            self.quote(table_name)
        )])
    }

    /// The name under which a foreign key is created or dropped:
    /// the model's name if present, otherwise derived
    /// deterministically from the table and column names.
    fn foreign_key_name(&self, table_name: &str, fk: &ForeignKey) -> String {
        fk.name.clone().unwrap_or_else(|| {
            self.capabilities()
                .shorten(&format!("fk_{}_{}", table_name, fk.columns.join("_")))
        })
    }

    /// Renders the constraint clause body of a foreign key.
    fn foreign_key_clause(&self, table_name: &str, fk: &ForeignKey) -> String {
        use crate::types::ForeignKeyAction;
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote(&self.foreign_key_name(table_name, fk)),
            self.quoted_list(&fk.columns),
            self.quote(&fk.referenced_table),
            self.quoted_list(&fk.referenced_columns)
        );
        if fk.on_delete != ForeignKeyAction::NoAction {
            sql.push_str(" ON DELETE ");
            sql.push_str(fk.on_delete.as_sql());
        }
        if fk.on_update != ForeignKeyAction::NoAction {
            sql.push_str(" ON UPDATE ");
            sql.push_str(fk.on_update.as_sql());
        }
        sql
    }

    /// Renders ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY, with
    /// the commit boundary where the descriptor requires one.
    fn add_foreign_key(&self, table_name: &str, fk: &ForeignKey) -> Result<Vec<String>> {
        if self.capabilities().embeds_foreign_keys_in_create_table() {
            return Err(DdlError::unsupported(
                self.name(),
                "adding a foreign key to an existing table",
            ));
        }
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD {}",
            self.quote(table_name),
            self.foreign_key_clause(table_name, fk)
        )];
        if self.capabilities().requires_commit_after_ddl() {
            statements.push(self.commit_statement());
        }
        Ok(statements)
    }

    /// Renders ALTER TABLE ... DROP CONSTRAINT for a foreign key.
    fn drop_foreign_key(&self, table_name: &str, fk: &ForeignKey) -> Result<Vec<String>> {
        if self.capabilities().embeds_foreign_keys_in_create_table() {
            return Err(DdlError::unsupported(
                self.name(),
                "dropping a foreign key from an existing table",
            ));
        }
        let mut statements = vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote(table_name),
            self.quote(&self.foreign_key_name(table_name, fk))
        )];
        if self.capabilities().requires_commit_after_ddl() {
            statements.push(self.commit_statement());
        }
        Ok(statements)
    }

    /// Renders CREATE INDEX.
    fn create_index(&self, table_name: &str, index: &Index) -> Vec<String> {
        let unique = if index.unique { "UNIQUE " } else { "" };
        vec![format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            self.quote(&self.capabilities().shorten(&index.name)),
            self.quote(table_name),
            self.quoted_list(&index.columns)
        )]
    }

    /// Renders DROP INDEX. Most products scope index names to the
    /// schema, so the table name is not referenced.
    fn drop_index(&self, table_name: &str, index: &Index) -> Vec<String> {
        let _ = table_name;
        vec![format!(
            "DROP INDEX {}",
            self.quote(&self.capabilities().shorten(&index.name))
        )]
    }

    // ---- scripts -----------------------------------------------------

    /// The commit boundary marker.
    fn commit_statement(&self) -> String {
        String::from("COMMIT")
    }

    /// Renders the statements for one schema change.
    fn render_change(&self, change: &Change) -> Result<Vec<String>> {
        match change {
            Change::AddTable(c) => self.create_table(&c.table),
            Change::DropTable(c) => self.drop_table(&c.table),
            Change::AddColumn(c) => self.add_column(&c.table, &c.column),
            Change::DropColumn(c) => Ok(self.drop_column(&c.table, &c.column.name)),
            Change::ModifyColumn(c) => self.modify_column(&c.table, &c.before, &c.after),
            Change::AddPrimaryKey(c) => self.add_primary_key(&c.table, &c.columns),
            Change::DropPrimaryKey(c) => self.drop_primary_key(&c.table),
            Change::AddForeignKey(c) => self.add_foreign_key(&c.table, &c.foreign_key),
            Change::DropForeignKey(c) => self.drop_foreign_key(&c.table, &c.foreign_key),
            Change::AddIndex(c) => Ok(self.create_index(&c.table, &c.index)),
            Change::DropIndex(c) => Ok(self.drop_index(&c.table, &c.index)),
        }
    }

    /// Renders the full creation script for a model: validation first,
    /// then per table the CREATE TABLE group and its indexes, and
    /// finally every foreign key in a deferred pass so cross-table
    /// cycles never reference a missing table.
    fn create_script(&self, database: &Database) -> Result<Vec<String>> {
        database.validate()?;
        let caps = self.capabilities();

        let mut taken: HashSet<String> = database
            .tables
            .iter()
            .map(|t| t.name.to_lowercase())
            .collect();

        let mut statements = Vec::new();
        for table in &database.tables {
            if self.auto_increment_clause().is_none() {
                if let Some(column) = table.auto_increment_column() {
                    for name in self.auxiliary_object_names(&table.name, column) {
                        if !taken.insert(name.to_lowercase()) {
                            return Err(DdlError::NameCollision(name));
                        }
                    }
                }
            }
            statements.extend(self.create_table(table)?);
            if !caps.embeds_indexes_in_create_table() {
                for index in &table.indexes {
                    statements.extend(self.create_index(&table.name, index));
                }
            }
        }
        if !caps.embeds_foreign_keys_in_create_table() {
            for table in &database.tables {
                for fk in &table.foreign_keys {
                    statements.extend(self.add_foreign_key(&table.name, fk)?);
                }
            }
        }
        Ok(statements)
    }

    /// Renders the full drop script for a model: foreign keys first,
    /// then tables in reverse declaration order.
    fn drop_script(&self, database: &Database) -> Result<Vec<String>> {
        database.validate()?;
        let mut statements = Vec::new();
        if !self.capabilities().embeds_foreign_keys_in_create_table() {
            for table in database.tables.iter().rev() {
                for fk in &table.foreign_keys {
                    statements.extend(self.drop_foreign_key(&table.name, fk)?);
                }
            }
        }
        for table in database.tables.iter().rev() {
            statements.extend(self.drop_table(table)?);
        }
        Ok(statements)
    }

    /// Renders an ordered change list into statements.
    fn alteration_script(&self, changes: &[Change]) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for change in changes {
            statements.extend(self.render_change(change)?);
        }
        Ok(statements)
    }

    /// Quotes and joins a name list.
    fn quoted_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.quote(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Shared native-type rendering; dialect overrides call back into this
/// after handling their special cases.
pub(crate) fn render_sql_type(caps: &Capabilities, column: &Column) -> Result<String> {
    let native = caps.native_type(column.type_code)?;
    if native.contains('(') {
        return Ok(native.to_string());
    }
    let mut sql = native.to_string();
    if column.type_code.takes_precision_and_scale() {
        if let Some(precision) = column.precision {
            match column.scale {
                Some(scale) => sql.push_str(&format!("({precision},{scale})")),
                None => sql.push_str(&format!("({precision})")),
            }
        }
    } else if caps.emits_size_for(column.type_code) {
        if let Some(size) = caps.effective_size(column.type_code, column.size) {
            sql.push_str(&format!("({size})"));
        }
    }
    Ok(sql)
}
