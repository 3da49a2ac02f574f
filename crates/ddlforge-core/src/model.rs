//! The canonical, dialect-neutral schema model.
//!
//! These are pure value types: tables, columns, keys, and indexes as a
//! caller wants them (or as a live database reports them). Builders and
//! the planner only read a model; once two models have been compared
//! they are treated as immutable snapshots.

use serde::{Deserialize, Serialize};

use crate::error::{DdlError, Result};
use crate::types::{DefaultValue, ForeignKeyAction, TypeCode};

/// A single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table).
    pub name: String,
    /// Product-independent type code.
    pub type_code: TypeCode,
    /// Size for character/binary types.
    pub size: Option<u32>,
    /// Precision for exact numeric types.
    pub precision: Option<u16>,
    /// Scale for exact numeric types.
    pub scale: Option<u16>,
    /// Whether the column is NOT NULL.
    pub required: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
}

impl Column {
    /// Creates a new nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
            size: None,
            precision: None,
            scale: None,
            required: false,
            default: None,
            auto_increment: false,
        }
    }

    /// Sets the size (character/binary length).
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets precision and scale for exact numeric types.
    #[must_use]
    pub fn precision(mut self, precision: u16, scale: u16) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Returns whether two columns describe the same definition,
    /// comparing names case-insensitively.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.type_code == other.type_code
            && self.size == other.size
            && self.precision == other.precision
            && self.scale == other.scale
            && self.required == other.required
            && self.default == other.default
            && self.auto_increment == other.auto_increment
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Optional constraint name. Two keys with the same reference but
    /// different names are structurally equal; names vary between
    /// environments.
    pub name: Option<String>,
    /// Columns in the owning table, in order.
    pub columns: Vec<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns, in order.
    pub referenced_columns: Vec<String>,
    /// ON DELETE action.
    pub on_delete: ForeignKeyAction,
    /// ON UPDATE action.
    pub on_update: ForeignKeyAction,
}

impl ForeignKey {
    /// Creates a foreign key from one column list to another.
    #[must_use]
    pub fn new(
        columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Self {
        Self {
            name: None,
            columns,
            referenced_table: referenced_table.into(),
            referenced_columns,
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }

    /// Returns whether two keys reference the same columns, table, and
    /// actions, ignoring the constraint name.
    #[must_use]
    pub fn same_reference(&self, other: &Self) -> bool {
        eq_name_lists(&self.columns, &other.columns)
            && self
                .referenced_table
                .eq_ignore_ascii_case(&other.referenced_table)
            && eq_name_lists(&self.referenced_columns, &other.referenced_columns)
            && self.on_delete == other.on_delete
            && self.on_update == other.on_update
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    pub unique: bool,
}

impl Index {
    /// Creates a non-unique index.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
        }
    }

    /// Marks the index UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Returns whether two indexes cover the same columns with the same
    /// uniqueness, ignoring the index name.
    #[must_use]
    pub fn covers_same(&self, other: &Self) -> bool {
        self.unique == other.unique && eq_name_lists(&self.columns, &other.columns)
    }
}

/// A table: ordered columns, at most one primary key, foreign keys,
/// and indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name (unique within its database).
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Primary key column names, in order. Empty means no primary key.
    pub primary_key: Vec<String>,
    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKey>,
    /// Indexes.
    pub indexes: Vec<Index>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key column list.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Looks up a column by name (case-insensitive).
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a column mutably by name (case-insensitive).
    #[must_use]
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the primary key columns in key order.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key
            .iter()
            .filter_map(|name| self.get_column(name))
            .collect()
    }

    /// Returns the auto-increment column, if the table has exactly one.
    /// With more than one flagged column, validation rejects the model
    /// before generation ever asks.
    #[must_use]
    pub fn auto_increment_column(&self) -> Option<&Column> {
        let mut flagged = self.columns.iter().filter(|c| c.auto_increment);
        match (flagged.next(), flagged.next()) {
            (Some(col), None) => Some(col),
            _ => None,
        }
    }

    /// Returns all columns flagged auto-increment.
    #[must_use]
    pub fn auto_increment_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.auto_increment).collect()
    }

    /// Returns whether two tables are structurally equal: columns and
    /// primary key in order, foreign keys and indexes as unordered
    /// sets, names compared case-insensitively.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        if !self.name.eq_ignore_ascii_case(&other.name)
            || self.columns.len() != other.columns.len()
            || !eq_name_lists(&self.primary_key, &other.primary_key)
        {
            return false;
        }
        if !self
            .columns
            .iter()
            .zip(other.columns.iter())
            .all(|(a, b)| a.structurally_eq(b))
        {
            return false;
        }
        set_eq(&self.foreign_keys, &other.foreign_keys, ForeignKey::same_reference)
            && set_eq(&self.indexes, &other.indexes, Index::covers_same)
    }
}

/// A named collection of tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    /// Database/model name.
    pub name: String,
    /// Optional version tag, carried through untouched.
    pub version: Option<String>,
    /// Tables in declaration order.
    pub tables: Vec<Table>,
}

impl Database {
    /// Creates an empty database model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            tables: Vec::new(),
        }
    }

    /// Sets the version tag.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Looks up a table by name (case-insensitive).
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a table mutably by name (case-insensitive).
    #[must_use]
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Returns whether two models contain structurally equal tables,
    /// matched by name, order-insensitively.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.tables.len() == other.tables.len()
            && self.tables.iter().all(|t| {
                other
                    .get_table(&t.name)
                    .is_some_and(|o| t.structurally_eq(o))
            })
    }

    /// Validates the model's internal references.
    ///
    /// Rejects duplicate table/column names, primary key columns that
    /// do not exist or are nullable, dangling foreign key endpoints,
    /// and tables with more than one auto-increment column.
    pub fn validate(&self) -> Result<()> {
        for (idx, table) in self.tables.iter().enumerate() {
            if self.tables[..idx]
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&table.name))
            {
                return Err(DdlError::validation(format!(
                    "duplicate table name '{}'",
                    table.name
                )));
            }
            self.validate_table(table)?;
        }
        Ok(())
    }

    fn validate_table(&self, table: &Table) -> Result<()> {
        for (idx, column) in table.columns.iter().enumerate() {
            if table.columns[..idx]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(DdlError::validation(format!(
                    "duplicate column name '{}' in table '{}'",
                    column.name, table.name
                )));
            }
        }

        for pk in &table.primary_key {
            let Some(column) = table.get_column(pk) else {
                return Err(DdlError::validation(format!(
                    "primary key column '{}' does not exist in table '{}'",
                    pk, table.name
                )));
            };
            if !column.required {
                return Err(DdlError::validation(format!(
                    "primary key column '{}' in table '{}' must be NOT NULL",
                    pk, table.name
                )));
            }
        }

        if table.auto_increment_columns().len() > 1 {
            return Err(DdlError::validation(format!(
                "table '{}' declares more than one auto-increment column",
                table.name
            )));
        }

        for fk in &table.foreign_keys {
            let Some(target) = self.get_table(&fk.referenced_table) else {
                return Err(DdlError::validation(format!(
                    "foreign key in table '{}' references unknown table '{}'",
                    table.name, fk.referenced_table
                )));
            };
            if fk.columns.len() != fk.referenced_columns.len() {
                return Err(DdlError::validation(format!(
                    "foreign key in table '{}' has mismatched column counts",
                    table.name
                )));
            }
            for local in &fk.columns {
                if table.get_column(local).is_none() {
                    return Err(DdlError::validation(format!(
                        "foreign key in table '{}' references unknown local column '{local}'",
                        table.name
                    )));
                }
            }
            for remote in &fk.referenced_columns {
                if target.get_column(remote).is_none() {
                    return Err(DdlError::validation(format!(
                        "foreign key in table '{}' references unknown column '{}.{remote}'",
                        table.name, target.name
                    )));
                }
            }
        }

        for index in &table.indexes {
            for col in &index.columns {
                if table.get_column(col).is_none() {
                    return Err(DdlError::validation(format!(
                        "index '{}' in table '{}' covers unknown column '{col}'",
                        index.name, table.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn eq_name_lists(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

fn set_eq<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len()
        && a.iter().all(|x| b.iter().any(|y| eq(x, y)))
        && b.iter().all(|y| a.iter().any(|x| eq(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn valid_model_passes() {
        let db = Database::new("shop").table(orders());
        assert!(db.validate().is_ok());
    }

    #[test]
    fn dangling_foreign_key_is_rejected() {
        let db = Database::new("shop").table(
            orders().foreign_key(ForeignKey::new(
                vec!["customer".into()],
                "customers",
                vec!["id".into()],
            )),
        );
        let err = db.validate().unwrap_err();
        assert!(err.to_string().contains("unknown table 'customers'"));
    }

    #[test]
    fn nullable_primary_key_is_rejected() {
        let table = Table::new("t")
            .column(Column::new("id", TypeCode::Integer))
            .primary_key(vec!["id".into()]);
        let db = Database::new("d").table(table);
        let err = db.validate().unwrap_err();
        assert!(err.to_string().contains("must be NOT NULL"));
    }

    #[test]
    fn two_auto_increment_columns_are_rejected() {
        let table = Table::new("t")
            .column(Column::new("a", TypeCode::Integer).not_null().auto_increment())
            .column(Column::new("b", TypeCode::Integer).not_null().auto_increment());
        let db = Database::new("d").table(table);
        let err = db.validate().unwrap_err();
        assert!(err.to_string().contains("more than one auto-increment"));
        assert!(table_has_no_single_auto_increment(&db));
    }

    fn table_has_no_single_auto_increment(db: &Database) -> bool {
        db.get_table("t").unwrap().auto_increment_column().is_none()
    }

    #[test]
    fn structural_equality_ignores_case_and_key_names() {
        let a = Table::new("ORDERS")
            .column(Column::new("ID", TypeCode::Integer).not_null())
            .primary_key(vec!["ID".into()])
            .index(Index::new("idx_one", vec!["ID".into()]));
        let b = Table::new("orders")
            .column(Column::new("id", TypeCode::Integer).not_null())
            .primary_key(vec!["id".into()])
            .index(Index::new("completely_different", vec!["id".into()]));
        assert!(a.structurally_eq(&b));
    }

    #[test]
    fn structural_equality_sees_column_changes() {
        let a = Table::new("t").column(Column::new("c", TypeCode::Varchar).size(40));
        let b = Table::new("t").column(Column::new("c", TypeCode::Varchar).size(80));
        assert!(!a.structurally_eq(&b));
    }

    #[test]
    fn index_sets_compare_order_insensitively() {
        let a = Table::new("t")
            .column(Column::new("x", TypeCode::Integer))
            .column(Column::new("y", TypeCode::Integer))
            .index(Index::new("i1", vec!["x".into()]))
            .index(Index::new("i2", vec!["y".into()]).unique());
        let b = Table::new("t")
            .column(Column::new("x", TypeCode::Integer))
            .column(Column::new("y", TypeCode::Integer))
            .index(Index::new("other2", vec!["y".into()]).unique())
            .index(Index::new("other1", vec!["x".into()]));
        assert!(a.structurally_eq(&b));
    }

    #[test]
    fn model_serializes_to_json() {
        let db = Database::new("shop").version("1.1").table(orders());
        let json = serde_json::to_string(&db).unwrap();
        let back: Database = serde_json::from_str(&json).unwrap();
        assert!(db.structurally_eq(&back));
    }
}
