//! Typed schema changes.
//!
//! The planner's output: each variant carries enough context (table
//! reference, before/after column or key) for a dialect to render it
//! without re-consulting the models it was computed from.

use crate::error::{DdlError, Result};
use crate::model::{Column, Database, ForeignKey, Index, Table};

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Create a new table. The carried table holds no foreign keys;
    /// those arrive as separate [`Change::AddForeignKey`] entries in a
    /// later pass.
    AddTable(AddTableChange),
    /// Drop an existing table (carried whole so auxiliary objects can
    /// be rendered without the source model).
    DropTable(DropTableChange),
    /// Add a column to an existing table.
    AddColumn(AddColumnChange),
    /// Drop a column.
    DropColumn(DropColumnChange),
    /// Change a column definition in place.
    ModifyColumn(ModifyColumnChange),
    /// Add a primary key.
    AddPrimaryKey(AddPrimaryKeyChange),
    /// Drop a primary key.
    DropPrimaryKey(DropPrimaryKeyChange),
    /// Add a foreign key constraint.
    AddForeignKey(AddForeignKeyChange),
    /// Drop a foreign key constraint.
    DropForeignKey(DropForeignKeyChange),
    /// Create an index.
    AddIndex(AddIndexChange),
    /// Drop an index.
    DropIndex(DropIndexChange),
}

/// Create table change.
#[derive(Debug, Clone, PartialEq)]
pub struct AddTableChange {
    /// The table to create, foreign keys stripped.
    pub table: Table,
}

/// Drop table change.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableChange {
    /// The table being dropped, as the source model described it.
    pub table: Table,
}

/// Add column change.
#[derive(Debug, Clone, PartialEq)]
pub struct AddColumnChange {
    /// Owning table name.
    pub table: String,
    /// The new column.
    pub column: Column,
}

/// Drop column change.
#[derive(Debug, Clone, PartialEq)]
pub struct DropColumnChange {
    /// Owning table name.
    pub table: String,
    /// The column being dropped, as the source model described it.
    pub column: Column,
}

/// Modify column change.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyColumnChange {
    /// Owning table name.
    pub table: String,
    /// The column as the source model describes it.
    pub before: Column,
    /// The column as the target model wants it.
    pub after: Column,
}

/// Add primary key change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPrimaryKeyChange {
    /// Owning table name.
    pub table: String,
    /// Key columns in order.
    pub columns: Vec<String>,
}

/// Drop primary key change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPrimaryKeyChange {
    /// Owning table name.
    pub table: String,
    /// The key columns being dropped.
    pub columns: Vec<String>,
}

/// Add foreign key change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForeignKeyChange {
    /// Owning table name.
    pub table: String,
    /// The constraint to add.
    pub foreign_key: ForeignKey,
}

/// Drop foreign key change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropForeignKeyChange {
    /// Owning table name.
    pub table: String,
    /// The constraint being dropped.
    pub foreign_key: ForeignKey,
}

/// Add index change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddIndexChange {
    /// Owning table name.
    pub table: String,
    /// The index to create.
    pub index: Index,
}

/// Drop index change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexChange {
    /// Owning table name.
    pub table: String,
    /// The index being dropped.
    pub index: Index,
}

macro_rules! change_from {
    ($($inner:ident => $variant:ident),* $(,)?) => {
        $(impl From<$inner> for Change {
            fn from(change: $inner) -> Self {
                Self::$variant(change)
            }
        })*
    };
}

change_from! {
    AddTableChange => AddTable,
    DropTableChange => DropTable,
    AddColumnChange => AddColumn,
    DropColumnChange => DropColumn,
    ModifyColumnChange => ModifyColumn,
    AddPrimaryKeyChange => AddPrimaryKey,
    DropPrimaryKeyChange => DropPrimaryKey,
    AddForeignKeyChange => AddForeignKey,
    DropForeignKeyChange => DropForeignKey,
    AddIndexChange => AddIndex,
    DropIndexChange => DropIndex,
}

impl Change {
    /// Name of the table this change applies to.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::AddTable(c) => &c.table.name,
            Self::DropTable(c) => &c.table.name,
            Self::AddColumn(c) => &c.table,
            Self::DropColumn(c) => &c.table,
            Self::ModifyColumn(c) => &c.table,
            Self::AddPrimaryKey(c) => &c.table,
            Self::DropPrimaryKey(c) => &c.table,
            Self::AddForeignKey(c) => &c.table,
            Self::DropForeignKey(c) => &c.table,
            Self::AddIndex(c) => &c.table,
            Self::DropIndex(c) => &c.table,
        }
    }

    /// Applies the change to a model in place.
    ///
    /// Callers that track an expected model (and the diff round-trip
    /// property) use this to advance a snapshot without re-reading the
    /// database.
    pub fn apply_to(&self, database: &mut Database) -> Result<()> {
        match self {
            Self::AddTable(c) => {
                database.tables.push(c.table.clone());
                Ok(())
            }
            Self::DropTable(c) => {
                let before = database.tables.len();
                database
                    .tables
                    .retain(|t| !t.name.eq_ignore_ascii_case(&c.table.name));
                if database.tables.len() == before {
                    return Err(missing_table(&c.table.name));
                }
                Ok(())
            }
            Self::AddColumn(c) => {
                let table = lookup(database, &c.table)?;
                table.columns.push(c.column.clone());
                Ok(())
            }
            Self::DropColumn(c) => {
                let table = lookup(database, &c.table)?;
                table
                    .columns
                    .retain(|col| !col.name.eq_ignore_ascii_case(&c.column.name));
                Ok(())
            }
            Self::ModifyColumn(c) => {
                let table = lookup(database, &c.table)?;
                let Some(column) = table.get_column_mut(&c.before.name) else {
                    return Err(DdlError::validation(format!(
                        "cannot modify unknown column '{}.{}'",
                        c.table, c.before.name
                    )));
                };
                *column = c.after.clone();
                Ok(())
            }
            Self::AddPrimaryKey(c) => {
                let table = lookup(database, &c.table)?;
                table.primary_key = c.columns.clone();
                Ok(())
            }
            Self::DropPrimaryKey(c) => {
                let table = lookup(database, &c.table)?;
                table.primary_key.clear();
                Ok(())
            }
            Self::AddForeignKey(c) => {
                let table = lookup(database, &c.table)?;
                table.foreign_keys.push(c.foreign_key.clone());
                Ok(())
            }
            Self::DropForeignKey(c) => {
                let table = lookup(database, &c.table)?;
                table
                    .foreign_keys
                    .retain(|fk| !fk.same_reference(&c.foreign_key));
                Ok(())
            }
            Self::AddIndex(c) => {
                let table = lookup(database, &c.table)?;
                table.indexes.push(c.index.clone());
                Ok(())
            }
            Self::DropIndex(c) => {
                let table = lookup(database, &c.table)?;
                table.indexes.retain(|idx| !idx.covers_same(&c.index));
                Ok(())
            }
        }
    }
}

fn lookup<'a>(database: &'a mut Database, table: &str) -> Result<&'a mut Table> {
    database
        .get_table_mut(table)
        .ok_or_else(|| missing_table(table))
}

fn missing_table(table: &str) -> DdlError {
    DdlError::validation(format!("change references unknown table '{table}'"))
}
