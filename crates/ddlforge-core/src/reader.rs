//! Reading a live database back into the canonical model.
//!
//! Driver crates implement [`MetadataProvider`] for one product; the
//! generic [`ModelReader`] owns the orchestration and the correction
//! passes that compensate for metadata the drivers report wrongly or
//! not at all. The reader only ever issues read-only queries.

use core::fmt;
use std::future::Future;

use crate::dialect::SqlDialect;
use crate::error::{DdlError, Result};
use crate::model::{Column, Database, ForeignKey, Index, Table};

/// Per-dialect correction facts for the reader.
///
/// Internal index recognition is a plain prefix table: products name
/// the indexes backing primary and foreign keys with a fixed system
/// prefix, and few of them expose an is-system flag to check instead.
#[derive(Debug, Clone, Default)]
pub struct ReadAdjustments {
    probe_auto_increment: bool,
    internal_pk_index_prefixes: &'static [&'static str],
    internal_fk_index_prefixes: &'static [&'static str],
}

impl ReadAdjustments {
    /// Creates adjustments with nothing enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the zero-row probe that recovers auto-increment flags
    /// from result-set metadata when table metadata lacks them.
    #[must_use]
    pub fn probe_auto_increment(mut self, enabled: bool) -> Self {
        self.probe_auto_increment = enabled;
        self
    }

    /// Sets the name prefixes of system indexes backing primary keys.
    #[must_use]
    pub fn internal_pk_index_prefixes(mut self, prefixes: &'static [&'static str]) -> Self {
        self.internal_pk_index_prefixes = prefixes;
        self
    }

    /// Sets the name prefixes of system indexes backing foreign keys.
    #[must_use]
    pub fn internal_fk_index_prefixes(mut self, prefixes: &'static [&'static str]) -> Self {
        self.internal_fk_index_prefixes = prefixes;
        self
    }

    /// Whether the auto-increment probe runs for this dialect.
    #[must_use]
    pub fn probes_auto_increment(&self) -> bool {
        self.probe_auto_increment
    }

    /// Whether an index name identifies a system-generated index that
    /// must not appear in the reconstructed model.
    #[must_use]
    pub fn is_internal_index(&self, name: &str) -> bool {
        self.internal_pk_index_prefixes
            .iter()
            .chain(self.internal_fk_index_prefixes)
            .any(|prefix| name.starts_with(prefix))
    }
}

/// A non-fatal diagnostic collected while reading a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadWarning {
    /// The auto-increment probe failed for one table; its flag stays
    /// unset and the read continues.
    ProbeFailed {
        /// The table whose probe failed.
        table: String,
        /// The driver's description of the failure.
        reason: String,
    },
}

impl fmt::Display for ReadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeFailed { table, reason } => write!(
                f,
                "auto-increment probe failed for table '{table}': {reason} \
                 (flag left unset)"
            ),
        }
    }
}

/// Product metadata access, implemented by driver crates.
///
/// Each method maps to one read-only metadata call. The reader treats
/// failures of everything except [`MetadataProvider::probe_auto_increment`]
/// as fatal for the whole read.
pub trait MetadataProvider {
    /// Driver error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Names of the user tables.
    fn table_names(&mut self) -> impl Future<Output = std::result::Result<Vec<String>, Self::Error>>;

    /// Columns of one table, in declaration order.
    fn columns(
        &mut self,
        table: &str,
    ) -> impl Future<Output = std::result::Result<Vec<Column>, Self::Error>>;

    /// Primary key column names of one table, in key order.
    fn primary_key(
        &mut self,
        table: &str,
    ) -> impl Future<Output = std::result::Result<Vec<String>, Self::Error>>;

    /// Foreign keys of one table.
    fn foreign_keys(
        &mut self,
        table: &str,
    ) -> impl Future<Output = std::result::Result<Vec<ForeignKey>, Self::Error>>;

    /// Indexes of one table, system-generated ones included.
    fn indexes(
        &mut self,
        table: &str,
    ) -> impl Future<Output = std::result::Result<Vec<Index>, Self::Error>>;

    /// Executes a zero-row probe query and reports, per selected
    /// column, the auto-increment flag of the result-set metadata.
    fn probe_auto_increment(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = std::result::Result<Vec<bool>, Self::Error>>;
}

/// Reads a live database into a [`Database`] model, applying the
/// dialect's correction passes table by table.
pub struct ModelReader<'a, P> {
    dialect: &'a dyn SqlDialect,
    provider: P,
    warnings: Vec<ReadWarning>,
}

impl<'a, P: MetadataProvider> ModelReader<'a, P> {
    /// Creates a reader for one dialect over one metadata provider.
    pub fn new(dialect: &'a dyn SqlDialect, provider: P) -> Self {
        Self {
            dialect,
            provider,
            warnings: Vec::new(),
        }
    }

    /// Reads the whole database model.
    pub async fn read_database(&mut self, name: &str) -> Result<Database> {
        let adjustments = self.dialect.read_adjustments();
        let table_names = self
            .provider
            .table_names()
            .await
            .map_err(DdlError::introspection)?;

        let mut database = Database::new(name);
        for table_name in table_names {
            let table = self.read_table(&table_name, &adjustments).await?;
            database.tables.push(table);
        }
        Ok(database)
    }

    /// Reads one table and applies the correction passes. Each table
    /// is corrected independently; a probe failure here never affects
    /// another table.
    pub async fn read_table(
        &mut self,
        name: &str,
        adjustments: &ReadAdjustments,
    ) -> Result<Table> {
        let mut table = Table::new(name);
        table.columns = self
            .provider
            .columns(name)
            .await
            .map_err(DdlError::introspection)?;
        table.primary_key = self
            .provider
            .primary_key(name)
            .await
            .map_err(DdlError::introspection)?;
        table.foreign_keys = self
            .provider
            .foreign_keys(name)
            .await
            .map_err(DdlError::introspection)?;
        let indexes = self
            .provider
            .indexes(name)
            .await
            .map_err(DdlError::introspection)?;
        table.indexes = indexes
            .into_iter()
            .filter(|index| !adjustments.is_internal_index(&index.name))
            .collect();

        // Drivers regularly report primary key columns as nullable;
        // the model invariant says otherwise.
        for pk in table.primary_key.clone() {
            if let Some(column) = table.get_column_mut(&pk) {
                column.required = true;
            }
        }

        if adjustments.probes_auto_increment() && !table.primary_key.is_empty() {
            let sql = self.probe_sql(name, &table.primary_key);
            match self.provider.probe_auto_increment(&sql).await {
                Ok(flags) => {
                    let pk_names = table.primary_key.clone();
                    for (pk, flag) in pk_names.iter().zip(flags) {
                        if flag {
                            if let Some(column) = table.get_column_mut(pk) {
                                column.auto_increment = true;
                            }
                        }
                    }
                }
                Err(err) => self.warnings.push(ReadWarning::ProbeFailed {
                    table: name.to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        Ok(table)
    }

    /// Builds the zero-row probe statement for a table's key columns.
    /// Quoting mirrors the capability descriptor's delimited-identifier
    /// policy, like every other statement this dialect emits.
    #[must_use]
    pub fn probe_sql(&self, table: &str, columns: &[String]) -> String {
        let caps = self.dialect.capabilities();
        let cols = columns
            .iter()
            .map(|c| caps.quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {cols} FROM {} WHERE 1 = 0", caps.quote(table))
    }

    /// Warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[ReadWarning] {
        &self.warnings
    }

    /// Hands the collected warnings to the caller.
    pub fn take_warnings(&mut self) -> Vec<ReadWarning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{dialect_for, DialectId};
    use crate::types::TypeCode;
    use std::collections::HashMap;
    use std::io;

    /// An in-memory provider standing in for a live connection.
    #[derive(Default)]
    struct MapProvider {
        tables: Vec<String>,
        columns: HashMap<String, Vec<Column>>,
        pks: HashMap<String, Vec<String>>,
        fks: HashMap<String, Vec<ForeignKey>>,
        indexes: HashMap<String, Vec<Index>>,
        probe_flags: Option<Vec<bool>>,
        seen_probe_sql: Option<String>,
        fail_columns: bool,
    }

    impl MetadataProvider for MapProvider {
        type Error = io::Error;

        async fn table_names(&mut self) -> io::Result<Vec<String>> {
            Ok(self.tables.clone())
        }

        async fn columns(&mut self, table: &str) -> io::Result<Vec<Column>> {
            if self.fail_columns {
                return Err(io::Error::other("connection reset"));
            }
            Ok(self.columns.get(table).cloned().unwrap_or_default())
        }

        async fn primary_key(&mut self, table: &str) -> io::Result<Vec<String>> {
            Ok(self.pks.get(table).cloned().unwrap_or_default())
        }

        async fn foreign_keys(&mut self, table: &str) -> io::Result<Vec<ForeignKey>> {
            Ok(self.fks.get(table).cloned().unwrap_or_default())
        }

        async fn indexes(&mut self, table: &str) -> io::Result<Vec<Index>> {
            Ok(self.indexes.get(table).cloned().unwrap_or_default())
        }

        async fn probe_auto_increment(&mut self, sql: &str) -> io::Result<Vec<bool>> {
            self.seen_probe_sql = Some(sql.to_string());
            self.probe_flags
                .clone()
                .ok_or_else(|| io::Error::other("probe rejected"))
        }
    }

    fn orders_provider() -> MapProvider {
        let mut provider = MapProvider {
            tables: vec!["ORDERS".into()],
            probe_flags: Some(vec![true]),
            ..MapProvider::default()
        };
        provider.columns.insert(
            "ORDERS".into(),
            vec![
                // Reported nullable and without identity, the way a
                // driver with incomplete metadata would.
                Column::new("ID", TypeCode::Integer),
                Column::new("CUSTOMER", TypeCode::Varchar).size(40),
            ],
        );
        provider.pks.insert("ORDERS".into(), vec!["ID".into()]);
        provider.indexes.insert(
            "ORDERS".into(),
            vec![
                Index::new("SYS_PK_10092", vec!["ID".into()]).unique(),
                Index::new("SYS_IDX_10101", vec!["CUSTOMER".into()]),
                Index::new("IDX_CUSTOMER", vec!["CUSTOMER".into()]),
            ],
        );
        provider
    }

    #[tokio::test]
    async fn probe_recovers_auto_increment_from_result_metadata() {
        let dialect = dialect_for(DialectId::Hsqldb);
        let mut reader = ModelReader::new(dialect.as_ref(), orders_provider());
        let database = reader.read_database("shop").await.unwrap();

        let orders = database.get_table("ORDERS").unwrap();
        let id = orders.get_column("ID").unwrap();
        assert!(id.auto_increment);
        assert!(id.required, "primary key columns are forced NOT NULL");
        assert!(reader.warnings().is_empty());
    }

    #[tokio::test]
    async fn probe_statement_mirrors_the_quoting_policy() {
        let dialect = dialect_for(DialectId::Hsqldb);
        let mut reader = ModelReader::new(dialect.as_ref(), orders_provider());
        reader.read_database("shop").await.unwrap();
        assert_eq!(
            reader.provider.seen_probe_sql.as_deref(),
            Some("SELECT \"ID\" FROM \"ORDERS\" WHERE 1 = 0")
        );
    }

    #[tokio::test]
    async fn probe_failure_degrades_to_a_warning() {
        let dialect = dialect_for(DialectId::Hsqldb);
        let mut provider = orders_provider();
        provider.probe_flags = None;
        let mut reader = ModelReader::new(dialect.as_ref(), provider);
        let database = reader.read_database("shop").await.unwrap();

        let id = database.get_table("ORDERS").unwrap().get_column("ID").unwrap();
        assert!(!id.auto_increment);
        let warnings = reader.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            ReadWarning::ProbeFailed { table, .. } if table == "ORDERS"
        ));
        assert!(reader.warnings().is_empty());
    }

    #[tokio::test]
    async fn system_indexes_are_filtered_by_prefix() {
        let dialect = dialect_for(DialectId::Hsqldb);
        let mut reader = ModelReader::new(dialect.as_ref(), orders_provider());
        let database = reader.read_database("shop").await.unwrap();

        let indexes = &database.get_table("ORDERS").unwrap().indexes;
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "IDX_CUSTOMER");
    }

    #[tokio::test]
    async fn sqlite_never_probes() {
        let dialect = dialect_for(DialectId::Sqlite);
        let mut reader = ModelReader::new(dialect.as_ref(), orders_provider());
        reader.read_database("shop").await.unwrap();
        assert!(reader.provider.seen_probe_sql.is_none());
    }

    #[tokio::test]
    async fn core_metadata_failure_is_fatal() {
        let dialect = dialect_for(DialectId::Hsqldb);
        let mut provider = orders_provider();
        provider.fail_columns = true;
        let mut reader = ModelReader::new(dialect.as_ref(), provider);
        let err = reader.read_database("shop").await.unwrap_err();
        assert!(matches!(err, DdlError::Introspection { .. }));
    }
}
