//! Metadata queries against a live SQLite database.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::debug;

use ddlforge_core::model::{Column, ForeignKey, Index};
use ddlforge_core::reader::MetadataProvider;
use ddlforge_core::types::{DefaultValue, ForeignKeyAction, TypeCode};

/// Reads SQLite metadata through the table pragmas.
#[derive(Debug, Clone)]
pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    /// Creates an introspector over a connection pool. The pool is
    /// owned by the caller; only read-only queries go through it.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether the table was declared with the AUTOINCREMENT keyword.
    /// Table metadata has no flag for this; the declared SQL in
    /// `sqlite_master` does.
    async fn declares_autoincrement(&self, table: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;
        let declared: Option<String> = match row {
            Some(row) => row.try_get("sql")?,
            None => None,
        };
        Ok(declared
            .map(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT"))
            .unwrap_or(false))
    }

    async fn index_columns(&self, index: &str) -> Result<Vec<String>, sqlx::Error> {
        let sql = format!("PRAGMA index_info(\"{index}\")");
        debug!(sql = %sql, "reading index columns");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let seqno: i64 = row.try_get("seqno")?;
            let name: Option<String> = row.try_get("name")?;
            columns.push((seqno, name));
        }
        columns.sort_by_key(|(seqno, _)| *seqno);
        Ok(columns.into_iter().filter_map(|(_, name)| name).collect())
    }
}

impl MetadataProvider for SqliteIntrospector {
    type Error = sqlx::Error;

    async fn table_names(&mut self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| row.try_get("name")).collect()
    }

    async fn columns(&mut self, table: &str) -> Result<Vec<Column>, sqlx::Error> {
        let autoincrement = self.declares_autoincrement(table).await?;
        let sql = format!("PRAGMA table_info(\"{table}\")");
        debug!(sql = %sql, "reading columns");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let declared: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            let (type_code, size, precision, scale) = parse_declared_type(&declared);
            let mut column = Column::new(name, type_code);
            column.size = size;
            column.precision = precision;
            column.scale = scale;
            column.required = not_null != 0;
            column.default = default.as_deref().map(parse_default);
            column.auto_increment = autoincrement && pk > 0;
            columns.push(column);
        }
        Ok(columns)
    }

    async fn primary_key(&mut self, table: &str) -> Result<Vec<String>, sqlx::Error> {
        let sql = format!("PRAGMA table_info(\"{table}\")");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut key: Vec<(i64, String)> = Vec::new();
        for row in rows {
            let pk: i64 = row.try_get("pk")?;
            if pk > 0 {
                key.push((pk, row.try_get("name")?));
            }
        }
        key.sort_by_key(|(ordinal, _)| *ordinal);
        Ok(key.into_iter().map(|(_, name)| name).collect())
    }

    async fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>, sqlx::Error> {
        let sql = format!("PRAGMA foreign_key_list(\"{table}\")");
        debug!(sql = %sql, "reading foreign keys");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        // Rows arrive one per column, grouped by constraint id.
        let mut keys: Vec<(i64, ForeignKey)> = Vec::new();
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let referenced_table: String = row.try_get("table")?;
            let from: String = row.try_get("from")?;
            let to: Option<String> = row.try_get("to")?;
            let on_delete: String = row.try_get("on_delete")?;
            let on_update: String = row.try_get("on_update")?;

            let pos = match keys.iter().position(|(kid, _)| *kid == id) {
                Some(pos) => pos,
                None => {
                    let fk = ForeignKey::new(Vec::new(), referenced_table, Vec::new())
                        .on_delete(parse_action(&on_delete))
                        .on_update(parse_action(&on_update));
                    keys.push((id, fk));
                    keys.len() - 1
                }
            };
            let entry = &mut keys[pos].1;
            entry.columns.push(from);
            if let Some(to) = to {
                entry.referenced_columns.push(to);
            }
        }

        // A reference without explicit target columns points at the
        // referenced table's primary key.
        let mut resolved = Vec::with_capacity(keys.len());
        for (_, mut fk) in keys {
            if fk.referenced_columns.is_empty() {
                fk.referenced_columns = self.primary_key(&fk.referenced_table).await?;
            }
            resolved.push(fk);
        }
        Ok(resolved)
    }

    async fn indexes(&mut self, table: &str) -> Result<Vec<Index>, sqlx::Error> {
        let sql = format!("PRAGMA index_list(\"{table}\")");
        debug!(sql = %sql, "reading indexes");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut indexes = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let unique: i64 = row.try_get("unique")?;
            let columns = self.index_columns(&name).await?;
            let mut index = Index::new(name, columns);
            if unique != 0 {
                index = index.unique();
            }
            indexes.push(index);
        }
        Ok(indexes)
    }

    async fn probe_auto_increment(&mut self, sql: &str) -> Result<Vec<bool>, sqlx::Error> {
        // The SQLite driver exposes no identity flag in result
        // metadata, so the probe runs but reports nothing; the sqlite
        // dialect's corrections never request it.
        debug!(sql = %sql, "running auto-increment probe");
        sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(Vec::new())
    }
}

/// Splits a declared column type into a type code and its arguments.
fn parse_declared_type(declared: &str) -> (TypeCode, Option<u32>, Option<u16>, Option<u16>) {
    let trimmed = declared.trim().to_ascii_uppercase();
    let (base, args) = match trimmed.split_once('(') {
        Some((base, rest)) => (
            base.trim().to_string(),
            rest.trim_end_matches(')').to_string(),
        ),
        None => (trimmed, String::new()),
    };

    let type_code = match base.as_str() {
        "INT" | "INTEGER" => TypeCode::Integer,
        "TINYINT" => TypeCode::TinyInt,
        "SMALLINT" => TypeCode::SmallInt,
        "BIGINT" => TypeCode::BigInt,
        "REAL" => TypeCode::Real,
        "FLOAT" => TypeCode::Float,
        "DOUBLE" | "DOUBLE PRECISION" => TypeCode::Double,
        "DECIMAL" => TypeCode::Decimal,
        "NUMERIC" => TypeCode::Numeric,
        "CHAR" | "CHARACTER" => TypeCode::Char,
        "VARCHAR" | "CHARACTER VARYING" => TypeCode::Varchar,
        "TEXT" | "LONGVARCHAR" | "LONG VARCHAR" => TypeCode::LongVarchar,
        "CLOB" => TypeCode::Clob,
        "BINARY" => TypeCode::Binary,
        "VARBINARY" => TypeCode::Varbinary,
        "LONG VARBINARY" | "LONGVARBINARY" => TypeCode::LongVarbinary,
        "BLOB" => TypeCode::Blob,
        "DATE" => TypeCode::Date,
        "TIME" => TypeCode::Time,
        "TIMESTAMP" | "DATETIME" => TypeCode::Timestamp,
        "BOOLEAN" | "BOOL" => TypeCode::Boolean,
        "BIT" => TypeCode::Bit,
        _ => TypeCode::Other,
    };

    let mut numbers = args
        .split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok());
    if type_code.takes_precision_and_scale() {
        let precision = numbers.next().and_then(|n| u16::try_from(n).ok());
        let scale = numbers.next().and_then(|n| u16::try_from(n).ok());
        (type_code, None, precision, scale)
    } else {
        (type_code, numbers.next(), None, None)
    }
}

/// Interprets the literal text of a column default.
fn parse_default(text: &str) -> DefaultValue {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("NULL") {
        return DefaultValue::Null;
    }
    if trimmed.eq_ignore_ascii_case("TRUE") {
        return DefaultValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("FALSE") {
        return DefaultValue::Boolean(false);
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return DefaultValue::String(inner.replace("''", "'"));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return DefaultValue::Integer(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return DefaultValue::Float(float);
    }
    DefaultValue::Expression(trimmed.to_string())
}

fn parse_action(text: &str) -> ForeignKeyAction {
    match text.to_ascii_uppercase().as_str() {
        "CASCADE" => ForeignKeyAction::Cascade,
        "RESTRICT" => ForeignKeyAction::Restrict,
        "SET NULL" => ForeignKeyAction::SetNull,
        "SET DEFAULT" => ForeignKeyAction::SetDefault,
        _ => ForeignKeyAction::NoAction,
    }
}
