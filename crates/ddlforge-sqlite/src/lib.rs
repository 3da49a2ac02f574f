//! # ddlforge-sqlite
//!
//! SQLite metadata provider for `ddlforge-core`.
//!
//! Implements [`ddlforge_core::MetadataProvider`] over a
//! [`sqlx::SqlitePool`], reading `sqlite_master` and the table
//! pragmas. SQLite reports neither constraint names nor an identity
//! flag in result metadata; auto-increment status is recovered from
//! the declared table SQL instead, and the reader's prefix filtering
//! takes care of the `sqlite_autoindex_` entries backing keys.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ddlforge_core::dialect::{dialect_for, DialectId};
//! use ddlforge_core::ModelReader;
//! use ddlforge_sqlite::SqliteIntrospector;
//!
//! # async fn demo(pool: sqlx::SqlitePool) -> ddlforge_core::Result<()> {
//! let dialect = dialect_for(DialectId::Sqlite);
//! let mut reader = ModelReader::new(dialect.as_ref(), SqliteIntrospector::new(pool));
//! let model = reader.read_database("main").await?;
//! println!("{} tables", model.tables.len());
//! # Ok(())
//! # }
//! ```

mod provider;

pub use provider::SqliteIntrospector;
