//! # ddlforge-core
//!
//! Generation and reconciliation of relational schema DDL across SQL
//! dialects:
//!
//! - a canonical, dialect-neutral schema model ([`model`], [`types`]);
//! - per-dialect capability descriptors ([`capabilities`]) and SQL
//!   builder strategies ([`dialect`]) that hide product quirks such as
//!   identifier limits, identity emulation, and cast restrictions;
//! - a model reader ([`reader`]) that reconstructs the model from live
//!   metadata, correcting for what drivers report wrongly or not at
//!   all (driver crates such as `ddlforge-sqlite` supply the
//!   [`reader::MetadataProvider`] for one product);
//! - a comparator/planner ([`plan`], [`change`]) that diffs two models
//!   into a dependency-safe ordered change list.
//!
//! # Example
//!
//! ```rust
//! use ddlforge_core::dialect::{dialect_for, DialectId};
//! use ddlforge_core::model::{Column, Database, Table};
//! use ddlforge_core::types::TypeCode;
//!
//! let model = Database::new("shop").table(
//!     Table::new("orders")
//!         .column(Column::new("id", TypeCode::Integer).not_null().auto_increment())
//!         .column(Column::new("customer", TypeCode::Varchar).size(40))
//!         .primary_key(vec!["id".into()]),
//! );
//!
//! let dialect = dialect_for(DialectId::Firebird);
//! let script = dialect.create_script(&model).unwrap();
//! // CREATE TABLE, CREATE GENERATOR, CREATE TRIGGER, COMMIT
//! assert_eq!(script.len(), 4);
//! ```

pub mod capabilities;
pub mod change;
pub mod dialect;
pub mod error;
pub mod model;
pub mod plan;
pub mod reader;
pub mod script;
pub mod types;

pub use capabilities::Capabilities;
pub use change::Change;
pub use dialect::{dialect_by_name, dialect_for, DialectId, SqlDialect};
pub use error::{DdlError, Result};
pub use model::{Column, Database, ForeignKey, Index, Table};
pub use plan::diff_models;
pub use reader::{MetadataProvider, ModelReader, ReadAdjustments, ReadWarning};
pub use script::ScriptWriter;
pub use types::{DefaultValue, ForeignKeyAction, TypeCode};
