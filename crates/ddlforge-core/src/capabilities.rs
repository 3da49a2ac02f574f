//! Per-dialect capability descriptors.
//!
//! A [`Capabilities`] value is the immutable fact table for one
//! database product: identifier limits, quoting policy, the native-type
//! mapping, and the feature flags the builders and the model reader
//! consult. It is built once per dialect and shared read-only across a
//! whole generation run.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DdlError, Result};
use crate::types::TypeCode;

/// Immutable per-dialect facts.
#[derive(Debug, Clone)]
pub struct Capabilities {
    dialect: &'static str,
    max_identifier_length: usize,
    native_types: BTreeMap<TypeCode, String>,
    size_suppressed: BTreeSet<TypeCode>,
    size_required: BTreeMap<TypeCode, u32>,
    delimited_identifiers: bool,
    identifier_quote: char,
    supports_comments: bool,
    embeds_foreign_keys_in_create_table: bool,
    embeds_indexes_in_create_table: bool,
    requires_commit_after_ddl: bool,
    supports_native_alter_column_type: bool,
}

impl Capabilities {
    /// Builds the portable base descriptor: ANSI-ish mappings for every
    /// type code with a portable rendering, delimited identifiers with
    /// double quotes, and conservative feature flags. Dialect
    /// constructors start here and apply their deltas.
    #[must_use]
    pub fn standard(dialect: &'static str) -> Self {
        let mut native_types = BTreeMap::new();
        for (code, native) in [
            (TypeCode::Bit, "BIT"),
            (TypeCode::Boolean, "BOOLEAN"),
            (TypeCode::TinyInt, "TINYINT"),
            (TypeCode::SmallInt, "SMALLINT"),
            (TypeCode::Integer, "INTEGER"),
            (TypeCode::BigInt, "BIGINT"),
            (TypeCode::Real, "REAL"),
            (TypeCode::Float, "FLOAT"),
            (TypeCode::Double, "DOUBLE PRECISION"),
            (TypeCode::Decimal, "DECIMAL"),
            (TypeCode::Numeric, "NUMERIC"),
            (TypeCode::Char, "CHAR"),
            (TypeCode::Varchar, "VARCHAR"),
            (TypeCode::LongVarchar, "LONG VARCHAR"),
            (TypeCode::Clob, "CLOB"),
            (TypeCode::Binary, "BINARY"),
            (TypeCode::Varbinary, "VARBINARY"),
            (TypeCode::LongVarbinary, "LONG VARBINARY"),
            (TypeCode::Blob, "BLOB"),
            (TypeCode::Date, "DATE"),
            (TypeCode::Time, "TIME"),
            (TypeCode::Timestamp, "TIMESTAMP"),
            // Array and Other intentionally unmapped: they resolve
            // through the fallback chain or fail.
        ] {
            native_types.insert(code, native.to_string());
        }

        Self {
            dialect,
            max_identifier_length: 128,
            native_types,
            size_suppressed: BTreeSet::new(),
            size_required: BTreeMap::new(),
            delimited_identifiers: true,
            identifier_quote: '"',
            supports_comments: false,
            embeds_foreign_keys_in_create_table: false,
            embeds_indexes_in_create_table: false,
            requires_commit_after_ddl: false,
            supports_native_alter_column_type: true,
        }
    }

    // ---- construction deltas -----------------------------------------

    /// Overrides or adds a native type mapping.
    #[must_use]
    pub fn with_native_type(mut self, code: TypeCode, native: impl Into<String>) -> Self {
        self.native_types.insert(code, native.into());
        self
    }

    /// Removes a native type mapping, forcing the fallback chain.
    #[must_use]
    pub fn without_native_type(mut self, code: TypeCode) -> Self {
        self.native_types.remove(&code);
        self
    }

    /// Suppresses size rendering for a type the product defines as
    /// unsized (e.g. BYTEA, TEXT).
    #[must_use]
    pub fn suppress_size(mut self, code: TypeCode) -> Self {
        self.size_suppressed.insert(code);
        self
    }

    /// Requires an explicit size for a type, with the default used when
    /// the model carries none.
    #[must_use]
    pub fn require_size(mut self, code: TypeCode, default_size: u32) -> Self {
        self.size_required.insert(code, default_size);
        self
    }

    /// Sets the maximum identifier length.
    #[must_use]
    pub fn max_identifiers(mut self, length: usize) -> Self {
        self.max_identifier_length = length;
        self
    }

    /// Sets whether identifiers are emitted delimited (quoted).
    #[must_use]
    pub fn delimited_identifiers(mut self, enabled: bool) -> Self {
        self.delimited_identifiers = enabled;
        self
    }

    /// Sets whether the product supports comment statements.
    #[must_use]
    pub fn comments(mut self, enabled: bool) -> Self {
        self.supports_comments = enabled;
        self
    }

    /// Sets whether foreign keys must be embedded in CREATE TABLE.
    #[must_use]
    pub fn embed_foreign_keys(mut self, enabled: bool) -> Self {
        self.embeds_foreign_keys_in_create_table = enabled;
        self
    }

    /// Sets whether indexes are embedded in CREATE TABLE.
    #[must_use]
    pub fn embed_indexes(mut self, enabled: bool) -> Self {
        self.embeds_indexes_in_create_table = enabled;
        self
    }

    /// Sets whether an explicit COMMIT is required after DDL groups.
    #[must_use]
    pub fn commit_after_ddl(mut self, enabled: bool) -> Self {
        self.requires_commit_after_ddl = enabled;
        self
    }

    /// Sets whether the product has a native ALTER COLUMN type change.
    #[must_use]
    pub fn native_alter_column_type(mut self, enabled: bool) -> Self {
        self.supports_native_alter_column_type = enabled;
        self
    }

    // ---- lookups -----------------------------------------------------

    /// Returns the native type string for a code, walking the fallback
    /// chain when the product has no direct mapping.
    pub fn native_type(&self, code: TypeCode) -> Result<&str> {
        let mut current = code;
        loop {
            if let Some(native) = self.native_types.get(&current) {
                return Ok(native);
            }
            match current.fallback() {
                Some(next) => current = next,
                None => {
                    return Err(DdlError::unsupported(
                        self.dialect,
                        format!("columns of type {code}"),
                    ))
                }
            }
        }
    }

    /// Returns whether size is emitted for the given code.
    #[must_use]
    pub fn emits_size_for(&self, code: TypeCode) -> bool {
        code.takes_size() && !self.size_suppressed.contains(&code)
    }

    /// Returns the size to render for a column: the declared size, or
    /// the product's required default when the type must carry one.
    #[must_use]
    pub fn effective_size(&self, code: TypeCode, declared: Option<u32>) -> Option<u32> {
        declared.or_else(|| self.size_required.get(&code).copied())
    }

    /// Quotes an identifier according to the delimited-identifier
    /// policy. With the policy off, the identifier passes through
    /// unchanged.
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        if self.delimited_identifiers {
            let q = self.identifier_quote;
            format!("{q}{identifier}{q}")
        } else {
            identifier.to_string()
        }
    }

    /// Shortens an identifier to the maximum length, keeping the prefix
    /// and appending a deterministic suffix derived from the full name
    /// so repeated runs produce the same result and distinct inputs do
    /// not collapse onto each other.
    #[must_use]
    pub fn shorten(&self, identifier: &str) -> String {
        if identifier.len() <= self.max_identifier_length {
            return identifier.to_string();
        }
        let suffix = format!("_{:08x}", fnv1a(identifier.as_bytes()));
        let keep = self.max_identifier_length.saturating_sub(suffix.len());
        format!("{}{}", &identifier[..keep], suffix)
    }

    /// Dialect name this descriptor belongs to.
    #[must_use]
    pub fn dialect(&self) -> &'static str {
        self.dialect
    }

    /// Maximum identifier length.
    #[must_use]
    pub fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
    }

    /// Whether identifiers are emitted delimited.
    #[must_use]
    pub fn uses_delimited_identifiers(&self) -> bool {
        self.delimited_identifiers
    }

    /// Whether the product supports comment statements.
    #[must_use]
    pub fn supports_comments(&self) -> bool {
        self.supports_comments
    }

    /// Whether foreign keys are embedded in CREATE TABLE.
    #[must_use]
    pub fn embeds_foreign_keys_in_create_table(&self) -> bool {
        self.embeds_foreign_keys_in_create_table
    }

    /// Whether indexes are embedded in CREATE TABLE.
    #[must_use]
    pub fn embeds_indexes_in_create_table(&self) -> bool {
        self.embeds_indexes_in_create_table
    }

    /// Whether an explicit COMMIT is required after DDL groups.
    #[must_use]
    pub fn requires_commit_after_ddl(&self) -> bool {
        self.requires_commit_after_ddl
    }

    /// Whether the product can change a column type with a direct
    /// ALTER statement.
    #[must_use]
    pub fn supports_native_alter_column_type(&self) -> bool {
        self.supports_native_alter_column_type
    }
}

/// 32-bit FNV-1a. Stable across runs and platforms, which the suffix
/// rule depends on.
fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_type_falls_back_to_superset() {
        let caps = Capabilities::standard("test").without_native_type(TypeCode::Boolean);
        // Boolean -> Bit, which the base table still maps.
        assert_eq!(caps.native_type(TypeCode::Boolean).unwrap(), "BIT");
        // Array has no base mapping and falls through to Blob.
        assert_eq!(caps.native_type(TypeCode::Array).unwrap(), "BLOB");
    }

    #[test]
    fn exhausted_fallback_is_an_unsupported_feature() {
        let caps = Capabilities::standard("test").without_native_type(TypeCode::Blob);
        let err = caps.native_type(TypeCode::Array).unwrap_err();
        assert!(matches!(err, DdlError::UnsupportedFeature { .. }));
    }

    #[test]
    fn quoting_follows_the_delimiter_policy() {
        let caps = Capabilities::standard("test");
        assert_eq!(caps.quote("orders"), "\"orders\"");
        let bare = Capabilities::standard("test").delimited_identifiers(false);
        assert_eq!(bare.quote("orders"), "orders");
    }

    #[test]
    fn shorten_is_stable_and_collision_resistant() {
        let caps = Capabilities::standard("test").max_identifiers(31);
        let long_a = "trg_a_very_long_table_name_with_a_long_column";
        let long_b = "trg_a_very_long_table_name_with_b_long_column";
        let a1 = caps.shorten(long_a);
        let a2 = caps.shorten(long_a);
        let b = caps.shorten(long_b);
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1.len() <= 31);
        assert!(a1.starts_with("trg_a_very_long"));

        let short = caps.shorten("trg_orders_id");
        assert_eq!(short, "trg_orders_id");
    }

    #[test]
    fn required_size_supplies_a_default() {
        let caps = Capabilities::standard("test").require_size(TypeCode::Binary, 254);
        assert_eq!(caps.effective_size(TypeCode::Binary, None), Some(254));
        assert_eq!(caps.effective_size(TypeCode::Binary, Some(16)), Some(16));
        assert_eq!(caps.effective_size(TypeCode::Varchar, None), None);
    }
}
