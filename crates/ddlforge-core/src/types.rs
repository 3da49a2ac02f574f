//! Semantic SQL type codes and column value types.
//!
//! [`TypeCode`] is deliberately product-independent: a dialect's
//! [`Capabilities`](crate::capabilities::Capabilities) table maps each
//! code to the native type string that product understands, falling back
//! to the closest safe superset when a product has no direct equivalent.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Product-independent SQL type codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypeCode {
    /// Single bit / 0-1 value.
    Bit,
    /// Boolean.
    Boolean,
    /// Tiny integer (1 byte).
    TinyInt,
    /// Small integer (2 bytes).
    SmallInt,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    BigInt,
    /// Single-precision float.
    Real,
    /// Float (precision product-defined).
    Float,
    /// Double-precision float.
    Double,
    /// Exact decimal with precision and scale.
    Decimal,
    /// Numeric (exact, like Decimal).
    Numeric,
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    Varchar,
    /// Long variable-length character string.
    LongVarchar,
    /// Character large object.
    Clob,
    /// Fixed-length binary.
    Binary,
    /// Variable-length binary.
    Varbinary,
    /// Long variable-length binary.
    LongVarbinary,
    /// Binary large object.
    Blob,
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp,
    /// Array (no portable rendering; dialects map or reject it).
    Array,
    /// Any other driver-specific type.
    Other,
}

impl TypeCode {
    /// Returns whether columns of this code may carry a size.
    #[must_use]
    pub fn takes_size(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Varchar | Self::Binary | Self::Varbinary
        )
    }

    /// Returns whether columns of this code may carry precision/scale.
    #[must_use]
    pub fn takes_precision_and_scale(self) -> bool {
        matches!(self, Self::Decimal | Self::Numeric)
    }

    /// Returns whether this is a numeric code.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Bit
                | Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Real
                | Self::Float
                | Self::Double
                | Self::Decimal
                | Self::Numeric
        )
    }

    /// Returns the closest safe superset of this code, if one exists.
    ///
    /// Used by the capability lookup when a dialect has no native
    /// mapping for a code: the lookup walks this chain until it finds a
    /// mapped code or runs dry.
    #[must_use]
    pub fn fallback(self) -> Option<Self> {
        match self {
            Self::Boolean => Some(Self::Bit),
            Self::Bit | Self::TinyInt => Some(Self::SmallInt),
            Self::Float => Some(Self::Double),
            Self::Numeric => Some(Self::Decimal),
            Self::Clob => Some(Self::LongVarchar),
            Self::LongVarchar => Some(Self::Varchar),
            Self::Array | Self::Other | Self::LongVarbinary => Some(Self::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., CURRENT_TIMESTAMP).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Foreign key referential action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub enum ForeignKeyAction {
    /// No action.
    #[default]
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}
