//! Inferred language types for parameters and result fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The language-level type inferred for a column.
///
/// Canonical lowercase names (`as_str`) are what snapshots, fingerprints and
/// audit findings record; emission strategies map them to concrete Rust
/// types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangType {
    String,
    Int,
    Long,
    Short,
    Byte,
    Bool,
    Decimal,
    Double,
    Float,
    DateTime,
    Date,
    Time,
    Guid,
    Bytes,
    Json,
    #[default]
    Object,
}

impl LangType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LangType::String => "string",
            LangType::Int => "int",
            LangType::Long => "long",
            LangType::Short => "short",
            LangType::Byte => "byte",
            LangType::Bool => "bool",
            LangType::Decimal => "decimal",
            LangType::Double => "double",
            LangType::Float => "float",
            LangType::DateTime => "datetime",
            LangType::Date => "date",
            LangType::Time => "time",
            LangType::Guid => "guid",
            LangType::Bytes => "bytes",
            LangType::Json => "json",
            LangType::Object => "object",
        }
    }

    /// Map a SQL Server type name to a language type.
    ///
    /// Matching is case-insensitive and ignores length/precision suffixes
    /// such as `nvarchar(50)` or `decimal(18, 2)`. Unknown names map to
    /// [`LangType::Object`].
    pub fn from_sql(type_name: &str) -> Self {
        match base_type_name(type_name).as_str() {
            "bigint" => LangType::Long,
            "int" | "integer" => LangType::Int,
            "smallint" => LangType::Short,
            "tinyint" => LangType::Byte,
            "bit" | "bool" | "boolean" => LangType::Bool,
            "decimal" | "numeric" | "money" | "smallmoney" => LangType::Decimal,
            "float" => LangType::Double,
            "real" => LangType::Float,
            "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => LangType::DateTime,
            "date" => LangType::Date,
            "time" => LangType::Time,
            "uniqueidentifier" => LangType::Guid,
            "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => LangType::Bytes,
            "char" | "nchar" | "varchar" | "nvarchar" | "text" | "ntext" | "xml" | "sysname" => {
                LangType::String
            }
            "json" => LangType::Json,
            _ => LangType::Object,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LangType::Int
                | LangType::Long
                | LangType::Short
                | LangType::Byte
                | LangType::Decimal
                | LangType::Double
                | LangType::Float
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            LangType::Int | LangType::Long | LangType::Short | LangType::Byte
        )
    }
}

/// Lowercased type name with any `(...)` suffix removed.
pub fn base_type_name(type_name: &str) -> String {
    type_name
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl fmt::Display for LangType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language type: {0}")]
pub struct UnknownLangType(pub String);

impl FromStr for LangType {
    type Err = UnknownLangType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "string" => LangType::String,
            "int" => LangType::Int,
            "long" => LangType::Long,
            "short" => LangType::Short,
            "byte" => LangType::Byte,
            "bool" | "boolean" => LangType::Bool,
            "decimal" => LangType::Decimal,
            "double" => LangType::Double,
            "float" => LangType::Float,
            "datetime" => LangType::DateTime,
            "date" => LangType::Date,
            "time" => LangType::Time,
            "guid" => LangType::Guid,
            "bytes" => LangType::Bytes,
            "json" => LangType::Json,
            "object" => LangType::Object,
            other => return Err(UnknownLangType(other.to_string())),
        };
        Ok(ty)
    }
}
