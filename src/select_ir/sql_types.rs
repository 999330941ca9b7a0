use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage class of a value, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Boolean,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Text,
    Timestamp,
    Uuid,
    Binary,
    /// Whole-row value, e.g. the result of a `t.*` placeholder
    Row,
}

impl TypeKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64 | TypeKind::Decimal | TypeKind::Double
        )
    }
}

/// Static result type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlType {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl SqlType {
    pub const fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    pub const fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    pub const fn int32() -> Self {
        Self::new(TypeKind::Int32)
    }

    pub const fn int64() -> Self {
        Self::new(TypeKind::Int64)
    }

    pub const fn text() -> Self {
        Self::new(TypeKind::Text)
    }

    pub const fn row() -> Self {
        Self::new(TypeKind::Row)
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }

    /// The same type with nullability removed (`int32?` -> `int32`).
    pub fn unwrap_nullable(self) -> Self {
        self.with_nullable(false)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::Decimal => "decimal",
            TypeKind::Double => "double",
            TypeKind::Text => "text",
            TypeKind::Timestamp => "timestamp",
            TypeKind::Uuid => "uuid",
            TypeKind::Binary => "binary",
            TypeKind::Row => "row",
        };
        f.write_str(name)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_nullable() {
        let ty = SqlType::nullable(TypeKind::Int32);
        assert_eq!(ty.unwrap_nullable(), SqlType::int32());
        assert_ne!(ty, SqlType::int32());
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(SqlType::int64().is_numeric());
        assert!(SqlType::new(TypeKind::Decimal).is_numeric());
        assert!(!SqlType::text().is_numeric());
        assert!(!SqlType::boolean().is_numeric());
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlType::nullable(TypeKind::Int16).to_string(), "int16?");
        assert_eq!(SqlType::text().to_string(), "text");
    }
}
