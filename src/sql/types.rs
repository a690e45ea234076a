//! Host type to SQL type conversion.

use super::dialect::{Dialect, SqlDialect};
use crate::translation::{TranslationError, TranslationResult};
use crate::tree::ValueType;

/// Convert a host value type to the SQL type name used by `dialect`.
///
/// Nullable wrappers are unwrapped first; the dialect's type table decides
/// the rest.
pub fn convert_type(ty: &ValueType, dialect: Dialect) -> TranslationResult<&'static str> {
    let underlying = ty.underlying();
    dialect
        .map_type(underlying)
        .ok_or_else(|| TranslationError::UnsupportedType(ty.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_table() {
        assert_eq!(convert_type(&ValueType::Int, Dialect::Sqlite).unwrap(), "int");
        assert_eq!(
            convert_type(&ValueType::String, Dialect::Sqlite).unwrap(),
            "nvarchar"
        );
        assert_eq!(
            convert_type(&ValueType::Double, Dialect::TSql).unwrap(),
            "decimal"
        );
        assert_eq!(
            convert_type(&ValueType::Guid, Dialect::Postgres).unwrap(),
            "uniqueidentifier"
        );
    }

    #[test]
    fn test_nullable_is_unwrapped() {
        let ty = ValueType::Decimal.nullable();
        assert_eq!(convert_type(&ty, Dialect::Sqlite).unwrap(), "decimal");
    }

    #[test]
    fn test_dialect_extension() {
        assert_eq!(convert_type(&ValueType::Bool, Dialect::TSql).unwrap(), "bit");
        assert_eq!(
            convert_type(&ValueType::DateTime, Dialect::Postgres).unwrap(),
            "timestamp"
        );
    }

    #[test]
    fn test_unmapped_type_fails() {
        let err = convert_type(&ValueType::Bool.nullable(), Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedType(ref t) if t == "bool?"));
    }
}
