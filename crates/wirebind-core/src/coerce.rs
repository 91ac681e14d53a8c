//! # Type Coercion
//!
//! Conversion of wire-format strings into typed field values.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Each conversion handles exactly one output type
//! - **O**: Open for extension via [`CoercionRegistry::register`]
//! - **D**: The binder depends on the registry interface, not concrete parsers
//!
//! A registered coercion for a field's exact type always takes precedence
//! over the built-in conversion for that kind. Built-ins cover strings,
//! signed and unsigned integers at every width, booleans, floats, one
//! RFC3339 timestamp type, and single-dimension string sequences. Parse
//! failures here are binding failures - malformed wire data, reported as
//! server-classified errors before validation ever runs.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::shape::{Coerced, FieldKind};
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;

/// Conversion function from a wire string to a type-erased value
pub type CoerceFn = Box<dyn Fn(&Context, &str) -> Result<Coerced> + Send + Sync>;

struct RegisteredCoercion {
    type_name: &'static str,
    convert: CoerceFn,
}

/// Registry of user-supplied coercion functions, keyed by output type
///
/// Owned by one parser instance and populated before serving begins;
/// lookups are read-only thereafter and no entry can be removed.
#[derive(Default)]
pub struct CoercionRegistry {
    entries: HashMap<TypeId, RegisteredCoercion>,
}

impl CoercionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion for output type `T`
    ///
    /// The signature shape - ambient context plus wire string in, exactly
    /// one output type - is enforced by the type system.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateCoercion` if `T` already has an entry.
    pub fn register<T, F>(&mut self, convert: F) -> Result<()>
    where
        T: Any + Send,
        F: Fn(&Context, &str) -> Result<T> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        if self.entries.contains_key(&type_id) {
            return Err(Error::DuplicateCoercion {
                type_name: std::any::type_name::<T>(),
            });
        }

        self.entries.insert(
            type_id,
            RegisteredCoercion {
                type_name: std::any::type_name::<T>(),
                convert: Box::new(move |cx, raw| convert(cx, raw).map(Coerced::new)),
            },
        );
        Ok(())
    }

    /// Look up the conversion registered for a type identity
    #[must_use]
    pub fn lookup(&self, type_id: TypeId) -> Option<&CoerceFn> {
        self.entries.get(&type_id).map(|entry| &entry.convert)
    }

    /// Check whether a type identity has a registered conversion
    #[must_use]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// Number of registered conversions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        f.debug_struct("CoercionRegistry").field("types", &names).finish()
    }
}

/// Convert a wire string using the built-in conversion for a field kind
///
/// Returns a human-readable failure reason; the binder wraps it into
/// `Error::Coerce` with section and field context.
pub(crate) fn coerce_builtin(kind: FieldKind, raw: &str) -> std::result::Result<Coerced, String> {
    match kind {
        FieldKind::Str => Ok(Coerced::new(raw.to_string())),
        FieldKind::I8 => parse_num::<i8>(raw, "i8"),
        FieldKind::I16 => parse_num::<i16>(raw, "i16"),
        FieldKind::I32 => parse_num::<i32>(raw, "i32"),
        FieldKind::I64 => parse_num::<i64>(raw, "i64"),
        FieldKind::U8 => parse_num::<u8>(raw, "u8"),
        FieldKind::U16 => parse_num::<u16>(raw, "u16"),
        FieldKind::U32 => parse_num::<u32>(raw, "u32"),
        FieldKind::U64 => parse_num::<u64>(raw, "u64"),
        FieldKind::F32 => parse_num::<f32>(raw, "f32"),
        FieldKind::F64 => parse_num::<f64>(raw, "f64"),
        FieldKind::Bool => parse_bool(raw),
        FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
            .map(|instant| Coerced::new(instant.with_timezone(&Utc)))
            .map_err(|e| format!("cannot convert '{raw}' to timestamp: {e}")),
        FieldKind::StrList => Ok(Coerced::new(split_list(raw))),
        FieldKind::Nested(_) | FieldKind::Custom { .. } => {
            Err(format!("no built-in conversion for type '{}'", kind.type_name()))
        }
    }
}

fn parse_num<T>(raw: &str, kind_name: &str) -> std::result::Result<Coerced, String>
where
    T: std::str::FromStr + Any + Send,
    T::Err: Display,
{
    raw.parse::<T>()
        .map(Coerced::new)
        .map_err(|e| format!("cannot convert '{raw}' to {kind_name}: {e}"))
}

fn parse_bool(raw: &str) -> std::result::Result<Coerced, String> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Coerced::new(true)),
        "false" | "0" | "no" => Ok(Coerced::new(false)),
        _ => Err(format!("cannot convert '{raw}' to boolean")),
    }
}

/// Split a comma-separated wire value into a string sequence
///
/// Used for string-list fields on single-source protocols. An empty wire
/// value yields an empty sequence.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_register_and_lookup() {
        #[derive(Debug, PartialEq)]
        struct Money(i64);

        let mut registry = CoercionRegistry::new();
        registry
            .register::<Money, _>(|_cx, raw| {
                raw.parse::<i64>().map(Money).map_err(|e| Error::Coerce {
                    section: "query",
                    field: "amount".to_string(),
                    reason: e.to_string(),
                })
            })
            .unwrap();

        let convert = registry.lookup(TypeId::of::<Money>()).unwrap();
        let coerced = convert(&Context::new(), "250").unwrap();
        assert_eq!(coerced.take::<Money>("amount").unwrap(), Money(250));
    }

    #[test]
    fn test_reregistration_rejected() {
        let mut registry = CoercionRegistry::new();
        registry.register::<i64, _>(|_cx, raw| Ok(raw.len() as i64)).unwrap();

        let err = registry.register::<i64, _>(|_cx, _raw| Ok(0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateCoercion { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_integers_width_exact() {
        let v = coerce_builtin(FieldKind::I8, "-128").unwrap();
        assert_eq!(v.take::<i8>("f").unwrap(), -128);

        // out of range for i8
        assert!(coerce_builtin(FieldKind::I8, "128").is_err());

        let v = coerce_builtin(FieldKind::U64, "18446744073709551615").unwrap();
        assert_eq!(v.take::<u64>("f").unwrap(), u64::MAX);

        assert!(coerce_builtin(FieldKind::U16, "-1").is_err());
        assert!(coerce_builtin(FieldKind::I32, "abc").is_err());
    }

    #[test]
    fn test_builtin_bool_forms() {
        for raw in ["true", "TRUE", "1", "yes"] {
            let v = coerce_builtin(FieldKind::Bool, raw).unwrap();
            assert!(v.take::<bool>("f").unwrap());
        }
        for raw in ["false", "0", "no", "No"] {
            let v = coerce_builtin(FieldKind::Bool, raw).unwrap();
            assert!(!v.take::<bool>("f").unwrap());
        }
        assert!(coerce_builtin(FieldKind::Bool, "maybe").is_err());
    }

    #[test]
    fn test_builtin_float() {
        let v = coerce_builtin(FieldKind::F64, "3.25").unwrap();
        assert!((v.take::<f64>("f").unwrap() - 3.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builtin_timestamp_rfc3339() {
        let v = coerce_builtin(FieldKind::Timestamp, "2024-05-01T12:30:00Z").unwrap();
        let instant = v.take::<DateTime<Utc>>("f").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());

        assert!(coerce_builtin(FieldKind::Timestamp, "yesterday").is_err());
    }

    #[test]
    fn test_builtin_string_list() {
        let v = coerce_builtin(FieldKind::StrList, "a,b,c").unwrap();
        assert_eq!(v.take::<Vec<String>>("f").unwrap(), vec!["a", "b", "c"]);

        let v = coerce_builtin(FieldKind::StrList, "").unwrap();
        assert!(v.take::<Vec<String>>("f").unwrap().is_empty());
    }

    #[test]
    fn test_builtin_rejects_custom_kind() {
        struct Opaque;
        assert!(coerce_builtin(FieldKind::custom::<Opaque>(), "x").is_err());
    }
}
