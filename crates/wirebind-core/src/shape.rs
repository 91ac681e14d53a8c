//! # Shape Descriptors
//!
//! Static descriptions of bindable request shapes.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Descriptors only describe layout; binding and validation live elsewhere
//! - **O**: New field kinds extend [`FieldKind`] without touching the binder
//! - **D**: The engine depends on the [`Section`] and [`BoundRequest`] traits,
//!   never on concrete shapes
//!
//! Instead of runtime reflection, every shape registers itself through an
//! explicit API: it produces a static table of per-field metadata
//! ([`SectionLayout`]), typically cached in a `OnceLock`, and exposes typed
//! assignment and read access through object-safe trait methods. The table
//! is discovered once per shape and never mutated afterwards.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::validation::CheckError;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::fmt;

/// One of the five recognized section roles of a request shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRole {
    /// Router-supplied path parameters
    Path,
    /// URL query parameters
    Query,
    /// Request headers
    Headers,
    /// Request cookies
    Cookies,
    /// Request body
    Body,
}

impl SectionRole {
    /// Fixed processing order: Path, Query, Headers, Cookies, Body
    pub const ORDER: [SectionRole; 5] = [
        SectionRole::Path,
        SectionRole::Query,
        SectionRole::Headers,
        SectionRole::Cookies,
        SectionRole::Body,
    ];

    /// Lowercase role name, used as the aggregate path-key prefix
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Headers => "headers",
            Self::Cookies => "cookies",
            Self::Body => "body",
        }
    }

    /// Whether this role's wire protocol can repeat a parameter natively
    ///
    /// Single-source roles fall back to comma-separated values for string
    /// sequences.
    #[must_use]
    pub fn is_multi_value(self) -> bool {
        matches!(self, Self::Query | Self::Headers)
    }

    /// Position in the fixed processing order
    #[must_use]
    pub fn order(self) -> usize {
        match self {
            Self::Path => 0,
            Self::Query => 1,
            Self::Headers => 2,
            Self::Cookies => 3,
            Self::Body => 4,
        }
    }
}

impl fmt::Display for SectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a bindable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 string
    Str,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Boolean
    Bool,
    /// RFC3339-formatted instant (`chrono::DateTime<Utc>`)
    Timestamp,
    /// Single-dimension string sequence
    StrList,
    /// Optional nested shape - a union alternative member
    Nested(&'static str),
    /// Any other type; requires a registered coercion
    Custom {
        /// Type identity used for registry lookup
        type_id: TypeId,
        /// Type name for diagnostics
        type_name: &'static str,
    },
}

impl FieldKind {
    /// Describe a custom field type
    #[must_use]
    pub fn custom<T: 'static>() -> Self {
        Self::Custom {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` a registered coercion must produce for this kind
    ///
    /// `None` for nested alternative members, which are never coerced from
    /// a wire string.
    #[must_use]
    pub fn type_id(self) -> Option<TypeId> {
        match self {
            Self::Str => Some(TypeId::of::<String>()),
            Self::I8 => Some(TypeId::of::<i8>()),
            Self::I16 => Some(TypeId::of::<i16>()),
            Self::I32 => Some(TypeId::of::<i32>()),
            Self::I64 => Some(TypeId::of::<i64>()),
            Self::U8 => Some(TypeId::of::<u8>()),
            Self::U16 => Some(TypeId::of::<u16>()),
            Self::U32 => Some(TypeId::of::<u32>()),
            Self::U64 => Some(TypeId::of::<u64>()),
            Self::F32 => Some(TypeId::of::<f32>()),
            Self::F64 => Some(TypeId::of::<f64>()),
            Self::Bool => Some(TypeId::of::<bool>()),
            Self::Timestamp => Some(TypeId::of::<DateTime<Utc>>()),
            Self::StrList => Some(TypeId::of::<Vec<String>>()),
            Self::Nested(_) => None,
            Self::Custom { type_id, .. } => Some(type_id),
        }
    }

    /// Human-readable kind name for diagnostics
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::StrList => "string list",
            Self::Nested(name) => name,
            Self::Custom { type_name, .. } => type_name,
        }
    }
}

/// A type-erased coerced value on its way into a shape field
///
/// Produced by the coercion registry or the built-in conversions, consumed
/// by [`Section::assign`]. The checked [`take`](Coerced::take) accessor
/// turns a wrong-type assignment into a server error instead of a panic.
pub struct Coerced {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Coerced {
    /// Wrap a typed value
    #[must_use]
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the wrapped type, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Extract the wrapped value as `T`
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` naming `field` if the wrapped value is
    /// not a `T`.
    pub fn take<T: Any>(self, field: &str) -> Result<T> {
        let Self { value, type_name } = self;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| Error::TypeMismatch {
            field: field.to_string(),
            expected: std::any::type_name::<T>(),
            actual: type_name,
        })
    }
}

impl fmt::Debug for Coerced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coerced").field("type_name", &self.type_name).finish()
    }
}

/// Borrowed read-only view of a bound field's current value
///
/// Consumed by the constraint and discriminator checks. `Unset` stands for
/// an optional field still holding `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldView<'a> {
    /// String value
    Str(&'a str),
    /// Signed integer value (any width, widened)
    Int(i64),
    /// Unsigned integer value (any width, widened)
    Uint(u64),
    /// Float value (any width, widened)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String sequence value
    StrList(&'a [String]),
    /// Raw byte sequence value
    Bytes(&'a [u8]),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
    /// Optional field currently holding no value
    Unset,
}

/// Parse a binding tag of the form `externalName[,discriminator=literal]`
///
/// The syntax is a wire-facing convention and must stay bit-exact: no
/// trimming, unknown options ignored, an empty name part falls back to the
/// declared field name at the call site.
fn parse_binding_tag(tag: &str) -> (Option<String>, Option<String>) {
    let mut parts = tag.split(',');
    let name = match parts.next() {
        Some("") | None => None,
        Some(name) => Some(name.to_string()),
    };

    let mut discriminator = None;
    for part in parts {
        if let Some(literal) = part.strip_prefix("discriminator=") {
            if discriminator.is_none() {
                discriminator = Some(literal.to_string());
            }
        }
    }

    (name, discriminator)
}

/// Per-field binding metadata
///
/// Composed of the declared name, the wire name (from the binding tag,
/// falling back to the declared name), an optional discriminator literal,
/// and a raw constraint tag parsed later by the validator.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    name: String,
    wire_name: String,
    discriminator: Option<String>,
    constraints: String,
    optional: bool,
    exported: bool,
    kind: FieldKind,
}

impl FieldMeta {
    /// Describe a field with its declared name and kind
    #[must_use]
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            wire_name: name.to_string(),
            discriminator: None,
            constraints: String::new(),
            optional: false,
            exported: true,
            kind,
        }
    }

    /// Attach a binding tag (`externalName[,discriminator=literal]`)
    #[must_use]
    pub fn bind_tag(mut self, tag: &str) -> Self {
        let (wire_name, discriminator) = parse_binding_tag(tag);
        if let Some(wire_name) = wire_name {
            self.wire_name = wire_name;
        }
        self.discriminator = discriminator;
        self
    }

    /// Attach a raw constraint tag (e.g. `"required,min=1,max=100"`)
    #[must_use]
    pub fn constraints(mut self, tag: &str) -> Self {
        self.constraints = tag.to_string();
        self
    }

    /// Mark the field as an optional wrapper (`Option<T>`)
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as not externally visible
    #[must_use]
    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Declared field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// External wire name
    #[must_use]
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Expected discriminator literal, if any
    #[must_use]
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// Raw constraint tag (empty when unconstrained)
    #[must_use]
    pub fn constraint_tag(&self) -> &str {
        &self.constraints
    }

    /// Whether the field is an optional wrapper
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the field is externally visible
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Declared field kind
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Structural classification of a section layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// A structured record with named fields
    Record,
    /// A raw byte sequence (Body only)
    RawBytes,
}

/// Static layout table for one section type
///
/// Built once per shape through the registration API and cached by the
/// shape (`OnceLock`); never mutated at runtime.
#[derive(Debug, Clone)]
pub struct SectionLayout {
    kind: LayoutKind,
    fields: Vec<FieldMeta>,
    raw_constraints: String,
}

impl SectionLayout {
    /// Describe a structured record section
    #[must_use]
    pub fn record(fields: Vec<FieldMeta>) -> Self {
        Self {
            kind: LayoutKind::Record,
            fields,
            raw_constraints: String::new(),
        }
    }

    /// Describe a raw-byte Body section with a section-level constraint tag
    ///
    /// Raw sections have no fields; constraints run against the byte
    /// sequence as a single unit.
    #[must_use]
    pub fn raw_bytes(constraint_tag: &str) -> Self {
        Self {
            kind: LayoutKind::RawBytes,
            fields: Vec::new(),
            raw_constraints: constraint_tag.to_string(),
        }
    }

    /// Structural classification
    #[must_use]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Field metadata table (empty for raw layouts)
    #[must_use]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Section-level constraint tag of a raw layout
    #[must_use]
    pub fn raw_constraints(&self) -> &str {
        &self.raw_constraints
    }

    /// Look up field metadata by declared name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|meta| meta.name == name)
    }
}

/// A bindable section value
///
/// Object-safe; the binder and validator drive every section through this
/// trait. Record sections implement [`layout`](Section::layout),
/// [`assign`](Section::assign) and [`view`](Section::view); raw Body
/// sections override [`assign_raw`](Section::assign_raw) and
/// [`raw_bytes`](Section::raw_bytes); structured Body sections override
/// [`decode_body`](Section::decode_body). The self-validation hooks return
/// `None` when the capability is not implemented, mirroring the optional
/// capability probing of the original contract.
pub trait Section {
    /// The section's static layout table
    fn layout(&self) -> &'static SectionLayout;

    /// Assign a coerced value to a field by declared name
    ///
    /// # Errors
    ///
    /// `Error::UnknownField` for undeclared fields, `Error::TypeMismatch`
    /// when the coerced value does not fit the field.
    fn assign(&mut self, field: &str, value: Coerced) -> Result<()> {
        drop(value);
        Err(Error::UnknownField {
            field: field.to_string(),
        })
    }

    /// Read-only view of a field's current value, by declared name
    fn view(&self, field: &str) -> Option<FieldView<'_>> {
        let _ = field;
        None
    }

    /// Store the raw transport body (raw-byte Body sections only)
    ///
    /// # Errors
    ///
    /// The default rejects the call; only raw layouts override it.
    fn assign_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let _ = bytes;
        Err(Error::SectionShape {
            section: "body",
            reason: "section does not accept a raw byte body".to_string(),
        })
    }

    /// The stored raw body (raw-byte Body sections only)
    fn raw_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Decode a structured transport body into this section
    ///
    /// # Errors
    ///
    /// The default rejects the call; structured Body sections override it,
    /// typically via [`crate::json::parse_body`].
    fn decode_body(&mut self, bytes: &[u8]) -> Result<()> {
        let _ = bytes;
        Err(Error::SectionShape {
            section: "body",
            reason: "section does not decode a structured body".to_string(),
        })
    }

    /// Context-free self-validation hook
    ///
    /// `None` means the capability is not implemented.
    fn validate(&self) -> Option<std::result::Result<(), CheckError>> {
        None
    }

    /// Context-aware self-validation hook, preferred over
    /// [`validate`](Section::validate) when both are implemented
    fn validate_with(&self, cx: &Context) -> Option<std::result::Result<(), CheckError>> {
        let _ = cx;
        None
    }
}

/// A bindable request shape
///
/// Yields at most one section per recognized role; anything else a shape
/// carries is invisible to the engine. The two hooks mirror the optional
/// request-level self-validation capability.
pub trait BoundRequest {
    /// Mutable access to the shape's declared sections
    fn sections(&mut self) -> Vec<(SectionRole, &mut dyn Section)>;

    /// Shared access to the shape's declared sections
    fn sections_ref(&self) -> Vec<(SectionRole, &dyn Section)>;

    /// The shape as `Any`, handed to the rules engine for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Context-free request-level self-validation hook
    fn validate(&self) -> Option<std::result::Result<(), CheckError>> {
        None
    }

    /// Context-aware request-level self-validation hook, preferred over
    /// [`validate`](BoundRequest::validate) when both are implemented
    fn validate_with(&self, cx: &Context) -> Option<std::result::Result<(), CheckError>> {
        let _ = cx;
        None
    }
}
