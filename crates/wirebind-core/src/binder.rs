//! # Request Binder
//!
//! Section decomposition and field binding for typed request shapes.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Binding only maps wire data onto a shape; validation is a separate pass
//! - **O**: New wire sources plug in through [`ParamSource`]
//! - **D**: The binder depends on the [`ParamSource`] and
//!   [`Section`](crate::shape::Section) traits, never on a transport
//!
//! Sections are processed in the fixed order Path, Query, Headers,
//! Cookies, Body. Absent wire values leave fields at their zero values -
//! required-ness is a validation concern, not a binding concern. Malformed
//! wire data that fails coercion is a server-classified binding failure:
//! the request could not even be mapped onto the requested shape.

use crate::coerce::{coerce_builtin, CoercionRegistry};
use crate::context::Context;
use crate::discriminator::is_union_shape;
use crate::error::{Error, Rejection, Result};
use crate::rules::Rules;
use crate::shape::{BoundRequest, Coerced, FieldKind, FieldMeta, LayoutKind, Section, SectionRole};
use crate::validator;
use std::fmt;
use tracing::debug;

/// HTTP method of the request being bound
///
/// The binder only consults this to decide whether a structured body may
/// be decoded (POST/PUT/PATCH conventionally carry a payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// Canonical uppercase method name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether this method conventionally carries a payload
    #[must_use]
    pub fn allows_payload(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire parameter source, supplied by the router/adapter layer
///
/// The core never performs transport-level parsing itself; every lookup
/// goes through this interface. `None` means the parameter is not present
/// on the wire. The multi-value accessors default to `None` for
/// single-source protocols, in which case string sequences fall back to
/// comma-separated parsing.
pub trait ParamSource {
    /// HTTP method of the request
    fn method(&self) -> Method;

    /// Router-supplied path parameter
    fn path_param(&self, name: &str) -> Option<String>;

    /// Query parameter (first value when repeated)
    fn query_param(&self, name: &str) -> Option<String>;

    /// Header value (first value when repeated)
    fn header_param(&self, name: &str) -> Option<String>;

    /// Cookie value
    fn cookie_param(&self, name: &str) -> Option<String>;

    /// All values of a natively-repeated query parameter
    fn query_params(&self, name: &str) -> Option<Vec<String>> {
        let _ = name;
        None
    }

    /// All values of a natively-repeated header
    fn header_params(&self, name: &str) -> Option<Vec<String>> {
        let _ = name;
        None
    }

    /// The collected transport body, if the source supports one
    fn body(&self) -> Option<&[u8]> {
        None
    }
}

/// The binding and validation engine for typed request shapes
///
/// Owns the type-coercion registry and the validator configuration -
/// explicitly constructed and dependency-injected, never process-global.
/// Populate the registry and rules before serving begins; afterwards the
/// parser is safe for concurrent use, with all per-call state
/// request-local.
#[derive(Default)]
pub struct RequestParser {
    coercions: CoercionRegistry,
    rules: Option<Box<dyn Rules>>,
}

impl RequestParser {
    /// Create a parser with an empty registry and no rules engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an external rules engine, applied once per request
    #[must_use]
    pub fn with_rules(mut self, rules: impl Rules + 'static) -> Self {
        self.rules = Some(Box::new(rules));
        self
    }

    /// The type-coercion registry
    #[must_use]
    pub fn coercions(&self) -> &CoercionRegistry {
        &self.coercions
    }

    /// Mutable access to the registry, for pre-serving population
    pub fn coercions_mut(&mut self) -> &mut CoercionRegistry {
        &mut self.coercions
    }

    /// Bind wire data onto a shape
    ///
    /// Sections are bound in the fixed role order; sections the shape does
    /// not declare are simply skipped and no defaults are synthesized.
    ///
    /// # Errors
    ///
    /// Every failure here is server-classified: structural section misuse,
    /// unsupported field types, and malformed wire data.
    pub fn bind(&self, cx: &Context, source: &dyn ParamSource, shape: &mut dyn BoundRequest) -> Result<()> {
        let mut sections = shape.sections();
        sections.sort_by_key(|(role, _)| role.order());

        let mut previous: Option<SectionRole> = None;
        for (role, section) in sections {
            if previous == Some(role) {
                return Err(Error::SectionShape {
                    section: role.name(),
                    reason: "shape declares the section role twice".to_string(),
                });
            }
            previous = Some(role);

            if role == SectionRole::Body {
                self.bind_body(source, section)?;
            } else {
                self.bind_params(cx, source, role, section)?;
            }
        }
        Ok(())
    }

    /// Run the multi-layer validation pipeline over a bound shape
    ///
    /// # Errors
    ///
    /// `Rejection::Invalid` with the aggregated client failures, or
    /// `Rejection::Server` if any layer failed on the server's behalf (in
    /// which case the aggregate is discarded).
    pub fn validate(&self, cx: &Context, shape: &dyn BoundRequest) -> std::result::Result<(), Rejection> {
        validator::run(cx, shape, self.rules.as_deref())
    }

    /// Bind and validate in one call
    ///
    /// # Errors
    ///
    /// Binding failures surface as `Rejection::Server`; validation
    /// failures follow the [`validate`](RequestParser::validate) contract.
    pub fn process(
        &self,
        cx: &Context,
        source: &dyn ParamSource,
        shape: &mut dyn BoundRequest,
    ) -> std::result::Result<(), Rejection> {
        self.bind(cx, source, shape)?;
        self.validate(cx, &*shape)
    }

    fn bind_params(
        &self,
        cx: &Context,
        source: &dyn ParamSource,
        role: SectionRole,
        section: &mut dyn Section,
    ) -> Result<()> {
        let layout = section.layout();
        if is_union_shape(layout) {
            return Err(Error::SectionShape {
                section: role.name(),
                reason: "union shapes cannot be bound from request parameters".to_string(),
            });
        }
        if layout.kind() != LayoutKind::Record {
            return Err(Error::SectionShape {
                section: role.name(),
                reason: "section layout must be a record".to_string(),
            });
        }

        debug!("Binding section '{}' ({} fields)", role, layout.fields().len());
        for meta in layout.fields() {
            self.bind_field(cx, source, role, meta, section)?;
        }
        Ok(())
    }

    fn bind_field(
        &self,
        cx: &Context,
        source: &dyn ParamSource,
        role: SectionRole,
        meta: &FieldMeta,
        section: &mut dyn Section,
    ) -> Result<()> {
        // Natively-repeated sources bypass the single-string conversion
        // path entirely for string sequences.
        if meta.kind() == FieldKind::StrList && role.is_multi_value() {
            let values = match role {
                SectionRole::Query => source.query_params(meta.wire_name()),
                SectionRole::Headers => source.header_params(meta.wire_name()),
                _ => None,
            };
            if let Some(values) = values {
                return section.assign(meta.name(), Coerced::new(values));
            }
        }

        let raw = match role {
            SectionRole::Path => source.path_param(meta.wire_name()),
            SectionRole::Query => source.query_param(meta.wire_name()),
            SectionRole::Headers => source.header_param(meta.wire_name()),
            SectionRole::Cookies => source.cookie_param(meta.wire_name()),
            SectionRole::Body => None,
        };
        // Absent values leave the field at its zero value; required-ness
        // is checked later by the validator.
        let Some(raw) = raw else {
            return Ok(());
        };

        // A registered coercion for the field's exact type takes
        // precedence over the built-in conversion.
        if let Some(type_id) = meta.kind().type_id() {
            if let Some(convert) = self.coercions.lookup(type_id) {
                let value = convert(cx, &raw)?;
                return section.assign(meta.name(), value);
            }
        }

        match coerce_builtin(meta.kind(), &raw) {
            Ok(value) => section.assign(meta.name(), value),
            Err(reason) => {
                if matches!(meta.kind(), FieldKind::Nested(_) | FieldKind::Custom { .. }) {
                    Err(Error::UnsupportedField {
                        section: role.name(),
                        field: meta.name().to_string(),
                        type_name: meta.kind().type_name().to_string(),
                    })
                } else {
                    Err(Error::Coerce {
                        section: role.name(),
                        field: meta.name().to_string(),
                        reason,
                    })
                }
            }
        }
    }

    fn bind_body(&self, source: &dyn ParamSource, section: &mut dyn Section) -> Result<()> {
        let layout = section.layout();
        match layout.kind() {
            // A raw byte body is read verbatim for every method; a source
            // without body support yields an empty sequence, never an error.
            LayoutKind::RawBytes => section.assign_raw(source.body().unwrap_or(&[])),
            LayoutKind::Record => {
                let method = source.method();
                if !method.allows_payload() {
                    debug!("Skipping structured body decode for {} request", method);
                    return Ok(());
                }
                let bytes = source.body().unwrap_or(&[]);
                if bytes.is_empty() {
                    return Ok(());
                }
                section.decode_body(bytes)
            }
        }
    }
}

impl fmt::Debug for RequestParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParser")
            .field("coercions", &self.coercions)
            .field("has_rules", &self.rules.is_some())
            .finish()
    }
}
