//! # Wirebind Core
//!
//! Core binding and validation engine for the wirebind framework.
//! Binds HTTP requests to strongly-typed shapes and validates them through
//! multiple cooperating layers, independent of any router or transport.
//!
//! ## Architecture
//!
//! A request shape declares up to five *sections* - Path, Query, Headers,
//! Cookies and Body - each described by a static layout table built through
//! an explicit registration API (no runtime reflection). The
//! [`RequestParser`] decomposes a shape into its sections, pulls wire values
//! from a router-supplied [`ParamSource`], coerces them via the
//! [`CoercionRegistry`], and then runs a four-stage validation pipeline
//! that keeps client-caused failures (aggregated, 400-class) strictly apart
//! from server-caused failures (immediate abort).
//!
//! ## Modules
//!
//! - `binder` - section decomposition, field binding, the parser facade
//! - `coerce` - type-coercion registry and built-in scalar conversions
//! - `context` - request-scoped ambient context for collaborators
//! - `discriminator` - union-shape detection and discriminator checks
//! - `error` - the two-kind error taxonomy
//! - `json` - high-performance JSON parsing with simd-json
//! - `rules` - consumed interface of the external rules engine
//! - `shape` - shape descriptors and the section/request traits
//! - `validation` - the client-facing validation error aggregate
//! - `validator` - the multi-layer validation pipeline

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binder;
pub mod coerce;
pub mod context;
pub mod discriminator;
pub mod error;
pub mod json;
pub mod rules;
pub mod shape;
pub mod validation;
mod validator;

pub use binder::{Method, ParamSource, RequestParser};
pub use coerce::{CoerceFn, CoercionRegistry};
pub use context::Context;
pub use discriminator::{check_discriminators, discriminator_literal, is_union_shape};
pub use error::{Error, Rejection, Result};
pub use json::{parse_body, parse_json, parse_json_bytes, to_json, to_json_pretty};
pub use rules::{RuleFn, RuleOutcome, Rules};
pub use shape::{
    BoundRequest, Coerced, FieldKind, FieldMeta, FieldView, LayoutKind, Section, SectionLayout,
    SectionRole,
};
pub use validation::{codes, CheckError, ValidationErrors, REQUEST_KEY};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
