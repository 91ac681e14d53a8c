//! # Multi-Layer Validator
//!
//! Four ordered validation stages over one bound request.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Each stage checks one layer; classification is shared
//! - **O**: Custom layers plug in through the self-validation hooks and
//!   the rules engine, never by editing the pipeline
//! - **L**: Every stage obeys the same contract: merge client failures,
//!   abort on the first server failure
//!
//! Stage order: field constraints, section self-validation, request
//! self-validation, external rules. Client-classified failures accumulate
//! into one [`ValidationErrors`] aggregate; a server-classified failure at
//! any point aborts immediately and the aggregate is discarded - the two
//! are never mixed in one outcome.

use crate::context::Context;
use crate::error::{Error, Rejection};
use crate::rules::{RuleOutcome, Rules};
use crate::shape::{BoundRequest, FieldView, LayoutKind, Section, SectionRole};
use crate::validation::{codes, CheckError, ValidationErrors, REQUEST_KEY};
use crate::discriminator::is_union_shape;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Run the full pipeline over a bound request
pub(crate) fn run(
    cx: &Context,
    shape: &dyn BoundRequest,
    rules: Option<&dyn Rules>,
) -> std::result::Result<(), Rejection> {
    let mut aggregate = ValidationErrors::new();

    let mut sections = shape.sections_ref();
    sections.sort_by_key(|(role, _)| role.order());

    // Stage 1: built-in field constraints.
    for (role, section) in &sections {
        check_section_constraints(*role, *section, &mut aggregate)?;
    }

    // Stage 2: section self-validation, context-aware hook preferred.
    for (role, section) in &sections {
        let result = section.validate_with(cx).or_else(|| section.validate());
        merge_check(result, role.name(), &mut aggregate)?;
    }

    // Stage 3: request self-validation.
    let result = shape.validate_with(cx).or_else(|| shape.validate());
    merge_check(result, REQUEST_KEY, &mut aggregate)?;

    // Stage 4: external rules engine.
    if let Some(rules) = rules {
        for outcome in rules.apply(cx, shape.as_any()) {
            match outcome {
                RuleOutcome::Violation { rule, message } => {
                    debug!("Rule '{}' rejected the request", rule);
                    aggregate.push(REQUEST_KEY, message);
                }
                RuleOutcome::Invalid(messages) => aggregate.extend(REQUEST_KEY, messages),
                RuleOutcome::Failed(error) => {
                    warn!("Rules engine failed: {error}");
                    return Err(Rejection::Server(Error::Check {
                        stage: "rules".to_string(),
                        error,
                    }));
                }
            }
        }
    }

    if aggregate.is_empty() {
        Ok(())
    } else {
        Err(Rejection::Invalid(aggregate))
    }
}

/// Merge one self-validation result, or abort on a server failure
fn merge_check(
    result: Option<std::result::Result<(), CheckError>>,
    key: &str,
    aggregate: &mut ValidationErrors,
) -> std::result::Result<(), Rejection> {
    match result {
        None | Some(Ok(())) => Ok(()),
        Some(Err(CheckError::Invalid(messages))) => {
            aggregate.extend(key, messages);
            Ok(())
        }
        Some(Err(CheckError::Failed(error))) => {
            warn!("Self-validation of '{key}' failed: {error}");
            Err(Rejection::Server(Error::Check {
                stage: key.to_string(),
                error,
            }))
        }
    }
}

/// Stage-1 constraint checks for one section
fn check_section_constraints(
    role: SectionRole,
    section: &dyn Section,
    aggregate: &mut ValidationErrors,
) -> std::result::Result<(), Rejection> {
    let layout = section.layout();
    match layout.kind() {
        // The byte sequence is checked as a single unit; failures land
        // under the bare section key.
        LayoutKind::RawBytes => {
            if layout.raw_constraints().is_empty() {
                return Ok(());
            }
            let constraints = parse_guarded(role.name(), layout.raw_constraints())?;
            let violated = check_guarded(|| {
                constraints.check(FieldView::Bytes(section.raw_bytes().unwrap_or(&[])))
            })?;
            for code in violated {
                aggregate.push(role.name(), code);
            }
            Ok(())
        }
        LayoutKind::Record => {
            // Union shapes are never treated as records for
            // property-extraction purposes.
            if is_union_shape(layout) {
                return Ok(());
            }
            for meta in layout.fields() {
                if meta.constraint_tag().is_empty() {
                    continue;
                }
                let key = format!("{}.{}", role.name(), meta.wire_name());
                let constraints = parse_guarded(&key, meta.constraint_tag())?;
                let violated = check_guarded(|| {
                    let view = section.view(meta.name()).unwrap_or(FieldView::Unset);
                    constraints.check(view)
                })?;
                for code in violated {
                    aggregate.push(key.clone(), code);
                }
            }
            Ok(())
        }
    }
}

fn parse_guarded(key: &str, tag: &str) -> std::result::Result<Constraints, Rejection> {
    Constraints::parse(tag).map_err(|reason| {
        Rejection::Server(Error::Constraint {
            field: key.to_string(),
            reason,
        })
    })
}

/// Evaluate constraints with panic recovery
///
/// A panic anywhere inside constraint evaluation (including the field
/// view) converts to a server error rather than crashing the caller.
fn check_guarded<F>(evaluate: F) -> std::result::Result<Vec<&'static str>, Rejection>
where
    F: FnOnce() -> Vec<&'static str>,
{
    catch_unwind(AssertUnwindSafe(evaluate)).map_err(|payload| {
        Rejection::Server(Error::ValidationPanic {
            detail: panic_detail(payload),
        })
    })
}

fn panic_detail(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Declared format of a string field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Email,
    Rfc3339,
}

/// Parsed form of a field's constraint tag
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Constraints {
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
    len: Option<usize>,
    format: Option<Format>,
}

impl Constraints {
    /// Parse a constraint tag like `"required,min=1,max=100"`
    ///
    /// Malformed syntax is rejected with a reason; the caller classifies
    /// that as a server error.
    pub(crate) fn parse(tag: &str) -> std::result::Result<Self, String> {
        let mut constraints = Self::default();
        if tag.is_empty() {
            return Ok(constraints);
        }

        for item in tag.split(',') {
            if item == "required" {
                constraints.required = true;
                continue;
            }
            match item.split_once('=') {
                Some(("min", value)) => {
                    constraints.min =
                        Some(value.parse().map_err(|_| format!("invalid numeric bound '{value}'"))?);
                }
                Some(("max", value)) => {
                    constraints.max =
                        Some(value.parse().map_err(|_| format!("invalid numeric bound '{value}'"))?);
                }
                Some(("len", value)) => {
                    constraints.len =
                        Some(value.parse().map_err(|_| format!("invalid length '{value}'"))?);
                }
                Some(("format", "email")) => constraints.format = Some(Format::Email),
                Some(("format", "rfc3339")) => constraints.format = Some(Format::Rfc3339),
                Some(("format", other)) => return Err(format!("unknown format '{other}'")),
                _ => return Err(format!("unknown constraint '{item}'")),
            }
        }
        Ok(constraints)
    }

    /// Evaluate against a field view, returning every violated code
    ///
    /// Numeric kinds compare values; string, list, and byte kinds compare
    /// lengths. An unset optional field only ever violates `required`.
    pub(crate) fn check(&self, view: FieldView<'_>) -> Vec<&'static str> {
        let mut violated = Vec::new();

        if self.required && is_zero(view) {
            violated.push(codes::REQUIRED);
        }
        if view == FieldView::Unset {
            return violated;
        }

        if let Some(magnitude) = magnitude(view) {
            if let Some(min) = self.min {
                if magnitude < min {
                    violated.push(codes::MIN);
                }
            }
            if let Some(max) = self.max {
                if magnitude > max {
                    violated.push(codes::MAX);
                }
            }
        }
        if let Some(expected) = self.len {
            if let Some(actual) = length(view) {
                if actual != expected {
                    violated.push(codes::LEN);
                }
            }
        }
        if let Some(format) = self.format {
            if let FieldView::Str(value) = view {
                if !value.is_empty() && !matches_format(format, value) {
                    violated.push(codes::FORMAT);
                }
            }
        }
        violated
    }
}

/// Whether a view holds its kind's zero value
fn is_zero(view: FieldView<'_>) -> bool {
    match view {
        FieldView::Unset => true,
        FieldView::Str(value) => value.is_empty(),
        FieldView::Int(value) => value == 0,
        FieldView::Uint(value) => value == 0,
        FieldView::Float(value) => value == 0.0,
        FieldView::Bool(value) => !value,
        FieldView::StrList(values) => values.is_empty(),
        FieldView::Bytes(bytes) => bytes.is_empty(),
        FieldView::Timestamp(_) => false,
    }
}

/// The quantity min/max compare: the value for numerics, the length for
/// strings, lists, and bytes
#[allow(clippy::cast_precision_loss)]
fn magnitude(view: FieldView<'_>) -> Option<f64> {
    match view {
        FieldView::Int(value) => Some(value as f64),
        FieldView::Uint(value) => Some(value as f64),
        FieldView::Float(value) => Some(value),
        FieldView::Str(value) => Some(value.len() as f64),
        FieldView::StrList(values) => Some(values.len() as f64),
        FieldView::Bytes(bytes) => Some(bytes.len() as f64),
        FieldView::Bool(_) | FieldView::Timestamp(_) | FieldView::Unset => None,
    }
}

fn length(view: FieldView<'_>) -> Option<usize> {
    match view {
        FieldView::Str(value) => Some(value.len()),
        FieldView::StrList(values) => Some(values.len()),
        FieldView::Bytes(bytes) => Some(bytes.len()),
        _ => None,
    }
}

fn matches_format(format: Format, value: &str) -> bool {
    match format {
        Format::Email => {
            matches!(value.split_once('@'), Some((local, domain)) if !local.is_empty() && domain.contains('.'))
        }
        Format::Rfc3339 => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
    }
}
