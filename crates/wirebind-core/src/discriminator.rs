//! # Discriminator Resolver
//!
//! Union-shape detection and discriminator-literal checks.
//!
//! A *union shape* encodes "exactly one of N alternatives" as a record
//! whose every field is an exported optional wrapper around a single
//! alternative member. Such a layout is never treated as an ordinary
//! record for property extraction; which alternative is populated is the
//! concern of deserialization, outside this engine.
//!
//! Discriminator literals are not bound - they are only checked, and only
//! when a caller (schema or response assembly, typically) asks for it via
//! [`check_discriminators`]. The multi-layer validator does not invoke
//! these checks on its own.

use crate::shape::{FieldKind, FieldView, LayoutKind, Section, SectionLayout};
use crate::validation::{codes, ValidationErrors};

/// Structural union detection
///
/// True iff the layout is a record with at least two fields and every
/// field is exported, optional, and wraps exactly one alternative member.
#[must_use]
pub fn is_union_shape(layout: &SectionLayout) -> bool {
    layout.kind() == LayoutKind::Record
        && layout.fields().len() >= 2
        && layout
            .fields()
            .iter()
            .all(|meta| meta.is_exported() && meta.is_optional() && matches!(meta.kind(), FieldKind::Nested(_)))
}

/// First discriminator literal declared by a layout's fields, if any
#[must_use]
pub fn discriminator_literal(layout: &SectionLayout) -> Option<&str> {
    layout.fields().iter().find_map(|meta| meta.discriminator())
}

/// Check every discriminator-tagged field of a non-union section
///
/// For each field carrying a discriminator literal and holding a
/// string-kind value: an empty value yields `required`, a non-matching
/// value yields `discriminator`, a matching value yields nothing.
/// Discriminator-tagged fields of any other kind are silently skipped - a
/// deliberately preserved permissive gap (see DESIGN.md). Union layouts
/// return an empty aggregate.
#[must_use]
pub fn check_discriminators(section: &dyn Section) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let layout = section.layout();
    if is_union_shape(layout) {
        return errors;
    }

    for meta in layout.fields() {
        let Some(literal) = meta.discriminator() else {
            continue;
        };
        if let Some(FieldView::Str(value)) = section.view(meta.name()) {
            if value.is_empty() {
                errors.push(meta.wire_name(), codes::REQUIRED);
            } else if value != literal {
                errors.push(meta.wire_name(), codes::DISCRIMINATOR);
            }
        }
    }
    errors
}
