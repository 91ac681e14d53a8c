//! # Wirebind Hyper Adapter
//!
//! Bridges hyper requests into the wirebind core engine.
//! Provides the concrete [`WireRequest`] wrapper whose parameter-source
//! implementation feeds the core's binder; routing stays with whatever
//! router the host application uses.
//!
//! ## Modules
//!
//! - `request` - the request wrapper and parameter source
//! - `error` - adapter error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod request;

pub use error::{AdapterError, Result};
pub use request::{method_from_hyper, WireRequest};

// Re-exported so adapter users don't need a direct core dependency for
// the common types.
pub use wirebind_core::{Context, Method, ParamSource, RequestParser};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::OnceLock;
    use wirebind_core::error::{Error, Result as CoreResult};
    use wirebind_core::{
        BoundRequest, Coerced, FieldKind, FieldMeta, FieldView, Section, SectionLayout, SectionRole,
    };

    #[derive(Default)]
    struct ListQuery {
        limit: u32,
        tags: Vec<String>,
    }

    impl Section for ListQuery {
        fn layout(&self) -> &'static SectionLayout {
            static LAYOUT: OnceLock<SectionLayout> = OnceLock::new();
            LAYOUT.get_or_init(|| {
                SectionLayout::record(vec![
                    FieldMeta::new("limit", FieldKind::U32).constraints("min=1,max=100"),
                    FieldMeta::new("tags", FieldKind::StrList),
                ])
            })
        }

        fn assign(&mut self, field: &str, value: Coerced) -> CoreResult<()> {
            match field {
                "limit" => self.limit = value.take(field)?,
                "tags" => self.tags = value.take(field)?,
                _ => {
                    return Err(Error::UnknownField {
                        field: field.to_string(),
                    })
                }
            }
            Ok(())
        }

        fn view(&self, field: &str) -> Option<FieldView<'_>> {
            match field {
                "limit" => Some(FieldView::Uint(u64::from(self.limit))),
                "tags" => Some(FieldView::StrList(&self.tags)),
                _ => None,
            }
        }
    }

    #[derive(Default)]
    struct ListRequest {
        query: ListQuery,
    }

    impl BoundRequest for ListRequest {
        fn sections(&mut self) -> Vec<(SectionRole, &mut dyn Section)> {
            vec![(SectionRole::Query, &mut self.query)]
        }

        fn sections_ref(&self) -> Vec<(SectionRole, &dyn Section)> {
            vec![(SectionRole::Query, &self.query)]
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_end_to_end_bind_and_validate() {
        let request = WireRequest::new(
            Method::Get,
            "/items?limit=25&tags=a&tags=b".to_string(),
            HashMap::new(),
            None,
        );

        let parser = RequestParser::new();
        let mut shape = ListRequest::default();
        parser.process(&Context::new(), &request, &mut shape).unwrap();

        assert_eq!(shape.query.limit, 25);
        assert_eq!(shape.query.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_end_to_end_constraint_failure() {
        let request = WireRequest::new(Method::Get, "/items?limit=0".to_string(), HashMap::new(), None);

        let parser = RequestParser::new();
        let mut shape = ListRequest::default();
        let rejection = parser.process(&Context::new(), &request, &mut shape).unwrap_err();
        let errors = rejection.as_invalid().expect("client-classified");
        assert_eq!(errors.get("query.limit"), Some(&["min".to_string()][..]));
        assert_eq!(
            errors.to_json(),
            r#"{"error":"validation failed","details":{"query.limit":["min"]}}"#
        );
    }
}
