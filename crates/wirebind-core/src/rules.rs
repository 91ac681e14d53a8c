//! # Rules Engine Interface
//!
//! The consumed interface of the external rules engine - a registry of
//! named predicate functions applied once per request. The engine itself
//! lives outside this crate; the core only defines the call contract and
//! how each returned outcome is classified (see the validator's stage 4).

use crate::context::Context;
use std::any::Any;

/// Outcome of one rule application
///
/// The discriminated shape makes the client/server split explicit at the
/// boundary: `Violation` and `Invalid` merge into the aggregate under the
/// `request` key, `Failed` aborts validation with a server error.
#[derive(Debug)]
pub enum RuleOutcome {
    /// A named rule rejected the request (client-classified)
    Violation {
        /// Name of the rejecting rule
        rule: String,
        /// Human/machine-readable failure message
        message: String,
    },
    /// Client-classified failure messages without a rule attribution
    Invalid(Vec<String>),
    /// The rule engine failed on its own behalf (server-classified)
    Failed(anyhow::Error),
}

/// External rules engine applied once per bound request
///
/// The request is handed over as `&dyn Any` so the engine can downcast to
/// the concrete shapes it knows about.
pub trait Rules: Send + Sync {
    /// Apply every registered rule to the bound request
    fn apply(&self, cx: &Context, request: &dyn Any) -> Vec<RuleOutcome>;
}

/// Adapter turning a plain function into a [`Rules`] engine
///
/// A newtype rather than a blanket impl, so engines remain free to
/// implement [`Rules`] directly on their own types.
pub struct RuleFn<F>(pub F);

impl<F> Rules for RuleFn<F>
where
    F: Fn(&Context, &dyn Any) -> Vec<RuleOutcome> + Send + Sync,
{
    fn apply(&self, cx: &Context, request: &dyn Any) -> Vec<RuleOutcome> {
        (self.0)(cx, request)
    }
}
