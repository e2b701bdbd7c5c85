//! The catalogue of constraints emitted while walking the syntax tree.
//!
//! Every constraint is solved against a particular context. Solving either
//! succeeds (possibly producing diagnostics and further constraints), or reports
//! that it is blocked on information not known yet; the solver decides whether
//! a blocked constraint is retried or exhausted. See [`crate::solver`].

mod bind;
mod call;
mod conformance;
mod equality;
mod hoist;
mod infix;
mod member;
mod subscript;
mod unwrap;

pub use bind::Bind;
pub use call::Call;
pub use conformance::Conformance;
pub use equality::Equality;
pub use hoist::Hoist;
pub use infix::Infix;
pub use member::Member;
pub use subscript::Subscript;
pub use unwrap::Unwrap;

use crate::{context, types};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
  Equality,
  Call,
  Member,
  Subscript,
  Infix,
  Bind,
  Conformance,
  Unwrap,
  Hoist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
  Solved,
  /// Not enough is known yet; solving again later may succeed.
  Blocked,
}

#[derive(Debug, Clone)]
pub enum Constraint {
  Equality(Equality),
  Call(Call),
  Member(Member),
  Subscript(Subscript),
  Infix(Infix),
  Bind(Bind),
  Conformance(Conformance),
  Unwrap(Unwrap),
  Hoist(Hoist),
}

macro_rules! dispatch {
  ($constraint:expr, $inner:ident => $body:expr) => {
    match $constraint {
      Constraint::Equality($inner) => $body,
      Constraint::Call($inner) => $body,
      Constraint::Member($inner) => $body,
      Constraint::Subscript($inner) => $body,
      Constraint::Infix($inner) => $body,
      Constraint::Bind($inner) => $body,
      Constraint::Conformance($inner) => $body,
      Constraint::Unwrap($inner) => $body,
      Constraint::Hoist($inner) => $body,
    }
  };
}

impl Constraint {
  pub fn kind(&self) -> ConstraintKind {
    match self {
      Constraint::Equality(..) => ConstraintKind::Equality,
      Constraint::Call(..) => ConstraintKind::Call,
      Constraint::Member(..) => ConstraintKind::Member,
      Constraint::Subscript(..) => ConstraintKind::Subscript,
      Constraint::Infix(..) => ConstraintKind::Infix,
      Constraint::Bind(..) => ConstraintKind::Bind,
      Constraint::Conformance(..) => ConstraintKind::Conformance,
      Constraint::Unwrap(..) => ConstraintKind::Unwrap,
      Constraint::Hoist(..) => ConstraintKind::Hoist,
    }
  }

  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> Outcome {
    dispatch!(self, constraint => constraint.solve(context, scope))
  }

  /// Run the last-resort behavior of a constraint that stayed blocked for
  /// too long. This always settles the constraint.
  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    dispatch!(self, constraint => constraint.exhaust(context, scope))
  }

  /// A human-readable rendition, with the context's current substitutions
  /// applied, for traces.
  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    dispatch!(self, constraint => constraint.describe(context, scope))
  }
}

/// Render a result through the substitutions visible from `scope`.
pub(crate) fn show(
  context: &context::InferenceContext,
  scope: context::ContextId,
  result: &types::InferenceResult,
) -> String {
  context.apply_substitutions(scope, result).to_string()
}

/// Render a type through the substitutions visible from `scope`.
pub(crate) fn show_type(
  context: &context::InferenceContext,
  scope: context::ContextId,
  ty: &types::InferenceType,
) -> String {
  context.apply(scope, ty).to_string()
}
