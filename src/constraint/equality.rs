use crate::{ast, constraint, context, types};

/// Both sides must denote the same type. Schemes are instantiated first.
#[derive(Debug, Clone)]
pub struct Equality {
  pub lhs: types::InferenceResult,
  pub rhs: types::InferenceResult,
  pub location: ast::Span,
}

impl Equality {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    context.unify_results(scope, &self.lhs, &self.rhs, self.location);

    constraint::Outcome::Solved
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    self.solve(context, scope);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "equality {} == {}",
      constraint::show(context, scope, &self.lhs),
      constraint::show(context, scope, &self.rhs)
    )
  }
}
