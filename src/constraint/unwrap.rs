use crate::{ast, builtins, constraint, context, diagnostic, types};

/// Unwrapping an optional value produces its `Wrapped` type.
#[derive(Debug, Clone)]
pub struct Unwrap {
  pub optional: types::InferenceResult,
  pub result: types::InferenceType,
  pub location: ast::Span,
}

impl Unwrap {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    match context.instantiate(scope, &self.optional) {
      types::InferenceType::EnumInstance(instance) if builtins::is_optional(&instance) => {
        if let Some(wrapped) = instance.argument(0) {
          context.unify(scope, wrapped, &self.result, self.location);
        }

        constraint::Outcome::Solved
      }
      types::InferenceType::Any => {
        context.poison(scope, &self.result);

        constraint::Outcome::Solved
      }
      _ => constraint::Outcome::Blocked,
    }
  }

  /// An optional that is still unknown is assumed to wrap the result; anything
  /// else cannot be unwrapped.
  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    if self.solve(context, scope) == constraint::Outcome::Solved {
      return;
    }

    let optional = context.instantiate(scope, &self.optional);

    if optional.as_variable().is_some() && context.builtins.is_some() {
      let wrapped = context.optional_of(self.result.clone());

      context.unify(scope, &optional, &wrapped, self.location);

      return;
    }

    context.error(
      diagnostic::DiagnosticKind::CannotUnwrap(optional),
      self.location,
    );

    context.poison(scope, &self.result);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "unwrap {} -> {}",
      constraint::show(context, scope, &self.optional),
      constraint::show_type(context, scope, &self.result)
    )
  }
}
