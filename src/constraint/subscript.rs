use crate::{ast, constraint, context, diagnostic, types};

/// `receiver[arguments]` produces `result`, through the receiver's `get`
/// method.
#[derive(Debug, Clone)]
pub struct Subscript {
  pub receiver: types::InferenceResult,
  pub arguments: Vec<types::InferenceResult>,
  pub result: types::InferenceType,
  pub location: ast::Span,
}

impl Subscript {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    let receiver = context.instantiate(scope, &self.receiver);

    let getter = match &receiver {
      types::InferenceType::Variable(..) => return constraint::Outcome::Blocked,
      types::InferenceType::Any => {
        context.poison(scope, &self.result);

        return constraint::Outcome::Solved;
      }
      types::InferenceType::StructInstance(instance) => instance
        .owner
        .member("get")
        .map(|getter| (getter, instance.substitutions.clone())),
      types::InferenceType::EnumInstance(instance) => instance
        .owner
        .method("get")
        .map(|getter| (getter, instance.substitutions.clone())),
      _ => None,
    };

    let (getter, substitutions) = match getter {
      Some(getter) => getter,
      None => {
        self.missing_getter(context, scope, receiver);

        return constraint::Outcome::Solved;
      }
    };

    let getter = context.instantiate(scope, &getter).substituting(&substitutions);

    let call = constraint::Call {
      callee: getter.into(),
      arguments: self
        .arguments
        .iter()
        .map(|argument| (None, argument.clone()))
        .collect(),
      result: self.result.clone(),
      location: self.location,
    };

    call.exhaust(context, scope);

    constraint::Outcome::Solved
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    if self.solve(context, scope) == constraint::Outcome::Solved {
      return;
    }

    let receiver = context.instantiate(scope, &self.receiver);

    self.missing_getter(context, scope, receiver);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    let arguments = self
      .arguments
      .iter()
      .map(|argument| constraint::show(context, scope, argument))
      .collect::<Vec<_>>();

    format!(
      "subscript {}[{}] -> {}",
      constraint::show(context, scope, &self.receiver),
      arguments.join(", "),
      constraint::show_type(context, scope, &self.result)
    )
  }

  fn missing_getter(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    receiver: types::InferenceType,
  ) {
    context.error(
      diagnostic::DiagnosticKind::MissingSubscriptGetter(receiver),
      self.location,
    );

    context.poison(scope, &self.result);
  }
}
