use crate::{ast, constraint, context, types};

/// Copies what a child context resolved for `variables` into the context this
/// constraint is solved against. Bindings the child made for variables it did
/// not introduce itself always escape as well.
///
/// The copy waits until nothing else is queued for the child's subtree, so that
/// it carries everything the child is ever going to learn.
#[derive(Debug, Clone)]
pub struct Hoist {
  pub child: context::ContextId,
  pub variables: Vec<types::TypeVariable>,
  pub location: ast::Span,
}

impl Hoist {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    if context.subtree_outstanding(self.child) > 0 {
      return constraint::Outcome::Blocked;
    }

    self.copy(context, scope);

    constraint::Outcome::Solved
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    self.copy(context, scope);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    let variables = self
      .variables
      .iter()
      .map(|variable| {
        let ty = types::InferenceType::Variable(variable.clone());

        format!("{} = {}", variable, constraint::show_type(context, self.child, &ty))
      })
      .collect::<Vec<_>>();

    format!(
      "hoist {:?} -> {:?} [{}]",
      self.child,
      scope,
      variables.join(", ")
    )
  }

  fn copy(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    let mut variables = self.variables.clone();

    let escaping = context
      .scope(self.child)
      .substitutions
      .keys()
      .filter(|variable| !context.owns(self.child, variable) && !variables.contains(variable))
      .cloned()
      .collect::<Vec<_>>();

    variables.extend(escaping);

    for variable in variables {
      let ty = types::InferenceType::Variable(variable.clone());
      let value = context.apply(self.child, &ty);

      if value == ty {
        continue;
      }

      let existing = context.apply(scope, &ty);

      if existing == ty {
        context.bind(scope, variable, value);
      } else {
        context.unify(scope, &existing, &value, self.location);
      }
    }

    context.release_pending(&self.variables);

    tracing::debug!(
      child = ?self.child,
      parent = ?scope,
      "hoisted {} variable(s)",
      self.variables.len()
    );
  }
}
