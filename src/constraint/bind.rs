use crate::{ast, constraint, context, diagnostic, types};

/// A pattern from a `match` arm is matched against the value being matched,
/// binding the pattern's variables.
#[derive(Debug, Clone)]
pub struct Bind {
  pub target: types::InferenceType,
  pub pattern: types::Pattern,
  pub location: ast::Span,
}

impl Bind {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    let target = context.apply(scope, &self.target);

    if target.as_variable().is_some() {
      return constraint::Outcome::Blocked;
    }

    let callee = match &self.pattern.kind {
      types::PatternKind::Call { callee, .. } => Some(callee),
      types::PatternKind::Value | types::PatternKind::Variable(..) => None,
    };

    if let Some(callee) = callee {
      // Shorthand cases look themselves up on the pattern's own type.
      context.unify(scope, &self.pattern.ty, &target, self.location);

      if context.apply(scope, callee).as_variable().is_some() {
        return constraint::Outcome::Blocked;
      }
    }

    let target = context.apply(scope, &self.target);

    self.bind(context, scope, &self.pattern, &target);

    constraint::Outcome::Solved
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    let target = context.apply(scope, &self.target);

    context.error(
      diagnostic::DiagnosticKind::UnresolvedPattern(target),
      self.location,
    );

    poison_pattern(context, scope, &self.pattern);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "bind {} ~ {}",
      constraint::show_type(
        context,
        scope,
        &types::InferenceType::Pattern(Box::new(self.pattern.clone()))
      ),
      constraint::show_type(context, scope, &self.target)
    )
  }

  fn bind(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    pattern: &types::Pattern,
    target: &types::InferenceType,
  ) {
    match &pattern.kind {
      types::PatternKind::Value | types::PatternKind::Variable(..) => {
        context.unify(scope, &pattern.ty, target, self.location);
      }
      types::PatternKind::Call { callee, arguments } => {
        let case = match context.apply(scope, callee) {
          types::InferenceType::EnumCase(case) => case,
          other => {
            context.error(
              diagnostic::DiagnosticKind::UnresolvedPattern(other),
              self.location,
            );

            poison_pattern(context, scope, pattern);

            return;
          }
        };

        if case.attached_types.len() != arguments.len() {
          context.error(
            diagnostic::DiagnosticKind::PatternArityMismatch {
              case: case.name.clone(),
              expected: case.attached_types.len(),
              actual: arguments.len(),
            },
            self.location,
          );

          poison_pattern(context, scope, pattern);

          return;
        }

        for (argument, attached_type) in arguments.iter().zip(&case.attached_types) {
          if let types::PatternKind::Call { .. } = argument.kind {
            // The nested case is usually still being looked up.
            context.add_constraint(
              scope,
              constraint::Constraint::Bind(Bind {
                target: attached_type.clone(),
                pattern: argument.clone(),
                location: self.location,
              }),
            );

            continue;
          }

          self.bind(context, scope, argument, attached_type);
        }

        context.unify(
          scope,
          &types::InferenceType::EnumInstance(case.instance),
          target,
          self.location,
        );
      }
    }
  }
}

fn poison_pattern(
  context: &mut context::InferenceContext,
  scope: context::ContextId,
  pattern: &types::Pattern,
) {
  context.poison(scope, &pattern.ty);

  for argument in pattern.values() {
    poison_pattern(context, scope, argument);
  }
}
