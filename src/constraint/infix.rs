use crate::{ast, constraint, context, diagnostic, types};

/// A binary operator applied to two operands produces `result`.
#[derive(Debug, Clone)]
pub struct Infix {
  pub lhs: types::InferenceResult,
  pub rhs: types::InferenceResult,
  pub operator: ast::BinaryOperator,
  pub result: types::InferenceType,
  pub location: ast::Span,
}

impl Infix {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    let lhs = context.instantiate(scope, &self.lhs);
    let rhs = context.instantiate(scope, &self.rhs);

    if self.operator.is_equality() {
      context.unify(scope, &lhs, &rhs, self.location);
      context.unify(scope, &self.result, &types::InferenceType::bool(), self.location);

      return constraint::Outcome::Solved;
    } else if self.operator.is_logical() {
      context.unify(scope, &lhs, &types::InferenceType::bool(), self.location);
      context.unify(scope, &rhs, &types::InferenceType::bool(), self.location);
      context.unify(scope, &self.result, &types::InferenceType::bool(), self.location);

      return constraint::Outcome::Solved;
    }

    if lhs.as_variable().is_some() || rhs.as_variable().is_some() {
      return constraint::Outcome::Blocked;
    }

    use types::{InferenceType::Any, InferenceType::Base, Primitive};

    let result_type = match (&lhs, &rhs) {
      (Any, _) | (_, Any) => Some(Any),
      (Base(Primitive::Int), Base(Primitive::Int)) if self.operator.is_arithmetic() => {
        Some(types::InferenceType::int())
      }
      (Base(Primitive::Int), Base(Primitive::Int))
      | (Base(Primitive::String), Base(Primitive::String))
        if self.operator.is_ordering() =>
      {
        Some(types::InferenceType::bool())
      }
      (Base(Primitive::Pointer), Base(Primitive::Int))
        if matches!(
          self.operator,
          ast::BinaryOperator::Plus | ast::BinaryOperator::Minus
        ) =>
      {
        Some(Base(Primitive::Pointer))
      }
      (Base(Primitive::String), Base(Primitive::String))
        if self.operator == ast::BinaryOperator::Plus =>
      {
        Some(types::InferenceType::string())
      }
      _ => None,
    };

    match result_type {
      Some(result_type) => context.unify(scope, &self.result, &result_type, self.location),
      None => {
        context.error(
          diagnostic::DiagnosticKind::UnsupportedOperands {
            operator: self.operator,
            lhs,
            rhs,
          },
          self.location,
        );

        context.poison(scope, &self.result);
      }
    }

    constraint::Outcome::Solved
  }

  /// As a last resort, both operands are assumed to share the result's type
  /// (or, for comparisons, each other's).
  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    let lhs = context.instantiate(scope, &self.lhs);
    let rhs = context.instantiate(scope, &self.rhs);

    if self.operator.is_ordering() {
      context.unify(scope, &lhs, &rhs, self.location);
      context.unify(scope, &self.result, &types::InferenceType::bool(), self.location);
    } else {
      context.unify(scope, &lhs, &self.result, self.location);
      context.unify(scope, &rhs, &self.result, self.location);
    }
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "infix {} {} {} -> {}",
      constraint::show(context, scope, &self.lhs),
      self.operator,
      constraint::show(context, scope, &self.rhs),
      constraint::show_type(context, scope, &self.result)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config;
  use pretty_assertions::assert_eq;

  fn solve(
    lhs: types::InferenceType,
    operator: ast::BinaryOperator,
    rhs: types::InferenceType,
  ) -> (context::InferenceContext, types::InferenceType) {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));

    let infix = Infix {
      lhs: lhs.into(),
      rhs: rhs.into(),
      operator,
      result: result.clone(),
      location: ast::Span::default(),
    };

    assert_eq!(constraint::Outcome::Solved, infix.solve(&mut context, root));

    let result = context.apply(root, &result);

    (context, result)
  }

  #[test]
  fn builtin_operator_rules() {
    use types::{InferenceType, Primitive};

    let int = InferenceType::int;
    let pointer = || InferenceType::Base(Primitive::Pointer);

    assert_eq!(int(), solve(int(), ast::BinaryOperator::Star, int()).1);
    assert_eq!(pointer(), solve(pointer(), ast::BinaryOperator::Plus, int()).1);

    assert_eq!(
      InferenceType::string(),
      solve(InferenceType::string(), ast::BinaryOperator::Plus, InferenceType::string()).1
    );

    assert_eq!(InferenceType::bool(), solve(int(), ast::BinaryOperator::Less, int()).1);
  }

  #[test]
  fn unsupported_operands_default_to_any() {
    let (context, result) = solve(
      types::InferenceType::string(),
      ast::BinaryOperator::Minus,
      types::InferenceType::int(),
    );

    assert_eq!(types::InferenceType::Any, result);

    assert!(matches!(
      context.diagnostics()[0].kind,
      diagnostic::DiagnosticKind::UnsupportedOperands { .. }
    ));
  }

  #[test]
  fn exhaustion_unifies_operands_with_result() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let lhs = types::InferenceType::Variable(context.fresh_type_variable(root, "lhs"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));

    let infix = Infix {
      lhs: lhs.clone().into(),
      rhs: types::InferenceType::int().into(),
      operator: ast::BinaryOperator::Plus,
      result: result.clone(),
      location: ast::Span::default(),
    };

    assert_eq!(constraint::Outcome::Blocked, infix.solve(&mut context, root));

    infix.exhaust(&mut context, root);

    assert_eq!(types::InferenceType::int(), context.apply(root, &lhs));
    assert_eq!(types::InferenceType::int(), context.apply(root, &result));
  }
}
