use std::rc::Rc;

use crate::{ast, constraint, context, diagnostic, types};

/// Applying a callee to arguments produces `result`. The callee may be a
/// function, a struct type (construction) or an enum case with attached
/// values.
#[derive(Debug, Clone)]
pub struct Call {
  pub callee: types::InferenceResult,
  /// Argument labels and results, in source order.
  pub arguments: Vec<(Option<String>, types::InferenceResult)>,
  pub result: types::InferenceType,
  pub location: ast::Span,
}

impl Call {
  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    self.attempt(context, scope, false)
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    if self.attempt(context, scope, true) == constraint::Outcome::Solved {
      return;
    }

    let callee = context.resolve_placeholder(scope, &self.callee);
    let callee_type = context.instantiate(scope, &callee);

    if let types::InferenceType::Placeholder(..) = callee_type {
      context.error(
        diagnostic::DiagnosticKind::NotCallable(callee_type),
        self.location,
      );

      context.poison(scope, &self.result);

      return;
    }

    // Nothing else will ever tell what the callee is; assume it is a function
    // accepting these arguments.
    let parameters = self
      .arguments
      .iter()
      .map(|(_, argument)| context.instantiate(scope, argument))
      .collect();

    let function = types::InferenceType::function(parameters, self.result.clone());

    context.unify(scope, &callee_type, &function, self.location);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    let arguments = self
      .arguments
      .iter()
      .map(|(label, argument)| match label {
        Some(label) => format!("{}: {}", label, constraint::show(context, scope, argument)),
        None => constraint::show(context, scope, argument),
      })
      .collect::<Vec<_>>();

    format!(
      "call {}({}) -> {}",
      constraint::show(context, scope, &self.callee),
      arguments.join(", "),
      constraint::show_type(context, scope, &self.result)
    )
  }

  /// When `force` is set, callees whose types are still pending are
  /// instantiated anyway.
  fn attempt(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    force: bool,
  ) -> constraint::Outcome {
    let callee = context.resolve_placeholder(scope, &self.callee);

    if !force && context.is_pending(scope, &callee) {
      return constraint::Outcome::Blocked;
    }

    match context.instantiate(scope, &callee) {
      types::InferenceType::Variable(..) | types::InferenceType::Placeholder(..) => {
        return constraint::Outcome::Blocked;
      }
      types::InferenceType::Function(parameters, return_type) => {
        if self.unify_arguments(context, scope, &parameters) {
          context.unify(scope, &return_type, &self.result, self.location);
        } else {
          context.poison(scope, &self.result);
        }
      }
      types::InferenceType::StructType(owner) => {
        return self.construct(context, scope, &owner, force);
      }
      // Construction from within the struct's own declaration.
      types::InferenceType::SelfType(types::TypeOwner::Struct(owner)) => {
        return self.construct(context, scope, &owner, force);
      }
      types::InferenceType::EnumCase(case) => {
        if self.unify_arguments(context, scope, &case.attached_types) {
          context.unify(
            scope,
            &types::InferenceType::EnumInstance(case.instance),
            &self.result,
            self.location,
          );
        } else {
          context.poison(scope, &self.result);
        }
      }
      types::InferenceType::Any => {
        context.unify(scope, &self.result, &types::InferenceType::Any, self.location);
      }
      other => {
        context.error(diagnostic::DiagnosticKind::NotCallable(other), self.location);
        context.poison(scope, &self.result);
      }
    }

    constraint::Outcome::Solved
  }

  /// Unify arguments with parameters positionally. Reports and returns `false`
  /// on an arity mismatch.
  fn unify_arguments(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    parameters: &[types::InferenceType],
  ) -> bool {
    if parameters.len() != self.arguments.len() {
      context.error(
        diagnostic::DiagnosticKind::ArityMismatch {
          expected: parameters.len(),
          actual: self.arguments.len(),
        },
        self.location,
      );

      for (_, argument) in &self.arguments {
        let argument = context.instantiate(scope, argument);

        context.poison(scope, &argument);
      }

      return false;
    }

    for (parameter, (_, argument)) in parameters.iter().zip(&self.arguments) {
      let argument = context.instantiate(scope, argument);

      context.unify(scope, parameter, &argument, self.location);
    }

    true
  }

  fn construct(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    owner: &Rc<types::StructType>,
    force: bool,
  ) -> constraint::Outcome {
    let initializers = owner
      .initializers
      .borrow()
      .values()
      .cloned()
      .collect::<Vec<_>>();

    let properties = owner
      .properties
      .borrow()
      .iter()
      .map(|(name, result)| (name.clone(), result.clone()))
      .collect::<Vec<_>>();

    let is_pending = initializers
      .iter()
      .chain(properties.iter().map(|(_, result)| result))
      .any(|result| context.is_pending(scope, result));

    if !force && is_pending {
      return constraint::Outcome::Blocked;
    }

    let instance = context.instantiate_owner(scope, owner);

    let is_valid = if initializers.is_empty() {
      self.construct_memberwise(context, scope, &instance, &properties)
    } else {
      let initializer = initializers
        .iter()
        .find(|initializer| match initializer.as_type() {
          types::InferenceType::Function(parameters, _) => parameters.len() == self.arguments.len(),
          _ => false,
        })
        .unwrap_or(&initializers[0]);

      let initializer_type = context.instantiate(scope, initializer);

      match instance.specialize(&initializer_type) {
        types::InferenceType::Function(parameters, _) => {
          self.unify_arguments(context, scope, &parameters)
        }
        _ => false,
      }
    };

    if is_valid {
      context.unify(
        scope,
        &types::InferenceType::StructInstance(instance),
        &self.result,
        self.location,
      );
    } else {
      context.poison(scope, &self.result);
    }

    constraint::Outcome::Solved
  }

  /// Construction without an explicit initializer. Labeled arguments are
  /// matched to properties by name, others by position. Properties may be
  /// omitted.
  fn construct_memberwise(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    instance: &types::Instance<types::StructType>,
    properties: &[(String, types::InferenceResult)],
  ) -> bool {
    if self.arguments.len() > properties.len() {
      context.error(
        diagnostic::DiagnosticKind::ArityMismatch {
          expected: properties.len(),
          actual: self.arguments.len(),
        },
        self.location,
      );

      return false;
    }

    let mut is_valid = true;

    for (position, (label, argument)) in self.arguments.iter().enumerate() {
      let property = match label {
        Some(label) => properties.iter().find(|(name, _)| name == label),
        None => properties.get(position),
      };

      let property = match property {
        Some((_, property)) => property,
        None => {
          context.error(
            diagnostic::DiagnosticKind::UndefinedMember {
              receiver: types::InferenceType::StructType(Rc::clone(&instance.owner)),
              member: label.clone().unwrap_or_default(),
            },
            self.location,
          );

          is_valid = false;

          continue;
        }
      };

      let property_type = context.instantiate(scope, property);
      let property_type = instance.specialize(&property_type);
      let argument = context.instantiate(scope, argument);

      context.unify(scope, &property_type, &argument, self.location);
    }

    is_valid
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config;
  use pretty_assertions::assert_eq;

  fn new_context() -> context::InferenceContext {
    context::InferenceContext::new("test", config::InferenceConfig::default())
  }

  fn call(
    callee: types::InferenceType,
    arguments: Vec<(Option<&str>, types::InferenceType)>,
    result: types::InferenceType,
  ) -> Call {
    Call {
      callee: callee.into(),
      arguments: arguments
        .into_iter()
        .map(|(label, argument)| (label.map(str::to_string), argument.into()))
        .collect(),
      result,
      location: ast::Span::default(),
    }
  }

  #[test]
  fn unresolved_callee_blocks() {
    let mut context = new_context();
    let root = context.root();
    let callee = types::InferenceType::Variable(context.fresh_type_variable(root, "f"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let call = call(callee, vec![], result);

    assert_eq!(constraint::Outcome::Blocked, call.solve(&mut context, root));
  }

  #[test]
  fn exhausted_variable_callee_becomes_function() {
    let mut context = new_context();
    let root = context.root();
    let callee = types::InferenceType::Variable(context.fresh_type_variable(root, "f"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let call = call(callee.clone(), vec![(None, types::InferenceType::int())], result);

    call.exhaust(&mut context, root);

    assert!(context.diagnostics().is_empty());

    assert!(matches!(
      context.apply(root, &callee),
      types::InferenceType::Function(..)
    ));
  }

  #[test]
  fn non_callable_callee_is_reported() {
    let mut context = new_context();
    let root = context.root();
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let call = call(types::InferenceType::int(), vec![], result.clone());

    assert_eq!(constraint::Outcome::Solved, call.solve(&mut context, root));

    assert_eq!(
      diagnostic::DiagnosticKind::NotCallable(types::InferenceType::int()),
      context.diagnostics()[0].kind
    );

    assert_eq!(types::InferenceType::Any, context.apply(root, &result));
  }

  #[test]
  fn memberwise_construction_binds_type_parameters() {
    let mut context = new_context();
    let root = context.root();
    let element = context.fresh_type_variable(root, "T");

    let owner = Rc::new(types::StructType::new("Box", "test", vec![element.clone()]));

    owner.properties.borrow_mut().insert(
      "value".to_string(),
      types::InferenceType::Variable(element).into(),
    );

    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));

    let call = call(
      types::InferenceType::StructType(owner),
      vec![(Some("value"), types::InferenceType::string())],
      result.clone(),
    );

    assert_eq!(constraint::Outcome::Solved, call.solve(&mut context, root));
    assert_eq!("Box<String>", context.apply(root, &result).to_string());
  }

  #[test]
  fn too_many_arguments_is_an_arity_mismatch() {
    let mut context = new_context();
    let root = context.root();
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let function = types::InferenceType::function(vec![], types::InferenceType::int());
    let call = call(function, vec![(None, types::InferenceType::int())], result);

    call.solve(&mut context, root);

    assert_eq!(
      diagnostic::DiagnosticKind::ArityMismatch {
        expected: 0,
        actual: 1
      },
      context.diagnostics()[0].kind
    );
  }
}
