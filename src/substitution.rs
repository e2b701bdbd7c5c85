//! Resolution of types through the substitution tables of a context chain.

use crate::{context, types};

impl context::InferenceContext {
  /// Resolve every type variable within a result to a fixpoint, as seen from
  /// the given context. Quantified variables of a scheme that became bound
  /// are dropped from it.
  pub fn apply_substitutions(
    &self,
    scope: context::ContextId,
    result: &types::InferenceResult,
  ) -> types::InferenceResult {
    match result {
      types::InferenceResult::Type(ty) => types::InferenceResult::Type(self.apply(scope, ty)),
      types::InferenceResult::Scheme(scheme) => {
        let ty = self.apply(scope, &scheme.ty);
        let quantified = self.quantified_after_solving(scope, scheme);

        let variables = ty
          .free_variables()
          .into_iter()
          .filter(|variable| quantified.contains(variable))
          .collect::<Vec<_>>();

        if variables.is_empty() {
          types::InferenceResult::Type(ty)
        } else {
          types::InferenceResult::Scheme(types::Scheme {
            variables,
            ty,
            body: scheme.body,
          })
        }
      }
    }
  }

  /// The variables a scheme quantifies over once what is known about its
  /// quantified variables has been applied. Solving a quantified variable
  /// hands quantification on to the variables it was solved with, as long as
  /// those were minted within the declaration's body too. Variables of
  /// enclosing contexts are not followed.
  fn quantified_after_solving(
    &self,
    scope: context::ContextId,
    scheme: &types::Scheme,
  ) -> Vec<types::TypeVariable> {
    let mut quantified = Vec::new();
    let mut visited = Vec::new();
    let mut stack = scheme.variables.clone();

    while let Some(variable) = stack.pop() {
      if visited.contains(&variable.id) {
        continue;
      }

      visited.push(variable.id);

      match self.lookup_substitution(scope, &variable) {
        Some(substitution) => stack.extend(
          substitution
            .free_variables()
            .into_iter()
            .filter(|inner| match scheme.body {
              Some(body) => scheme.variables.contains(inner) || self.owns_within(body, inner),
              None => false,
            }),
        ),
        None => quantified.push(variable),
      }
    }

    quantified
  }

  /// Resolve every type variable within a type to a fixpoint.
  pub fn apply(
    &self,
    scope: context::ContextId,
    ty: &types::InferenceType,
  ) -> types::InferenceType {
    self.apply_guarded(scope, ty, &mut Vec::new())
  }

  /// The `visiting` stack holds the variables whose substitutions are being
  /// resolved, so that a cycle stops at the variable instead of looping.
  fn apply_guarded(
    &self,
    scope: context::ContextId,
    ty: &types::InferenceType,
    visiting: &mut Vec<types::VariableId>,
  ) -> types::InferenceType {
    let apply_all = |items: &[types::InferenceType], visiting: &mut Vec<types::VariableId>| {
      items
        .iter()
        .map(|ty| self.apply_guarded(scope, ty, visiting))
        .collect::<Vec<_>>()
    };

    match ty {
      types::InferenceType::Variable(variable) | types::InferenceType::Placeholder(variable) => {
        if visiting.contains(&variable.id) {
          return ty.clone();
        }

        match self.lookup_substitution(scope, variable) {
          Some(substitution) => {
            visiting.push(variable.id);

            let resolved = self.apply_guarded(scope, substitution, visiting);

            visiting.pop();

            resolved
          }
          None => ty.clone(),
        }
      }
      types::InferenceType::Function(parameters, return_type) => types::InferenceType::function(
        apply_all(parameters, visiting),
        self.apply_guarded(scope, return_type, visiting),
      ),
      types::InferenceType::StructInstance(instance) => {
        types::InferenceType::StructInstance(types::Instance {
          owner: std::rc::Rc::clone(&instance.owner),
          substitutions: self.apply_map(scope, &instance.substitutions, visiting),
        })
      }
      types::InferenceType::EnumInstance(instance) => {
        types::InferenceType::EnumInstance(types::Instance {
          owner: std::rc::Rc::clone(&instance.owner),
          substitutions: self.apply_map(scope, &instance.substitutions, visiting),
        })
      }
      types::InferenceType::EnumCase(case) => types::InferenceType::EnumCase(types::EnumCase {
        name: case.name.clone(),
        attached_types: apply_all(&case.attached_types, visiting),
        instance: types::Instance {
          owner: std::rc::Rc::clone(&case.instance.owner),
          substitutions: self.apply_map(scope, &case.instance.substitutions, visiting),
        },
      }),
      types::InferenceType::Pattern(pattern) => types::InferenceType::Pattern(Box::new(
        self.apply_pattern(scope, pattern, visiting),
      )),
      types::InferenceType::Base(..)
      | types::InferenceType::StructType(..)
      | types::InferenceType::EnumType(..)
      | types::InferenceType::InterfaceType(..)
      | types::InferenceType::SelfType(..)
      | types::InferenceType::Any => ty.clone(),
    }
  }

  fn apply_map(
    &self,
    scope: context::ContextId,
    substitutions: &types::Substitutions,
    visiting: &mut Vec<types::VariableId>,
  ) -> types::Substitutions {
    substitutions
      .iter()
      .map(|(parameter, argument)| {
        (
          parameter.clone(),
          self.apply_guarded(scope, argument, visiting),
        )
      })
      .collect()
  }

  fn apply_pattern(
    &self,
    scope: context::ContextId,
    pattern: &types::Pattern,
    visiting: &mut Vec<types::VariableId>,
  ) -> types::Pattern {
    let kind = match &pattern.kind {
      types::PatternKind::Call { callee, arguments } => types::PatternKind::Call {
        callee: self.apply_guarded(scope, callee, visiting),
        arguments: arguments
          .iter()
          .map(|argument| self.apply_pattern(scope, argument, visiting))
          .collect(),
      },
      other => other.clone(),
    };

    types::Pattern {
      ty: self.apply_guarded(scope, &pattern.ty, visiting),
      kind,
    }
  }

  /// Whether the variable occurs within the fully resolved type. Binding the
  /// variable to such a type would construct an infinite type.
  pub(crate) fn occurs_in(
    &self,
    scope: context::ContextId,
    variable: &types::TypeVariable,
    ty: &types::InferenceType,
  ) -> bool {
    self.apply(scope, ty).mentions(variable)
  }
}

#[cfg(test)]
mod tests {
  use crate::{config, context, types};
  use pretty_assertions::assert_eq;

  fn new_context() -> context::InferenceContext {
    context::InferenceContext::new("test", config::InferenceConfig::default())
  }

  #[test]
  fn follows_chains_to_a_fixpoint() {
    let mut context = new_context();
    let root = context.root();
    let a = context.fresh_type_variable(root, "a");
    let b = context.fresh_type_variable(root, "b");
    let c = context.fresh_type_variable(root, "c");

    context.bind(root, c.clone(), types::InferenceType::Variable(b.clone()));
    context.bind(root, b, types::InferenceType::Variable(a.clone()));
    context.bind(root, a, types::InferenceType::int());

    let ty = types::InferenceType::function(
      vec![types::InferenceType::Variable(c)],
      types::InferenceType::bool(),
    );

    let applied = context.apply(context.root(), &ty);

    assert_eq!("(int) -> bool", applied.to_string());
    assert_eq!(applied, context.apply(context.root(), &applied));
  }

  #[test]
  fn child_bindings_are_invisible_to_parent() {
    let mut context = new_context();
    let root = context.root();
    let child = context.child_context(root);
    let a = context.fresh_type_variable(root, "a");
    let variable = types::InferenceType::Variable(a.clone());

    context.bind(child, a, types::InferenceType::string());

    assert_eq!(types::InferenceType::string(), context.apply(child, &variable));
    assert_eq!(variable, context.apply(root, &variable));
  }

  #[test]
  fn cycles_terminate() {
    let mut context = new_context();
    let root = context.root();
    let a = context.fresh_type_variable(root, "a");
    let b = context.fresh_type_variable(root, "b");

    // The unifier never builds this; resolution must still terminate.
    context.bind(root, a.clone(), types::InferenceType::Variable(b.clone()));
    context.bind(root, b, types::InferenceType::Variable(a.clone()));

    let applied = context.apply(root, &types::InferenceType::Variable(a.clone()));

    assert_eq!(types::InferenceType::Variable(a), applied);
  }

  #[test]
  fn bound_scheme_variables_are_dropped() {
    let mut context = new_context();
    let root = context.root();
    let a = context.fresh_type_variable(root, "a");
    let b = context.fresh_type_variable(root, "b");

    context.bind(root, a.clone(), types::InferenceType::int());

    let scheme = types::InferenceResult::Scheme(types::Scheme {
      variables: vec![a.clone(), b.clone()],
      ty: types::InferenceType::function(
        vec![types::InferenceType::Variable(a)],
        types::InferenceType::Variable(b.clone()),
      ),
      body: None,
    });

    let applied = context.apply_substitutions(root, &scheme);

    assert_eq!(vec![b], applied.quantified_variables().to_vec());
  }

  #[test]
  fn quantification_follows_solved_variables() {
    let mut context = new_context();
    let root = context.root();
    let outer = context.fresh_type_variable(root, "outer");
    let body = context.child_context(root);
    let result = context.fresh_type_variable(body, "result");
    let element = context.fresh_type_variable(body, "element");

    let scheme = types::InferenceResult::Scheme(types::Scheme {
      variables: vec![result.clone()],
      ty: types::InferenceType::function(
        vec![types::InferenceType::Variable(outer.clone())],
        types::InferenceType::Variable(result.clone()),
      ),
      body: Some(body),
    });

    context.bind(
      root,
      result,
      types::InferenceType::function(
        vec![types::InferenceType::Variable(outer.clone())],
        types::InferenceType::Variable(element.clone()),
      ),
    );

    let applied = context.apply_substitutions(root, &scheme);

    assert_eq!(vec![element], applied.quantified_variables().to_vec());
  }
}
