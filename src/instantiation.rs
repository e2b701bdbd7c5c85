//! Responsible for generalizing the types of callables into schemes, and for
//! instantiating schemes and generic declarations back into plain types.
//!
//! Instantiation is what makes let-polymorphism work: every use of a scheme
//! receives its own fresh variables, so that constraints gathered at one use
//! site never leak into another.

use crate::{context, types};

impl context::InferenceContext {
  /// Produce a plain type from a result. Quantified variables which are still
  /// free are replaced with fresh variables; plain types pass through with
  /// their substitutions applied.
  pub fn instantiate(
    &mut self,
    scope: context::ContextId,
    result: &types::InferenceResult,
  ) -> types::InferenceType {
    let result = self.resolve_placeholder(scope, result);

    match self.apply_substitutions(scope, &result) {
      types::InferenceResult::Type(ty) => ty,
      types::InferenceResult::Scheme(scheme) => {
        let universe = scheme
          .variables
          .iter()
          .map(|variable| {
            let fresh = self.fresh_type_variable(scope, &variable.label);

            (variable.clone(), types::InferenceType::Variable(fresh))
          })
          .collect::<types::Substitutions>();

        let instance = scheme.ty.substituting(&universe);

        tracing::trace!(scheme = %scheme, instance = %instance, "instantiated");

        instance
      }
    }
  }

  /// Quantify every free variable of `ty` that was minted within `body`, the
  /// context of the declaration being generalized. Other variables belong to
  /// an enclosing scope and must stay monomorphic.
  pub fn generalize(
    &self,
    scope: context::ContextId,
    ty: &types::InferenceType,
    body: context::ContextId,
  ) -> types::InferenceResult {
    let ty = self.apply(scope, ty);

    let variables = ty
      .free_variables()
      .into_iter()
      .filter(|variable| self.owns_within(body, variable))
      .collect::<Vec<_>>();

    if variables.is_empty() {
      types::InferenceResult::Type(ty)
    } else {
      types::InferenceResult::Scheme(types::Scheme {
        variables,
        ty,
        body: Some(body),
      })
    }
  }

  /// Create a use of a generic declaration, with one fresh variable per type
  /// parameter.
  pub(crate) fn instantiate_owner<T: types::Nominal>(
    &mut self,
    scope: context::ContextId,
    owner: &std::rc::Rc<T>,
  ) -> types::Instance<T> {
    let substitutions = owner
      .type_parameters()
      .iter()
      .map(|parameter| {
        let fresh = self.fresh_type_variable(scope, &parameter.label);

        (parameter.clone(), types::InferenceType::Variable(fresh))
      })
      .collect();

    types::Instance {
      owner: std::rc::Rc::clone(owner),
      substitutions,
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::{ast, config, context, types};
  use pretty_assertions::assert_eq;

  fn new_context() -> context::InferenceContext {
    context::InferenceContext::new("test", config::InferenceConfig::default())
  }

  #[test]
  fn instantiations_are_independent() {
    let mut context = new_context();
    let root = context.root();
    let body = context.child_context(root);
    let a = types::InferenceType::Variable(context.fresh_type_variable(body, "a"));
    let identity = types::InferenceType::function(vec![a.clone()], a);
    let identity = context.generalize(root, &identity, body);

    assert_eq!(1, identity.quantified_variables().len());

    let first = context.instantiate(root, &identity);
    let second = context.instantiate(root, &identity);

    assert!(first != second);

    let first_parameter = match &first {
      types::InferenceType::Function(parameters, _) => parameters[0].clone(),
      _ => unreachable!(),
    };

    context.unify(root, &first_parameter, &types::InferenceType::int(), ast::Span::default());

    assert_eq!("(int) -> int", context.apply(root, &first).to_string());
    assert!(context.apply(root, &second).free_variables().len() == 1);
  }

  #[test]
  fn generalization_skips_enclosing_variables() {
    let mut context = new_context();
    let root = context.root();
    let outer = types::InferenceType::Variable(context.fresh_type_variable(root, "outer"));
    let body = context.child_context(root);
    let nested = context.child_context(body);
    let inner = types::InferenceType::Variable(context.fresh_type_variable(nested, "inner"));
    let ty = types::InferenceType::function(vec![outer.clone(), inner], outer);

    let result = context.generalize(root, &ty, body);

    assert_eq!(1, result.quantified_variables().len());
    assert_eq!("inner", &*result.quantified_variables()[0].label);
  }

  #[test]
  fn plain_types_instantiate_to_themselves() {
    let mut context = new_context();
    let root = context.root();
    let result = types::InferenceResult::Type(types::InferenceType::int());

    assert_eq!(types::InferenceType::int(), context.instantiate(root, &result));
  }
}
