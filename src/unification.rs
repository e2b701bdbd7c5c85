//! Unification merges two types through the substitution table of a context,
//! binding type variables as needed.
//!
//! A failed unification is never fatal: it is reported, and every variable that
//! was involved is bound to `any`, so that the same mistake does not cascade
//! into further diagnostics.

use crate::{ast, builtins, constraint, context, diagnostic, types};

#[derive(Debug)]
enum UnificationError {
  Mismatch(types::InferenceType, types::InferenceType),
  Arity { expected: usize, actual: usize },
  Infinite(types::TypeVariable, types::InferenceType),
}

impl From<UnificationError> for diagnostic::DiagnosticKind {
  fn from(error: UnificationError) -> Self {
    match error {
      UnificationError::Mismatch(expected, actual) => {
        diagnostic::DiagnosticKind::TypeMismatch(expected, actual)
      }
      UnificationError::Arity { expected, actual } => {
        diagnostic::DiagnosticKind::ArityMismatch { expected, actual }
      }
      UnificationError::Infinite(variable, ty) => {
        diagnostic::DiagnosticKind::InfiniteType(variable, ty)
      }
    }
  }
}

impl context::InferenceContext {
  /// Unify two types within the given context. Failures are reported at `at`,
  /// and both sides are then unified with `any`.
  pub fn unify(
    &mut self,
    scope: context::ContextId,
    a: &types::InferenceType,
    b: &types::InferenceType,
    at: ast::Span,
  ) {
    if let Err(error) = self.unify_types(scope, a, b, at) {
      self.error(error.into(), at);
      self.poison(scope, a);
      self.poison(scope, b);
    }
  }

  /// Unify two results, instantiating schemes first.
  pub fn unify_results(
    &mut self,
    scope: context::ContextId,
    a: &types::InferenceResult,
    b: &types::InferenceResult,
    at: ast::Span,
  ) {
    let a = self.instantiate(scope, a);
    let b = self.instantiate(scope, b);

    self.unify(scope, &a, &b, at);
  }

  /// Bind every unresolved variable within the type to `any`.
  pub(crate) fn poison(&mut self, scope: context::ContextId, ty: &types::InferenceType) {
    let resolved = self.apply(scope, ty);

    if let Some(variable) = resolved.as_variable() {
      self.bind(scope, variable.clone(), types::InferenceType::Any);

      return;
    }

    for variable in resolved.free_variables() {
      self.bind(scope, variable, types::InferenceType::Any);
    }
  }

  fn unify_types(
    &mut self,
    scope: context::ContextId,
    a: &types::InferenceType,
    b: &types::InferenceType,
    at: ast::Span,
  ) -> Result<(), UnificationError> {
    let a = self.apply(scope, a);
    let b = self.apply(scope, b);

    match (a.as_variable(), b.as_variable()) {
      (Some(lhs), Some(rhs)) => {
        if lhs == rhs {
          return Ok(());
        }

        // The newer variable always points to the older one.
        if lhs.is_newer_than(rhs) {
          self.bind(scope, lhs.clone(), b.clone());
        } else {
          self.bind(scope, rhs.clone(), a.clone());
        }

        return Ok(());
      }
      (Some(variable), None) => return self.bind_checked(scope, variable, &b),
      (None, Some(variable)) => return self.bind_checked(scope, variable, &a),
      (None, None) => {}
    }

    match (&a, &b) {
      (types::InferenceType::Any, _) | (_, types::InferenceType::Any) => Ok(()),
      (types::InferenceType::Base(lhs), types::InferenceType::Base(rhs)) if lhs == rhs => Ok(()),
      (
        types::InferenceType::Function(lhs_parameters, lhs_return),
        types::InferenceType::Function(rhs_parameters, rhs_return),
      ) => {
        if lhs_parameters.len() != rhs_parameters.len() {
          return Err(UnificationError::Arity {
            expected: lhs_parameters.len(),
            actual: rhs_parameters.len(),
          });
        }

        for (lhs, rhs) in lhs_parameters.iter().zip(rhs_parameters) {
          self.unify_types(scope, lhs, rhs, at)?;
        }

        self.unify_types(scope, lhs_return, rhs_return, at)
      }
      (types::InferenceType::StructInstance(lhs), types::InferenceType::StructInstance(rhs))
        if lhs.owner == rhs.owner =>
      {
        self.unify_instances(scope, lhs, rhs, at)
      }
      (types::InferenceType::EnumInstance(lhs), types::InferenceType::EnumInstance(rhs))
        if lhs.owner == rhs.owner =>
      {
        self.unify_instances(scope, lhs, rhs, at)
      }
      (types::InferenceType::EnumCase(lhs), types::InferenceType::EnumCase(rhs))
        if lhs.instance.owner == rhs.instance.owner && lhs.name == rhs.name =>
      {
        for (lhs, rhs) in lhs.attached_types.iter().zip(&rhs.attached_types) {
          self.unify_types(scope, lhs, rhs, at)?;
        }

        self.unify_instances(scope, &lhs.instance, &rhs.instance, at)
      }
      (types::InferenceType::StructType(lhs), types::InferenceType::StructType(rhs))
        if lhs == rhs =>
      {
        Ok(())
      }
      (types::InferenceType::EnumType(lhs), types::InferenceType::EnumType(rhs)) if lhs == rhs => {
        Ok(())
      }
      (types::InferenceType::InterfaceType(lhs), types::InferenceType::InterfaceType(rhs))
        if lhs == rhs =>
      {
        Ok(())
      }
      (types::InferenceType::SelfType(lhs), types::InferenceType::SelfType(rhs)) if lhs == rhs => {
        Ok(())
      }
      // Inside a declaration, `self` is compatible with any instance of it.
      (types::InferenceType::SelfType(owner), instance)
      | (instance, types::InferenceType::SelfType(owner))
        if is_instance_of(instance, owner) =>
      {
        Ok(())
      }
      (types::InferenceType::InterfaceType(interface), conformer)
      | (conformer, types::InferenceType::InterfaceType(interface))
        if can_conform(conformer) =>
      {
        self.schedule_conformance(
          scope,
          constraint::Conformance {
            conformer: conformer.clone(),
            interface: types::InferenceType::InterfaceType(interface.clone()).into(),
            location: at,
          },
        );

        Ok(())
      }
      (types::InferenceType::EnumInstance(optional), other)
      | (other, types::InferenceType::EnumInstance(optional))
        if builtins::is_optional(optional) =>
      {
        if matches!(other, types::InferenceType::Base(types::Primitive::None)) {
          return Ok(());
        }

        // Any other value is implicitly wrapped.
        match optional.argument(0) {
          Some(wrapped) => self.unify_types(scope, wrapped, other, at),
          None => Ok(()),
        }
      }
      (types::InferenceType::Pattern(pattern), other)
      | (other, types::InferenceType::Pattern(pattern)) => {
        self.unify_types(scope, &pattern.ty, other, at)
      }
      _ => Err(UnificationError::Mismatch(a.clone(), b.clone())),
    }
  }

  fn bind_checked(
    &mut self,
    scope: context::ContextId,
    variable: &types::TypeVariable,
    ty: &types::InferenceType,
  ) -> Result<(), UnificationError> {
    if self.occurs_in(scope, variable, ty) {
      return Err(UnificationError::Infinite(variable.clone(), ty.clone()));
    }

    self.bind(scope, variable.clone(), ty.clone());

    Ok(())
  }

  /// Unify the arguments of two instances of the same owner, aligning type
  /// parameters by position. Arguments that only one side knows about are left
  /// as they are.
  fn unify_instances<T: types::Nominal>(
    &mut self,
    scope: context::ContextId,
    lhs: &types::Instance<T>,
    rhs: &types::Instance<T>,
    at: ast::Span,
  ) -> Result<(), UnificationError> {
    let parameter_count = lhs.owner.type_parameters().len();

    for position in 0..parameter_count {
      if let (Some(lhs), Some(rhs)) = (lhs.argument(position), rhs.argument(position)) {
        self.unify_types(scope, lhs, rhs, at)?;
      }
    }

    Ok(())
  }

  /// A side-effect free check of whether `actual` could stand in for `required`.
  /// Unresolved variables are compatible with anything.
  pub(crate) fn is_covariant(
    &self,
    scope: context::ContextId,
    actual: &types::InferenceType,
    required: &types::InferenceType,
  ) -> bool {
    let actual = self.apply(scope, actual);
    let required = self.apply(scope, required);

    match (&actual, &required) {
      (lhs, rhs) if lhs.as_variable().is_some() || rhs.as_variable().is_some() => true,
      (types::InferenceType::Any, _) | (_, types::InferenceType::Any) => true,
      (
        types::InferenceType::Function(actual_parameters, actual_return),
        types::InferenceType::Function(required_parameters, required_return),
      ) => {
        actual_parameters.len() == required_parameters.len()
          && actual_parameters
            .iter()
            .zip(required_parameters)
            .all(|(actual, required)| self.is_covariant(scope, actual, required))
          && self.is_covariant(scope, actual_return, required_return)
      }
      (types::InferenceType::StructInstance(lhs), types::InferenceType::StructInstance(rhs)) => {
        lhs.owner == rhs.owner
      }
      (types::InferenceType::EnumInstance(lhs), types::InferenceType::EnumInstance(rhs)) => {
        lhs.owner == rhs.owner
      }
      (types::InferenceType::SelfType(owner), instance)
      | (instance, types::InferenceType::SelfType(owner)) => {
        is_instance_of(instance, owner)
          || instance == &types::InferenceType::SelfType(owner.clone())
      }
      _ => actual == required,
    }
  }
}

fn is_instance_of(ty: &types::InferenceType, owner: &types::TypeOwner) -> bool {
  match (ty, owner) {
    (types::InferenceType::StructInstance(instance), types::TypeOwner::Struct(owner)) => {
      &instance.owner == owner
    }
    (types::InferenceType::EnumInstance(instance), types::TypeOwner::Enum(owner)) => {
      &instance.owner == owner
    }
    _ => false,
  }
}

fn can_conform(ty: &types::InferenceType) -> bool {
  matches!(
    ty,
    types::InferenceType::StructInstance(..)
      | types::InferenceType::EnumInstance(..)
      | types::InferenceType::SelfType(types::TypeOwner::Struct(..))
      | types::InferenceType::SelfType(types::TypeOwner::Enum(..))
  )
}
