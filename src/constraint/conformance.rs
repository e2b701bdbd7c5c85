use crate::{ast, constraint, context, diagnostic, types};

/// A struct or enum must structurally satisfy every requirement of an
/// interface.
#[derive(Debug, Clone)]
pub struct Conformance {
  pub conformer: types::InferenceType,
  pub interface: types::InferenceResult,
  pub location: ast::Span,
}

impl Conformance {
  /// Identifies the check by conformer and interface, so that the same pair is
  /// only ever checked once per run. Non-nominal conformers have no key.
  pub(crate) fn key(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> Option<(String, String)> {
    let conformer = match context.apply(scope, &self.conformer) {
      types::InferenceType::StructInstance(instance) => {
        format!("{}.{}", instance.owner.module, instance.owner.name)
      }
      types::InferenceType::EnumInstance(instance) => {
        format!("{}.{}", instance.owner.module, instance.owner.name)
      }
      types::InferenceType::SelfType(owner) => owner.name().to_string(),
      _ => return None,
    };

    let interface = constraint::show(context, scope, &self.interface);

    Some((conformer, interface))
  }

  pub(crate) fn solve(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
  ) -> constraint::Outcome {
    let interface = match context.instantiate(scope, &self.interface) {
      types::InferenceType::InterfaceType(interface) => interface,
      types::InferenceType::Variable(..) => return constraint::Outcome::Blocked,
      other => {
        context.error(
          diagnostic::DiagnosticKind::NonInterfaceConformance(other),
          self.location,
        );

        return constraint::Outcome::Solved;
      }
    };

    let conformer = match context.apply(scope, &self.conformer) {
      types::InferenceType::SelfType(owner) => owner.as_self_instance(),
      conformer => conformer,
    };

    let requirements = interface
      .requirements
      .borrow()
      .iter()
      .map(|(name, requirement)| (name.clone(), requirement.clone()))
      .collect::<Vec<_>>();

    let mut failures = Vec::new();

    for (name, requirement) in requirements {
      let requirement = requirement.into_type();

      let member = match find_member(&conformer, &name) {
        Some(member) => member,
        None => {
          failures.push(diagnostic::Diagnostic::error(
            diagnostic::DiagnosticKind::MissingRequirement { name, requirement },
            self.location,
          ));

          continue;
        }
      };

      if !context.is_covariant(scope, &member, &requirement) {
        failures.push(diagnostic::Diagnostic::error(
          diagnostic::DiagnosticKind::IncompatibleRequirement {
            name,
            requirement,
            found: context.apply(scope, &member),
          },
          self.location,
        ));

        continue;
      }

      // Whatever the member leaves open is taken from the requirement.
      context.unify(scope, &member, &requirement, self.location);
    }

    if !failures.is_empty() {
      context.report(
        diagnostic::Diagnostic::error(
          diagnostic::DiagnosticKind::MissingRequirements {
            conformer: nominal_name(&conformer),
            interface: interface.name.clone(),
          },
          self.location,
        )
        .with_sub_diagnostics(failures),
      );
    }

    constraint::Outcome::Solved
  }

  pub(crate) fn exhaust(&self, context: &mut context::InferenceContext, scope: context::ContextId) {
    let interface = context.instantiate(scope, &self.interface);

    context.error(
      diagnostic::DiagnosticKind::NonInterfaceConformance(interface),
      self.location,
    );
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "conformance {}: {}",
      constraint::show_type(context, scope, &self.conformer),
      constraint::show(context, scope, &self.interface)
    )
  }
}

/// The member's declared type, as seen through the conformer's type arguments.
/// Schemes are not instantiated, so that propagation reaches the declaration.
fn find_member(conformer: &types::InferenceType, name: &str) -> Option<types::InferenceType> {
  match conformer {
    types::InferenceType::StructInstance(instance) => instance
      .owner
      .member(name)
      .map(|member| instance.specialize(member.as_type())),
    types::InferenceType::EnumInstance(instance) => instance
      .owner
      .method(name)
      .map(|member| instance.specialize(member.as_type())),
    _ => None,
  }
}

fn nominal_name(conformer: &types::InferenceType) -> String {
  match conformer {
    types::InferenceType::StructInstance(instance) => instance.owner.name.clone(),
    types::InferenceType::EnumInstance(instance) => instance.owner.name.clone(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config;
  use pretty_assertions::assert_eq;
  use std::rc::Rc;

  fn person_and_interface() -> (Rc<types::StructType>, Rc<types::InterfaceType>) {
    let person = Rc::new(types::StructType::new("Person", "test", Vec::new()));
    let interface = Rc::new(types::InterfaceType::new("Named", "test"));

    interface
      .requirements
      .borrow_mut()
      .insert("name".to_string(), types::InferenceType::string().into());

    interface.requirements.borrow_mut().insert(
      "greet".to_string(),
      types::InferenceType::function(vec![], types::InferenceType::string()).into(),
    );

    (person, interface)
  }

  fn conformance(
    person: &Rc<types::StructType>,
    interface: &Rc<types::InterfaceType>,
  ) -> Conformance {
    Conformance {
      conformer: types::InferenceType::StructInstance(types::Instance {
        owner: Rc::clone(person),
        substitutions: types::Substitutions::new(),
      }),
      interface: types::InferenceType::InterfaceType(Rc::clone(interface)).into(),
      location: ast::Span::default(),
    }
  }

  #[test]
  fn all_missing_requirements_are_reported_together() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let (person, interface) = person_and_interface();

    conformance(&person, &interface).solve(&mut context, root);

    assert_eq!(1, context.diagnostics().len());

    let diagnostic = &context.diagnostics()[0];

    assert_eq!(
      diagnostic::DiagnosticKind::MissingRequirements {
        conformer: "Person".to_string(),
        interface: "Named".to_string(),
      },
      diagnostic.kind
    );

    assert_eq!(2, diagnostic.sub_diagnostics.len());
  }

  #[test]
  fn satisfied_requirements_propagate_into_members() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let (person, interface) = person_and_interface();
    let name = types::InferenceType::Variable(context.fresh_type_variable(root, "name"));
    let greeting = types::InferenceType::Variable(context.fresh_type_variable(root, "greeting"));

    person
      .properties
      .borrow_mut()
      .insert("name".to_string(), name.clone().into());

    person.methods.borrow_mut().insert(
      "greet".to_string(),
      types::InferenceType::function(vec![], greeting.clone()).into(),
    );

    conformance(&person, &interface).solve(&mut context, root);

    assert!(context.diagnostics().is_empty());
    assert_eq!(types::InferenceType::string(), context.apply(root, &name));
    assert_eq!(types::InferenceType::string(), context.apply(root, &greeting));
  }

  #[test]
  fn incompatible_members_are_reported_with_both_types() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let (person, interface) = person_and_interface();

    person
      .properties
      .borrow_mut()
      .insert("name".to_string(), types::InferenceType::int().into());

    person.methods.borrow_mut().insert(
      "greet".to_string(),
      types::InferenceType::function(vec![], types::InferenceType::string()).into(),
    );

    conformance(&person, &interface).solve(&mut context, root);

    assert_eq!(1, context.diagnostics().len());

    let sub_diagnostics = &context.diagnostics()[0].sub_diagnostics;

    assert_eq!(
      vec![diagnostic::DiagnosticKind::IncompatibleRequirement {
        name: "name".to_string(),
        requirement: types::InferenceType::string(),
        found: types::InferenceType::int(),
      }],
      sub_diagnostics
        .iter()
        .map(|diagnostic| diagnostic.kind.clone())
        .collect::<Vec<_>>()
    );
  }

  #[test]
  fn only_interfaces_can_be_conformed_to() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();
    let (person, _) = person_and_interface();

    let conformance = Conformance {
      interface: types::InferenceType::int().into(),
      ..conformance(&person, &Rc::new(types::InterfaceType::new("Unused", "test")))
    };

    assert_eq!(
      constraint::Outcome::Solved,
      conformance.solve(&mut context, root)
    );

    assert_eq!(
      diagnostic::DiagnosticKind::NonInterfaceConformance(types::InferenceType::int()),
      context.diagnostics()[0].kind
    );
  }
}
