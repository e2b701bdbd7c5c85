use std::rc::Rc;

use crate::{ast, constraint, context, diagnostic, types};

/// Accessing `name` on `receiver` produces `result`.
///
/// For receiver-less accesses such as `.some`, the receiver is the type the
/// expression is expected to have.
#[derive(Debug, Clone)]
pub struct Member {
  pub receiver: types::InferenceResult,
  pub name: String,
  pub result: types::InferenceType,
  pub location: ast::Span,
}

impl Member {
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

    let receiver = context.instantiate(scope, &self.receiver);

    self.undefined(context, scope, receiver);
  }

  pub(crate) fn describe(
    &self,
    context: &context::InferenceContext,
    scope: context::ContextId,
  ) -> String {
    format!(
      "member {}.{} -> {}",
      constraint::show(context, scope, &self.receiver),
      self.name,
      constraint::show_type(context, scope, &self.result)
    )
  }

  fn attempt(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    force: bool,
  ) -> constraint::Outcome {
    let receiver = context.instantiate(scope, &self.receiver);

    let member = match &receiver {
      types::InferenceType::Variable(..) | types::InferenceType::Placeholder(..) => {
        return constraint::Outcome::Blocked;
      }
      types::InferenceType::Any => Some(types::InferenceType::Any.into()),
      types::InferenceType::StructType(owner) => owner.static_member(&self.name),
      types::InferenceType::StructInstance(instance) => {
        match self.instance_member(context, scope, instance, force) {
          Ok(member) => member,
          Err(outcome) => return outcome,
        }
      }
      types::InferenceType::EnumType(owner) => {
        let instance = context.instantiate_owner(scope, owner);

        Self::case_of(&instance, &self.name)
      }
      types::InferenceType::EnumInstance(instance) => {
        match Self::case_of(instance, &self.name) {
          Some(case) => Some(case),
          None => match instance.owner.method(&self.name) {
            Some(method) if !force && context.is_pending(scope, &method) => {
              return constraint::Outcome::Blocked;
            }
            Some(method) => {
              let method = context.instantiate(scope, &method);

              Some(instance.specialize(&method).into())
            }
            None => None,
          },
        }
      }
      types::InferenceType::InterfaceType(interface) => {
        interface.requirements.borrow().get(&self.name).cloned()
      }
      types::InferenceType::SelfType(owner) => {
        let receiver = owner.as_self_instance();

        let member = Member {
          receiver: receiver.into(),
          name: self.name.clone(),
          result: self.result.clone(),
          location: self.location,
        };

        return member.attempt(context, scope, force);
      }
      _ => None,
    };

    match member {
      Some(member) => {
        let member = context.instantiate(scope, &member);

        context.unify(scope, &member, &self.result, self.location);
      }
      None => self.undefined(context, scope, receiver),
    }

    constraint::Outcome::Solved
  }

  fn instance_member(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    instance: &types::Instance<types::StructType>,
    force: bool,
  ) -> Result<Option<types::InferenceResult>, constraint::Outcome> {
    let member = match instance.owner.member(&self.name) {
      Some(member) => member,
      None => return Ok(None),
    };

    if !force && context.is_pending(scope, &member) {
      return Err(constraint::Outcome::Blocked);
    }

    let member = context.instantiate(scope, &member);

    Ok(Some(instance.specialize(&member).into()))
  }

  /// A case accessed through an enum instance. Cases without attached values
  /// are values of the enum itself; others are constructors.
  fn case_of(
    instance: &types::Instance<types::EnumType>,
    name: &str,
  ) -> Option<types::InferenceResult> {
    let case = types::EnumType::case(instance, name)?;

    let ty = if case.attached_types.is_empty() {
      types::InferenceType::EnumInstance(types::Instance {
        owner: Rc::clone(&instance.owner),
        substitutions: instance.substitutions.clone(),
      })
    } else {
      types::InferenceType::EnumCase(case)
    };

    Some(ty.into())
  }

  fn undefined(
    &self,
    context: &mut context::InferenceContext,
    scope: context::ContextId,
    receiver: types::InferenceType,
  ) {
    context.error(
      diagnostic::DiagnosticKind::UndefinedMember {
        receiver,
        member: self.name.clone(),
      },
      self.location,
    );

    context.poison(scope, &self.result);
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

  fn member(receiver: types::InferenceType, name: &str, result: types::InferenceType) -> Member {
    Member {
      receiver: receiver.into(),
      name: name.to_string(),
      result,
      location: ast::Span::default(),
    }
  }

  #[test]
  fn property_of_generic_instance_is_specialized() {
    let mut context = new_context();
    let root = context.root();
    let parameter = context.fresh_type_variable(root, "T");
    let owner = Rc::new(types::StructType::new("Box", "test", vec![parameter.clone()]));

    owner.properties.borrow_mut().insert(
      "value".to_string(),
      types::InferenceType::Variable(parameter.clone()).into(),
    );

    let instance = types::InferenceType::StructInstance(types::Instance {
      owner,
      substitutions: types::Substitutions::from([(parameter, types::InferenceType::int())]),
    });

    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let member = member(instance, "value", result.clone());

    assert_eq!(constraint::Outcome::Solved, member.solve(&mut context, root));
    assert_eq!(types::InferenceType::int(), context.apply(root, &result));
  }

  #[test]
  fn unresolved_receiver_blocks_then_reports() {
    let mut context = new_context();
    let root = context.root();
    let receiver = types::InferenceType::Variable(context.fresh_type_variable(root, "receiver"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));
    let member = member(receiver, "count", result.clone());

    assert_eq!(constraint::Outcome::Blocked, member.solve(&mut context, root));

    member.exhaust(&mut context, root);

    assert!(matches!(
      context.diagnostics()[0].kind,
      diagnostic::DiagnosticKind::UndefinedMember { .. }
    ));

    assert_eq!(types::InferenceType::Any, context.apply(root, &result));
  }

  #[test]
  fn case_without_values_is_an_instance() {
    let mut context = new_context();
    let root = context.root();
    let owner = Rc::new(types::EnumType::new("Light", "test", Vec::new()));

    owner.cases.borrow_mut().insert("on".to_string(), Vec::new());

    owner
      .cases
      .borrow_mut()
      .insert("dimmed".to_string(), vec![types::InferenceType::int()]);

    let on = types::InferenceType::Variable(context.fresh_type_variable(root, "on"));
    let dimmed = types::InferenceType::Variable(context.fresh_type_variable(root, "dimmed"));

    member(types::InferenceType::EnumType(Rc::clone(&owner)), "on", on.clone())
      .solve(&mut context, root);

    member(types::InferenceType::EnumType(owner), "dimmed", dimmed.clone())
      .solve(&mut context, root);

    assert_eq!("Light", context.apply(root, &on).to_string());
    assert_eq!("Light.dimmed(int)", context.apply(root, &dimmed).to_string());
  }
}
