//! The prelude: declarations every module can use without importing them.

use std::rc::Rc;

use crate::{ast, context, types};

/// Module name of every prelude declaration.
pub const MODULE: &str = "builtin";

const OPTIONAL: &str = "Optional";
const ARRAY: &str = "Array";

pub(crate) struct Builtins {
  optional: Rc<types::EnumType>,
  array: Rc<types::StructType>,
}

/// Declare the prelude in the given context.
pub(crate) fn register(
  context: &mut context::InferenceContext,
  prelude: context::ContextId,
) -> Builtins {
  let at = ast::Span::default();

  // enum Optional<Wrapped> { case some(Wrapped); case none }
  let wrapped = context.fresh_type_variable(prelude, "Wrapped");
  let optional = Rc::new(types::EnumType::new(OPTIONAL, MODULE, vec![wrapped.clone()]));

  {
    let mut cases = optional.cases.borrow_mut();

    cases.insert(
      "some".to_string(),
      vec![types::InferenceType::Variable(wrapped)],
    );

    cases.insert("none".to_string(), Vec::new());
  }

  // struct Array<Element> {
  //   var count: int
  //   func get(index: int) -> Element
  //   func append(element: Element)
  // }
  let element = context.fresh_type_variable(prelude, "Element");
  let element_type = types::InferenceType::Variable(element.clone());
  let array = Rc::new(types::StructType::new(ARRAY, MODULE, vec![element]));

  array
    .properties
    .borrow_mut()
    .insert("count".to_string(), types::InferenceType::int().into());

  {
    let mut methods = array.methods.borrow_mut();

    methods.insert(
      "get".to_string(),
      types::InferenceType::function(vec![types::InferenceType::int()], element_type.clone())
        .into(),
    );

    methods.insert(
      "append".to_string(),
      types::InferenceType::function(vec![element_type], types::InferenceType::void()).into(),
    );
  }

  // func print(value)
  let value = context.fresh_type_variable(prelude, "value");

  let print = types::InferenceResult::Scheme(types::Scheme {
    ty: types::InferenceType::function(
      vec![types::InferenceType::Variable(value.clone())],
      types::InferenceType::void(),
    ),
    variables: vec![value],
    body: None,
  });

  context.define_variable(
    prelude,
    OPTIONAL,
    types::InferenceType::EnumType(Rc::clone(&optional)).into(),
    at,
  );

  context.define_variable(
    prelude,
    ARRAY,
    types::InferenceType::StructType(Rc::clone(&array)).into(),
    at,
  );

  context.define_variable(prelude, "print", print, at);

  Builtins { optional, array }
}

pub(crate) fn is_optional(instance: &types::Instance<types::EnumType>) -> bool {
  instance.owner.module == MODULE && instance.owner.name == OPTIONAL
}

impl context::InferenceContext {
  /// `Optional<wrapped>`, or `any` when the prelude is disabled.
  pub(crate) fn optional_of(&self, wrapped: types::InferenceType) -> types::InferenceType {
    match &self.builtins {
      Some(builtins) => {
        types::InferenceType::EnumInstance(instance_of(&builtins.optional, wrapped))
      }
      None => types::InferenceType::Any,
    }
  }

  /// `Array<element>`, or `any` when the prelude is disabled.
  pub(crate) fn array_of(&self, element: types::InferenceType) -> types::InferenceType {
    match &self.builtins {
      Some(builtins) => types::InferenceType::StructInstance(instance_of(&builtins.array, element)),
      None => types::InferenceType::Any,
    }
  }
}

fn instance_of<T: types::Nominal>(
  owner: &Rc<T>,
  argument: types::InferenceType,
) -> types::Instance<T> {
  let substitutions = owner
    .type_parameters()
    .iter()
    .map(|parameter| (parameter.clone(), argument.clone()))
    .collect();

  types::Instance {
    owner: Rc::clone(owner),
    substitutions,
  }
}

#[cfg(test)]
mod tests {
  use crate::{config, context, types};
  use pretty_assertions::assert_eq;

  #[test]
  fn prelude_names_are_visible_from_the_module() {
    let context = context::InferenceContext::new("test", config::InferenceConfig::default());

    for name in ["Optional", "Array", "print"] {
      assert!(context.lookup_variable(context.root(), name).is_some());
    }

    assert_eq!(
      "Optional<int>",
      context.optional_of(types::InferenceType::int()).to_string()
    );

    assert_eq!(
      "Array<String>",
      context.array_of(types::InferenceType::string()).to_string()
    );
  }

  #[test]
  fn prelude_can_be_disabled() {
    let config = config::InferenceConfig {
      prelude: false,
      ..config::InferenceConfig::default()
    };

    let context = context::InferenceContext::new("test", config);

    assert_eq!(None, context.lookup_variable(context.root(), "print"));
    assert_eq!(types::InferenceType::Any, context.optional_of(types::InferenceType::int()));
  }

  #[test]
  fn module_declarations_shadow_the_prelude() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let root = context.root();

    context.define_variable(
      root,
      "print",
      types::InferenceType::int().into(),
      Default::default(),
    );

    assert!(context.diagnostics().is_empty());
  }
}
