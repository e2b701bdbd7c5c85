//! The closed set of types manipulated by inference.
//!
//! Types are immutable values; nominal declarations (structs, enums and
//! interfaces) are shared behind `Rc` and only ever grow new members while
//! their declaration body is being walked.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

/// Identifies one inference run. See [`crate::auxiliary::next_run_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
  pub run: RunId,
  /// Minting order within the run; lower is older.
  pub index: usize,
}

/// A type variable. Equality, ordering and hashing only consider the id; the
/// label exists for diagnostics and traces.
#[derive(Clone)]
pub struct TypeVariable {
  pub id: VariableId,
  pub label: Rc<str>,
}

impl TypeVariable {
  pub fn new(id: VariableId, label: &str) -> Self {
    Self {
      id,
      label: Rc::from(label),
    }
  }

  pub fn is_newer_than(&self, other: &TypeVariable) -> bool {
    self.id > other.id
  }
}

impl PartialEq for TypeVariable {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeVariable {}

impl PartialOrd for TypeVariable {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for TypeVariable {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.id.cmp(&other.id)
  }
}

impl std::hash::Hash for TypeVariable {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl std::fmt::Debug for TypeVariable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}#{}.{}", self.label, self.id.run.0, self.id.index)
  }
}

impl std::fmt::Display for TypeVariable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}#{}", self.label, self.id.index)
  }
}

/// A mapping from type variables to types. Ordered, so that iterating over it
/// (ie. when hoisting) is deterministic.
pub type Substitutions = BTreeMap<TypeVariable, InferenceType>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
  Int,
  String,
  Bool,
  Pointer,
  /// The type of the `none` literal.
  None,
  Void,
}

impl std::fmt::Display for Primitive {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Primitive::Int => "int",
      Primitive::String => "String",
      Primitive::Bool => "bool",
      Primitive::Pointer => "pointer",
      Primitive::None => "none",
      Primitive::Void => "void",
    };

    write!(f, "{}", name)
  }
}

/// Common surface of generic nominal declarations.
pub trait Nominal {
  fn name(&self) -> &str;

  fn module(&self) -> &str;

  fn type_parameters(&self) -> &[TypeVariable];
}

pub type MemberMap = RefCell<indexmap::IndexMap<String, InferenceResult>>;

pub struct StructType {
  pub name: String,
  pub module: String,
  pub type_parameters: Vec<TypeVariable>,
  pub properties: MemberMap,
  pub methods: MemberMap,
  pub initializers: MemberMap,
  pub static_members: MemberMap,
}

impl StructType {
  pub fn new(name: &str, module: &str, type_parameters: Vec<TypeVariable>) -> Self {
    Self {
      name: name.to_string(),
      module: module.to_string(),
      type_parameters,
      properties: Default::default(),
      methods: Default::default(),
      initializers: Default::default(),
      static_members: Default::default(),
    }
  }

  /// Find an instance member; properties shadow methods.
  pub fn member(&self, name: &str) -> Option<InferenceResult> {
    if let Some(property) = self.properties.borrow().get(name) {
      return Some(property.clone());
    }

    self.methods.borrow().get(name).cloned()
  }

  pub fn static_member(&self, name: &str) -> Option<InferenceResult> {
    self.static_members.borrow().get(name).cloned()
  }
}

pub struct EnumType {
  pub name: String,
  pub module: String,
  pub type_parameters: Vec<TypeVariable>,
  /// Case names to their attached types, in declaration order.
  pub cases: RefCell<indexmap::IndexMap<String, Vec<InferenceType>>>,
  pub methods: MemberMap,
}

impl EnumType {
  pub fn new(name: &str, module: &str, type_parameters: Vec<TypeVariable>) -> Self {
    Self {
      name: name.to_string(),
      module: module.to_string(),
      type_parameters,
      cases: Default::default(),
      methods: Default::default(),
    }
  }

  pub fn method(&self, name: &str) -> Option<InferenceResult> {
    self.methods.borrow().get(name).cloned()
  }

  /// Build the case named `name` as seen through the given instance, with its
  /// attached types already specialized.
  pub fn case(instance: &Instance<EnumType>, name: &str) -> Option<EnumCase> {
    let cases = instance.owner.cases.borrow();
    let attached_types = cases.get(name)?;

    Some(EnumCase {
      name: name.to_string(),
      attached_types: attached_types
        .iter()
        .map(|attached_type| instance.specialize(attached_type))
        .collect(),
      instance: instance.clone(),
    })
  }
}

pub struct InterfaceType {
  pub name: String,
  pub module: String,
  /// Required properties and methods, in declaration order.
  pub requirements: MemberMap,
}

impl InterfaceType {
  pub fn new(name: &str, module: &str) -> Self {
    Self {
      name: name.to_string(),
      module: module.to_string(),
      requirements: Default::default(),
    }
  }
}

macro_rules! impl_nominal {
  ($type_name:ty, $label:literal) => {
    impl PartialEq for $type_name {
      fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.name == other.name
      }
    }

    // NOTE: Members may refer back to their owner, so printing them would never
    // terminate.
    impl std::fmt::Debug for $type_name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}.{}", $label, self.module, self.name)
      }
    }
  };
}

impl_nominal!(StructType, "struct");
impl_nominal!(EnumType, "enum");
impl_nominal!(InterfaceType, "interface");

impl Nominal for StructType {
  fn name(&self) -> &str {
    &self.name
  }

  fn module(&self) -> &str {
    &self.module
  }

  fn type_parameters(&self) -> &[TypeVariable] {
    &self.type_parameters
  }
}

impl Nominal for EnumType {
  fn name(&self) -> &str {
    &self.name
  }

  fn module(&self) -> &str {
    &self.module
  }

  fn type_parameters(&self) -> &[TypeVariable] {
    &self.type_parameters
  }
}

/// A use of a generic nominal type with (some of) its type parameters bound.
#[derive(Debug, PartialEq)]
pub struct Instance<T> {
  pub owner: Rc<T>,
  pub substitutions: Substitutions,
}

impl<T> Clone for Instance<T> {
  fn clone(&self) -> Self {
    Self {
      owner: Rc::clone(&self.owner),
      substitutions: self.substitutions.clone(),
    }
  }
}

impl<T: Nominal> Instance<T> {
  /// Replace the owner's type parameters within a member's type with what
  /// this instance knows about them. Unknown parameters are left in place.
  pub fn specialize(&self, member_type: &InferenceType) -> InferenceType {
    member_type.substituting(&self.substitutions)
  }

  /// The argument bound to the type parameter at `position`, if any.
  pub fn argument(&self, position: usize) -> Option<&InferenceType> {
    self
      .owner
      .type_parameters()
      .get(position)
      .and_then(|parameter| self.substitutions.get(parameter))
  }

  fn write_arguments(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.owner.name())?;

    if self.owner.type_parameters().is_empty() {
      return Ok(());
    }

    let arguments = self
      .owner
      .type_parameters()
      .iter()
      .map(|parameter| match self.substitutions.get(parameter) {
        Some(argument) => argument.to_string(),
        None => parameter.to_string(),
      })
      .collect::<Vec<_>>();

    write!(f, "<{}>", arguments.join(", "))
  }
}

/// An enum case seen through a particular enum instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
  pub name: String,
  pub attached_types: Vec<InferenceType>,
  pub instance: Instance<EnumType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeOwner {
  Struct(Rc<StructType>),
  Enum(Rc<EnumType>),
  Interface(Rc<InterfaceType>),
}

impl TypeOwner {
  pub fn name(&self) -> &str {
    match self {
      TypeOwner::Struct(struct_type) => &struct_type.name,
      TypeOwner::Enum(enum_type) => &enum_type.name,
      TypeOwner::Interface(interface_type) => &interface_type.name,
    }
  }

  /// The owner as it is seen from inside its own declaration, where every type
  /// parameter stands for itself.
  pub fn as_self_instance(&self) -> InferenceType {
    fn identity(parameters: &[TypeVariable]) -> Substitutions {
      parameters
        .iter()
        .map(|parameter| (parameter.clone(), InferenceType::Variable(parameter.clone())))
        .collect()
    }

    match self {
      TypeOwner::Struct(owner) => InferenceType::StructInstance(Instance {
        substitutions: identity(&owner.type_parameters),
        owner: Rc::clone(owner),
      }),
      TypeOwner::Enum(owner) => InferenceType::EnumInstance(Instance {
        substitutions: identity(&owner.type_parameters),
        owner: Rc::clone(owner),
      }),
      TypeOwner::Interface(owner) => InferenceType::InterfaceType(Rc::clone(owner)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
  /// A literal, or an enum case without arguments.
  Value,
  /// A name that binds whatever it matches.
  Variable(String),
  /// An enum case with argument sub-patterns, aligned positionally with the
  /// case's attached types.
  Call {
    callee: InferenceType,
    arguments: Vec<Pattern>,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
  /// The type of the values this pattern matches.
  pub ty: InferenceType,
  pub kind: PatternKind,
}

impl Pattern {
  /// The sub-patterns of a call-shaped pattern; empty otherwise.
  pub fn values(&self) -> &[Pattern] {
    match &self.kind {
      PatternKind::Call { arguments, .. } => arguments,
      _ => &[],
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceType {
  Variable(TypeVariable),
  Base(Primitive),
  Function(Vec<InferenceType>, Box<InferenceType>),
  StructType(Rc<StructType>),
  StructInstance(Instance<StructType>),
  EnumType(Rc<EnumType>),
  EnumInstance(Instance<EnumType>),
  EnumCase(EnumCase),
  InterfaceType(Rc<InterfaceType>),
  Pattern(Box<Pattern>),
  SelfType(TypeOwner),
  /// Stands for a name that is declared later on in the same scope.
  Placeholder(TypeVariable),
  Any,
}

impl InferenceType {
  pub fn int() -> Self {
    InferenceType::Base(Primitive::Int)
  }

  pub fn string() -> Self {
    InferenceType::Base(Primitive::String)
  }

  pub fn bool() -> Self {
    InferenceType::Base(Primitive::Bool)
  }

  pub fn void() -> Self {
    InferenceType::Base(Primitive::Void)
  }

  pub fn function(parameters: Vec<InferenceType>, return_type: InferenceType) -> Self {
    InferenceType::Function(parameters, Box::new(return_type))
  }

  /// The variable behind a type variable or placeholder.
  pub fn as_variable(&self) -> Option<&TypeVariable> {
    match self {
      InferenceType::Variable(variable) | InferenceType::Placeholder(variable) => Some(variable),
      _ => None,
    }
  }

  /// Types that are immediately nested within this type. Members of nominal
  /// declarations are not considered part of the type.
  pub fn inner_types(&self) -> Vec<&InferenceType> {
    match self {
      InferenceType::Function(parameters, return_type) => {
        let mut inner_types = parameters.iter().collect::<Vec<_>>();

        inner_types.push(return_type);

        inner_types
      }
      InferenceType::StructInstance(instance) => instance.substitutions.values().collect(),
      InferenceType::EnumInstance(instance) => instance.substitutions.values().collect(),
      InferenceType::EnumCase(case) => case
        .attached_types
        .iter()
        .chain(case.instance.substitutions.values())
        .collect(),
      InferenceType::Pattern(pattern) => {
        let mut inner_types = vec![&pattern.ty];

        if let PatternKind::Call { callee, arguments } = &pattern.kind {
          inner_types.push(callee);
          inner_types.extend(arguments.iter().map(|argument| &argument.ty));
        }

        inner_types
      }
      InferenceType::Variable(..)
      | InferenceType::Placeholder(..)
      | InferenceType::Base(..)
      | InferenceType::StructType(..)
      | InferenceType::EnumType(..)
      | InferenceType::InterfaceType(..)
      | InferenceType::SelfType(..)
      | InferenceType::Any => Vec::new(),
    }
  }

  /// Collect the type variables occurring within this type, in order of first
  /// appearance and without duplicates. Placeholders are not collected.
  pub fn free_variables(&self) -> Vec<TypeVariable> {
    fn collect(ty: &InferenceType, variables: &mut Vec<TypeVariable>) {
      if let InferenceType::Variable(variable) = ty {
        if !variables.contains(variable) {
          variables.push(variable.clone());
        }

        return;
      }

      for inner_type in ty.inner_types() {
        collect(inner_type, variables);
      }
    }

    let mut variables = Vec::new();

    collect(self, &mut variables);

    variables
  }

  /// Whether the given variable (or placeholder) occurs anywhere within
  /// this type, without following any substitution table.
  pub fn mentions(&self, subject: &TypeVariable) -> bool {
    match self.as_variable() {
      Some(variable) => variable == subject,
      None => self
        .inner_types()
        .into_iter()
        .any(|inner_type| inner_type.mentions(subject)),
    }
  }

  /// Structurally replace variables found in the map. This never consults a
  /// context; see the substitution module for table-driven resolution.
  pub fn substituting(&self, map: &Substitutions) -> InferenceType {
    if map.is_empty() {
      return self.clone();
    }

    let substitute_all = |types: &[InferenceType]| {
      types
        .iter()
        .map(|ty| ty.substituting(map))
        .collect::<Vec<_>>()
    };

    let substitute_map = |substitutions: &Substitutions| {
      substitutions
        .iter()
        .map(|(parameter, argument)| (parameter.clone(), argument.substituting(map)))
        .collect::<Substitutions>()
    };

    match self {
      InferenceType::Variable(variable) => match map.get(variable) {
        Some(substitution) => substitution.clone(),
        None => self.clone(),
      },
      InferenceType::Function(parameters, return_type) => {
        InferenceType::function(substitute_all(parameters), return_type.substituting(map))
      }
      InferenceType::StructInstance(instance) => InferenceType::StructInstance(Instance {
        owner: Rc::clone(&instance.owner),
        substitutions: substitute_map(&instance.substitutions),
      }),
      InferenceType::EnumInstance(instance) => InferenceType::EnumInstance(Instance {
        owner: Rc::clone(&instance.owner),
        substitutions: substitute_map(&instance.substitutions),
      }),
      InferenceType::EnumCase(case) => InferenceType::EnumCase(EnumCase {
        name: case.name.clone(),
        attached_types: substitute_all(&case.attached_types),
        instance: Instance {
          owner: Rc::clone(&case.instance.owner),
          substitutions: substitute_map(&case.instance.substitutions),
        },
      }),
      InferenceType::Pattern(pattern) => {
        InferenceType::Pattern(Box::new(substitute_pattern(pattern, map)))
      }
      InferenceType::Placeholder(..)
      | InferenceType::Base(..)
      | InferenceType::StructType(..)
      | InferenceType::EnumType(..)
      | InferenceType::InterfaceType(..)
      | InferenceType::SelfType(..)
      | InferenceType::Any => self.clone(),
    }
  }
}

fn substitute_pattern(pattern: &Pattern, map: &Substitutions) -> Pattern {
  let kind = match &pattern.kind {
    PatternKind::Call { callee, arguments } => PatternKind::Call {
      callee: callee.substituting(map),
      arguments: arguments
        .iter()
        .map(|argument| substitute_pattern(argument, map))
        .collect(),
    },
    other => other.clone(),
  };

  Pattern {
    ty: pattern.ty.substituting(map),
    kind,
  }
}

impl std::fmt::Display for InferenceType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      InferenceType::Variable(variable) => write!(f, "{}", variable),
      InferenceType::Placeholder(variable) => write!(f, "placeholder({})", variable),
      InferenceType::Base(primitive) => write!(f, "{}", primitive),
      InferenceType::Function(parameters, return_type) => {
        let parameters = parameters
          .iter()
          .map(ToString::to_string)
          .collect::<Vec<_>>();

        write!(f, "({}) -> {}", parameters.join(", "), return_type)
      }
      InferenceType::StructType(struct_type) => write!(f, "{}.Type", struct_type.name),
      InferenceType::StructInstance(instance) => instance.write_arguments(f),
      InferenceType::EnumType(enum_type) => write!(f, "{}.Type", enum_type.name),
      InferenceType::EnumInstance(instance) => instance.write_arguments(f),
      InferenceType::EnumCase(case) => {
        let attached_types = case
          .attached_types
          .iter()
          .map(ToString::to_string)
          .collect::<Vec<_>>();

        write!(
          f,
          "{}.{}({})",
          case.instance.owner.name,
          case.name,
          attached_types.join(", ")
        )
      }
      InferenceType::InterfaceType(interface_type) => write!(f, "{}", interface_type.name),
      InferenceType::Pattern(pattern) => write!(f, "pattern({})", pattern.ty),
      InferenceType::SelfType(owner) => write!(f, "Self({})", owner.name()),
      InferenceType::Any => write!(f, "any"),
    }
  }
}

/// A let-polymorphic generalization of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
  pub variables: Vec<TypeVariable>,
  pub ty: InferenceType,
  /// The context of the generalized declaration's body. Variables minted
  /// within it were introduced by the declaration, even those that only show
  /// up once its quantified variables have been solved.
  pub body: Option<crate::context::ContextId>,
}

impl std::fmt::Display for Scheme {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let variables = self
      .variables
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>();

    write!(f, "forall {}. {}", variables.join(" "), self.ty)
  }
}

/// What every syntax node is annotated with.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
  Type(InferenceType),
  Scheme(Scheme),
}

impl InferenceResult {
  /// The type of a plain result, or the (uninstantiated) body of a scheme.
  pub fn as_type(&self) -> &InferenceType {
    match self {
      InferenceResult::Type(ty) => ty,
      InferenceResult::Scheme(scheme) => &scheme.ty,
    }
  }

  pub fn into_type(self) -> InferenceType {
    match self {
      InferenceResult::Type(ty) => ty,
      InferenceResult::Scheme(scheme) => scheme.ty,
    }
  }

  pub fn quantified_variables(&self) -> &[TypeVariable] {
    match self {
      InferenceResult::Type(..) => &[],
      InferenceResult::Scheme(scheme) => &scheme.variables,
    }
  }
}

impl From<InferenceType> for InferenceResult {
  fn from(ty: InferenceType) -> Self {
    InferenceResult::Type(ty)
  }
}

impl std::fmt::Display for InferenceResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      InferenceResult::Type(ty) => write!(f, "{}", ty),
      InferenceResult::Scheme(scheme) => write!(f, "{}", scheme),
    }
  }
}
