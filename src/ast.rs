//! The immutable syntax tree walked by inference.
//!
//! Lexing and parsing live outside of this crate; whatever produces these
//! nodes is responsible for assigning every node a unique [`NodeId`], which
//! is the key that inference results are later retrieved by.

use crate::auxiliary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A byte range within a source file, compatible with `codespan-reporting`'s
/// file database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
  pub file_id: usize,
  pub start: usize,
  pub end: usize,
}

impl Span {
  pub fn range(&self) -> std::ops::Range<usize> {
    self.start..self.end
  }
}

#[derive(Debug, Clone)]
pub struct Module {
  pub name: String,
  pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  Expr(Expr),
  Variable(VariableDecl),
  Return(Return),
  If(If),
  While(While),
  Match(Match),
  Function(Function),
  Struct(Struct),
  Enum(Enum),
  Interface(Interface),
}

impl Stmt {
  pub fn id(&self) -> NodeId {
    match self {
      Stmt::Expr(expr) => expr.id(),
      Stmt::Variable(variable) => variable.id,
      Stmt::Return(return_) => return_.id,
      Stmt::If(if_) => if_.id,
      Stmt::While(while_) => while_.id,
      Stmt::Match(match_) => match_.id,
      Stmt::Function(function) => function.id,
      Stmt::Struct(struct_) => struct_.id,
      Stmt::Enum(enum_) => enum_.id,
      Stmt::Interface(interface) => interface.id,
    }
  }
}

#[derive(Debug, Clone)]
pub enum Expr {
  Literal(Literal),
  Variable(VariableRef),
  Call(Call),
  Member(Member),
  Binary(Binary),
  Unary(Unary),
  Closure(Box<Function>),
  If(IfExpr),
  Subscript(Subscript),
  Array(ArrayLiteral),
  Assignment(Assignment),
}

impl Expr {
  pub fn id(&self) -> NodeId {
    match self {
      Expr::Literal(literal) => literal.id,
      Expr::Variable(variable) => variable.id,
      Expr::Call(call) => call.id,
      Expr::Member(member) => member.id,
      Expr::Binary(binary) => binary.id,
      Expr::Unary(unary) => unary.id,
      Expr::Closure(closure) => closure.id,
      Expr::If(if_expr) => if_expr.id,
      Expr::Subscript(subscript) => subscript.id,
      Expr::Array(array) => array.id,
      Expr::Assignment(assignment) => assignment.id,
    }
  }

  pub fn span(&self) -> Span {
    match self {
      Expr::Literal(literal) => literal.span,
      Expr::Variable(variable) => variable.span,
      Expr::Call(call) => call.span,
      Expr::Member(member) => member.span,
      Expr::Binary(binary) => binary.span,
      Expr::Unary(unary) => unary.span,
      Expr::Closure(closure) => closure.span,
      Expr::If(if_expr) => if_expr.span,
      Expr::Subscript(subscript) => subscript.span,
      Expr::Array(array) => array.span,
      Expr::Assignment(assignment) => assignment.span,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
  Int(i64),
  String(String),
  Bool(bool),
  None,
}

#[derive(Debug, Clone)]
pub struct Literal {
  pub id: NodeId,
  pub span: Span,
  pub value: LiteralValue,
}

#[derive(Debug, Clone)]
pub struct VariableRef {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
}

#[derive(Debug, Clone)]
pub struct Argument {
  pub label: Option<String>,
  pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct Call {
  pub id: NodeId,
  pub span: Span,
  pub callee: Box<Expr>,
  pub arguments: Vec<Argument>,
}

/// A member access. When `receiver` is `None` the access is written in its
/// shorthand form (`.some`) and the receiver is taken from the expected type.
#[derive(Debug, Clone)]
pub struct Member {
  pub id: NodeId,
  pub span: Span,
  pub receiver: Option<Box<Expr>>,
  pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Star,
  Slash,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
  Equal,
  NotEqual,
  And,
  Or,
}

impl BinaryOperator {
  pub fn is_arithmetic(&self) -> bool {
    matches!(
      self,
      BinaryOperator::Plus | BinaryOperator::Minus | BinaryOperator::Star | BinaryOperator::Slash
    )
  }

  pub fn is_ordering(&self) -> bool {
    matches!(
      self,
      BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual
    )
  }

  pub fn is_equality(&self) -> bool {
    matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
  }

  pub fn is_logical(&self) -> bool {
    matches!(self, BinaryOperator::And | BinaryOperator::Or)
  }
}

impl std::fmt::Display for BinaryOperator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let symbol = match self {
      BinaryOperator::Plus => "+",
      BinaryOperator::Minus => "-",
      BinaryOperator::Star => "*",
      BinaryOperator::Slash => "/",
      BinaryOperator::Less => "<",
      BinaryOperator::LessEqual => "<=",
      BinaryOperator::Greater => ">",
      BinaryOperator::GreaterEqual => ">=",
      BinaryOperator::Equal => "==",
      BinaryOperator::NotEqual => "!=",
      BinaryOperator::And => "&&",
      BinaryOperator::Or => "||",
    };

    write!(f, "{}", symbol)
  }
}

#[derive(Debug, Clone)]
pub struct Binary {
  pub id: NodeId,
  pub span: Span,
  pub lhs: Box<Expr>,
  pub operator: BinaryOperator,
  pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Not,
  Negate,
}

#[derive(Debug, Clone)]
pub struct Unary {
  pub id: NodeId,
  pub span: Span,
  pub operator: UnaryOperator,
  pub operand: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct TypeAnnotation {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub arguments: Vec<TypeAnnotation>,
  /// Whether the annotation carries the `?` suffix.
  pub is_optional: bool,
}

#[derive(Debug, Clone)]
pub struct Parameter {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub type_annotation: Option<TypeAnnotation>,
}

#[derive(Debug, Clone)]
pub struct Block {
  pub id: NodeId,
  pub span: Span,
  pub statements: Vec<Stmt>,
}

/// Named functions, methods, initializers and closures all share this node.
#[derive(Debug, Clone)]
pub struct Function {
  pub id: NodeId,
  pub span: Span,
  pub name: Option<String>,
  pub parameters: Vec<Parameter>,
  pub return_type: Option<TypeAnnotation>,
  pub body: Block,
  pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct IfExpr {
  pub id: NodeId,
  pub span: Span,
  pub condition: Box<Expr>,
  pub consequence: Block,
  pub alternative: Block,
}

#[derive(Debug, Clone)]
pub struct Subscript {
  pub id: NodeId,
  pub span: Span,
  pub receiver: Box<Expr>,
  pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteral {
  pub id: NodeId,
  pub span: Span,
  pub elements: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
  pub id: NodeId,
  pub span: Span,
  pub target: Box<Expr>,
  pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub is_mutable: bool,
  pub is_static: bool,
  pub type_annotation: Option<TypeAnnotation>,
  pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Return {
  pub id: NodeId,
  pub span: Span,
  pub value: Option<Expr>,
}

/// `if let name` or `if let name = value`. Without a value, the optional
/// being unwrapped is the variable with the same name.
#[derive(Debug, Clone)]
pub struct LetUnwrap {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Condition {
  Boolean(Expr),
  LetUnwrap(LetUnwrap),
}

#[derive(Debug, Clone)]
pub struct If {
  pub id: NodeId,
  pub span: Span,
  pub condition: Condition,
  pub consequence: Block,
  pub alternative: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct While {
  pub id: NodeId,
  pub span: Span,
  pub condition: Expr,
  pub body: Block,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
  pub id: NodeId,
  pub span: Span,
  /// The arm's pattern, or `None` for the `else` arm.
  pub pattern: Option<Expr>,
  pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Match {
  pub id: NodeId,
  pub span: Span,
  pub target: Expr,
  pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone)]
pub struct TypeParameter {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
}

#[derive(Debug, Clone)]
pub enum StructMember {
  Property(VariableDecl),
  Method(Function),
  Initializer(Function),
}

#[derive(Debug, Clone)]
pub struct Struct {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub type_parameters: Vec<TypeParameter>,
  pub conformances: Vec<TypeAnnotation>,
  pub members: Vec<StructMember>,
}

#[derive(Debug, Clone)]
pub struct EnumCaseDecl {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub attached_types: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone)]
pub struct Enum {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub type_parameters: Vec<TypeParameter>,
  pub conformances: Vec<TypeAnnotation>,
  pub cases: Vec<EnumCaseDecl>,
  pub methods: Vec<Function>,
}

#[derive(Debug, Clone)]
pub enum Requirement {
  Property {
    id: NodeId,
    span: Span,
    name: String,
    type_annotation: TypeAnnotation,
  },
  Method {
    id: NodeId,
    span: Span,
    name: String,
    parameters: Vec<Parameter>,
    return_type: Option<TypeAnnotation>,
  },
}

#[derive(Debug, Clone)]
pub struct Interface {
  pub id: NodeId,
  pub span: Span,
  pub name: String,
  pub requirements: Vec<Requirement>,
}

/// Builds syntax trees by hand, minting node ids and distinct spans.
///
/// Parsers and tests use this so that every node is keyed uniquely without
/// having to thread an id counter around manually.
pub struct Builder {
  id_generator: auxiliary::IdGenerator,
  file_id: usize,
}

impl Default for Builder {
  fn default() -> Self {
    Self::new(0)
  }
}

impl Builder {
  pub fn new(file_id: usize) -> Self {
    Self {
      id_generator: auxiliary::IdGenerator::default(),
      file_id,
    }
  }

  fn next(&mut self) -> (NodeId, Span) {
    let id = self.id_generator.next_node_id();

    let span = Span {
      file_id: self.file_id,
      start: id.0,
      end: id.0 + 1,
    };

    (id, span)
  }

  pub fn module(&mut self, name: &str, statements: Vec<Stmt>) -> Module {
    Module {
      name: name.to_string(),
      statements,
    }
  }

  fn literal(&mut self, value: LiteralValue) -> Expr {
    let (id, span) = self.next();

    Expr::Literal(Literal { id, span, value })
  }

  pub fn int(&mut self, value: i64) -> Expr {
    self.literal(LiteralValue::Int(value))
  }

  pub fn string(&mut self, value: &str) -> Expr {
    self.literal(LiteralValue::String(value.to_string()))
  }

  pub fn bool(&mut self, value: bool) -> Expr {
    self.literal(LiteralValue::Bool(value))
  }

  pub fn none(&mut self) -> Expr {
    self.literal(LiteralValue::None)
  }

  pub fn reference(&mut self, name: &str) -> Expr {
    let (id, span) = self.next();

    Expr::Variable(VariableRef {
      id,
      span,
      name: name.to_string(),
    })
  }

  pub fn arg(&mut self, value: Expr) -> Argument {
    Argument { label: None, value }
  }

  pub fn labeled(&mut self, label: &str, value: Expr) -> Argument {
    Argument {
      label: Some(label.to_string()),
      value,
    }
  }

  pub fn call(&mut self, callee: Expr, arguments: Vec<Argument>) -> Expr {
    let (id, span) = self.next();

    Expr::Call(Call {
      id,
      span,
      callee: Box::new(callee),
      arguments,
    })
  }

  /// Shorthand for a call whose arguments are all unlabeled.
  pub fn call_with(&mut self, callee: Expr, arguments: Vec<Expr>) -> Expr {
    let arguments = arguments
      .into_iter()
      .map(|value| Argument { label: None, value })
      .collect();

    self.call(callee, arguments)
  }

  pub fn member(&mut self, receiver: Expr, name: &str) -> Expr {
    let (id, span) = self.next();

    Expr::Member(Member {
      id,
      span,
      receiver: Some(Box::new(receiver)),
      name: name.to_string(),
    })
  }

  /// A receiver-less member access, such as `.some`.
  pub fn dot(&mut self, name: &str) -> Expr {
    let (id, span) = self.next();

    Expr::Member(Member {
      id,
      span,
      receiver: None,
      name: name.to_string(),
    })
  }

  pub fn binary(&mut self, lhs: Expr, operator: BinaryOperator, rhs: Expr) -> Expr {
    let (id, span) = self.next();

    Expr::Binary(Binary {
      id,
      span,
      lhs: Box::new(lhs),
      operator,
      rhs: Box::new(rhs),
    })
  }

  pub fn unary(&mut self, operator: UnaryOperator, operand: Expr) -> Expr {
    let (id, span) = self.next();

    Expr::Unary(Unary {
      id,
      span,
      operator,
      operand: Box::new(operand),
    })
  }

  pub fn closure(&mut self, parameters: Vec<Parameter>, body: Vec<Stmt>) -> Expr {
    let function = self.function(None, parameters, None, body);

    Expr::Closure(Box::new(function))
  }

  pub fn if_expr(
    &mut self,
    condition: Expr,
    consequence: Vec<Stmt>,
    alternative: Vec<Stmt>,
  ) -> Expr {
    let consequence = self.block(consequence);
    let alternative = self.block(alternative);
    let (id, span) = self.next();

    Expr::If(IfExpr {
      id,
      span,
      condition: Box::new(condition),
      consequence,
      alternative,
    })
  }

  pub fn subscript(&mut self, receiver: Expr, arguments: Vec<Expr>) -> Expr {
    let (id, span) = self.next();

    Expr::Subscript(Subscript {
      id,
      span,
      receiver: Box::new(receiver),
      arguments,
    })
  }

  pub fn array(&mut self, elements: Vec<Expr>) -> Expr {
    let (id, span) = self.next();

    Expr::Array(ArrayLiteral { id, span, elements })
  }

  pub fn assign(&mut self, target: Expr, value: Expr) -> Expr {
    let (id, span) = self.next();

    Expr::Assignment(Assignment {
      id,
      span,
      target: Box::new(target),
      value: Box::new(value),
    })
  }

  pub fn ty(&mut self, name: &str) -> TypeAnnotation {
    self.generic_ty(name, Vec::new())
  }

  pub fn generic_ty(&mut self, name: &str, arguments: Vec<TypeAnnotation>) -> TypeAnnotation {
    let (id, span) = self.next();

    TypeAnnotation {
      id,
      span,
      name: name.to_string(),
      arguments,
      is_optional: false,
    }
  }

  pub fn optional_ty(&mut self, name: &str) -> TypeAnnotation {
    TypeAnnotation {
      is_optional: true,
      ..self.ty(name)
    }
  }

  pub fn param(&mut self, name: &str, type_annotation: Option<TypeAnnotation>) -> Parameter {
    let (id, span) = self.next();

    Parameter {
      id,
      span,
      name: name.to_string(),
      type_annotation,
    }
  }

  pub fn block(&mut self, statements: Vec<Stmt>) -> Block {
    let (id, span) = self.next();

    Block {
      id,
      span,
      statements,
    }
  }

  pub fn function(
    &mut self,
    name: Option<&str>,
    parameters: Vec<Parameter>,
    return_type: Option<TypeAnnotation>,
    body: Vec<Stmt>,
  ) -> Function {
    let body = self.block(body);
    let (id, span) = self.next();

    Function {
      id,
      span,
      name: name.map(str::to_string),
      parameters,
      return_type,
      body,
      is_static: false,
    }
  }

  /// A named function declaration statement.
  pub fn func(
    &mut self,
    name: &str,
    parameters: Vec<Parameter>,
    return_type: Option<TypeAnnotation>,
    body: Vec<Stmt>,
  ) -> Stmt {
    Stmt::Function(self.function(Some(name), parameters, return_type, body))
  }

  pub fn variable(
    &mut self,
    name: &str,
    type_annotation: Option<TypeAnnotation>,
    value: Option<Expr>,
  ) -> VariableDecl {
    let (id, span) = self.next();

    VariableDecl {
      id,
      span,
      name: name.to_string(),
      is_mutable: true,
      is_static: false,
      type_annotation,
      value,
    }
  }

  pub fn let_stmt(&mut self, name: &str, value: Expr) -> Stmt {
    let declaration = VariableDecl {
      is_mutable: false,
      ..self.variable(name, None, Some(value))
    };

    Stmt::Variable(declaration)
  }

  pub fn var_stmt(
    &mut self,
    name: &str,
    type_annotation: Option<TypeAnnotation>,
    value: Option<Expr>,
  ) -> Stmt {
    Stmt::Variable(self.variable(name, type_annotation, value))
  }

  pub fn expr(&mut self, expr: Expr) -> Stmt {
    Stmt::Expr(expr)
  }

  pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
    let (id, span) = self.next();

    Stmt::Return(Return { id, span, value })
  }

  pub fn if_let(&mut self, name: &str, value: Option<Expr>) -> Condition {
    let (id, span) = self.next();

    Condition::LetUnwrap(LetUnwrap {
      id,
      span,
      name: name.to_string(),
      value,
    })
  }

  pub fn if_stmt(
    &mut self,
    condition: Condition,
    consequence: Vec<Stmt>,
    alternative: Option<Vec<Stmt>>,
  ) -> Stmt {
    let consequence = self.block(consequence);
    let alternative = alternative.map(|statements| self.block(statements));
    let (id, span) = self.next();

    Stmt::If(If {
      id,
      span,
      condition,
      consequence,
      alternative,
    })
  }

  pub fn while_stmt(&mut self, condition: Expr, body: Vec<Stmt>) -> Stmt {
    let body = self.block(body);
    let (id, span) = self.next();

    Stmt::While(While {
      id,
      span,
      condition,
      body,
    })
  }

  pub fn arm(&mut self, pattern: Option<Expr>, body: Vec<Stmt>) -> MatchArm {
    let body = self.block(body);
    let (id, span) = self.next();

    MatchArm {
      id,
      span,
      pattern,
      body,
    }
  }

  pub fn match_stmt(&mut self, target: Expr, arms: Vec<MatchArm>) -> Stmt {
    let (id, span) = self.next();

    Stmt::Match(Match {
      id,
      span,
      target,
      arms,
    })
  }

  fn type_parameters(&mut self, names: &[&str]) -> Vec<TypeParameter> {
    names
      .iter()
      .map(|name| {
        let (id, span) = self.next();

        TypeParameter {
          id,
          span,
          name: name.to_string(),
        }
      })
      .collect()
  }

  pub fn struct_decl(
    &mut self,
    name: &str,
    type_parameters: &[&str],
    conformances: Vec<TypeAnnotation>,
    members: Vec<StructMember>,
  ) -> Stmt {
    let type_parameters = self.type_parameters(type_parameters);
    let (id, span) = self.next();

    Stmt::Struct(Struct {
      id,
      span,
      name: name.to_string(),
      type_parameters,
      conformances,
      members,
    })
  }

  pub fn property(
    &mut self,
    name: &str,
    type_annotation: Option<TypeAnnotation>,
    value: Option<Expr>,
  ) -> StructMember {
    StructMember::Property(self.variable(name, type_annotation, value))
  }

  pub fn method(
    &mut self,
    name: &str,
    parameters: Vec<Parameter>,
    return_type: Option<TypeAnnotation>,
    body: Vec<Stmt>,
  ) -> StructMember {
    StructMember::Method(self.function(Some(name), parameters, return_type, body))
  }

  pub fn initializer(&mut self, parameters: Vec<Parameter>, body: Vec<Stmt>) -> StructMember {
    StructMember::Initializer(self.function(Some("init"), parameters, None, body))
  }

  pub fn case(&mut self, name: &str, attached_types: Vec<TypeAnnotation>) -> EnumCaseDecl {
    let (id, span) = self.next();

    EnumCaseDecl {
      id,
      span,
      name: name.to_string(),
      attached_types,
    }
  }

  pub fn enum_decl(
    &mut self,
    name: &str,
    type_parameters: &[&str],
    cases: Vec<EnumCaseDecl>,
    methods: Vec<Function>,
  ) -> Stmt {
    let type_parameters = self.type_parameters(type_parameters);
    let (id, span) = self.next();

    Stmt::Enum(Enum {
      id,
      span,
      name: name.to_string(),
      type_parameters,
      conformances: Vec::new(),
      cases,
      methods,
    })
  }

  pub fn property_requirement(
    &mut self,
    name: &str,
    type_annotation: TypeAnnotation,
  ) -> Requirement {
    let (id, span) = self.next();

    Requirement::Property {
      id,
      span,
      name: name.to_string(),
      type_annotation,
    }
  }

  pub fn method_requirement(
    &mut self,
    name: &str,
    parameters: Vec<Parameter>,
    return_type: Option<TypeAnnotation>,
  ) -> Requirement {
    let (id, span) = self.next();

    Requirement::Method {
      id,
      span,
      name: name.to_string(),
      parameters,
      return_type,
    }
  }

  pub fn interface_decl(&mut self, name: &str, requirements: Vec<Requirement>) -> Stmt {
    let (id, span) = self.next();

    Stmt::Interface(Interface {
      id,
      span,
      name: name.to_string(),
      requirements,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn builder_assigns_unique_ids() {
    let mut builder = Builder::default();
    let first = builder.int(1);
    let second = builder.reference("x");

    assert!(first.id() != second.id());
    assert_eq!(first.span().end, second.span().start);
  }

  #[test]
  fn operator_classification() {
    assert!(BinaryOperator::Plus.is_arithmetic());
    assert!(BinaryOperator::LessEqual.is_ordering());
    assert!(BinaryOperator::NotEqual.is_equality());
    assert!(BinaryOperator::Or.is_logical());
    assert_eq!("&&", BinaryOperator::And.to_string());
  }
}
