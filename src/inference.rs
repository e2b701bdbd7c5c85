//! The syntax walk that turns a module into constraints.
//!
//! Walking never solves anything by itself: every relationship between types
//! becomes a constraint in the queue, and every syntax node is recorded along
//! with the context its result must later be resolved against. Names are
//! declared up front for every block, which is what allows functions and types
//! to be referenced before their declaration.

use std::{
  collections::{HashMap, HashSet},
  rc::Rc,
};

use crate::{
  ast, auxiliary, constraint, context, diagnostic, pattern, types,
  visit::{Visitable, Visitor},
};

pub(crate) struct InferenceVisitor<'a> {
  pub context: &'a mut context::InferenceContext,
  /// The context new names, variables and constraints are added to.
  pub scope: context::ContextId,
  /// Nominal declarations registered ahead of their bodies, along with the
  /// context their members are walked in.
  shells: HashMap<ast::NodeId, (types::TypeOwner, context::ContextId)>,
  /// Body contexts of nominal declarations. Callables declared in them hoist
  /// straight into the enclosing context.
  declaration_scopes: HashSet<context::ContextId>,
}

impl<'a> InferenceVisitor<'a> {
  pub(crate) fn new(context: &'a mut context::InferenceContext) -> Self {
    let scope = context.root();

    Self {
      context,
      scope,
      shells: HashMap::new(),
      declaration_scopes: HashSet::new(),
    }
  }

  pub(crate) fn fresh(&mut self, label: &str) -> types::InferenceType {
    types::InferenceType::Variable(self.context.fresh_type_variable(self.scope, label))
  }

  fn constrain(&mut self, constraint: constraint::Constraint) {
    self.context.add_constraint(self.scope, constraint);
  }

  fn equate(
    &mut self,
    lhs: impl Into<types::InferenceResult>,
    rhs: impl Into<types::InferenceResult>,
    location: ast::Span,
  ) {
    self.constrain(constraint::Constraint::Equality(constraint::Equality {
      lhs: lhs.into(),
      rhs: rhs.into(),
      location,
    }));
  }

  /// Make `scope` the current context, returning the previous one.
  fn enter(&mut self, scope: context::ContextId) -> context::ContextId {
    std::mem::replace(&mut self.scope, scope)
  }

  /// Queue the hoist of a finished child context into the nearest enclosing
  /// context that is not a declaration body.
  fn hoist(
    &mut self,
    child: context::ContextId,
    variables: Vec<types::TypeVariable>,
    location: ast::Span,
  ) {
    let mut target = self.scope;

    while self.declaration_scopes.contains(&target) {
      match self.context.parent_of(target) {
        Some(parent) => target = parent,
        None => break,
      }
    }

    self.context.add_constraint(
      target,
      constraint::Constraint::Hoist(constraint::Hoist {
        child,
        variables,
        location,
      }),
    );
  }

  /// Walk a block in a fresh child context, hoisting whatever it learns about
  /// outer variables back once it is solved.
  fn infer_branch(&mut self, block: &ast::Block) {
    let child = self.context.child_context(self.scope);
    let previous = self.enter(child);

    self.infer_block(block);
    self.scope = previous;
    self.hoist(child, Vec::new(), block.span);
  }

  /// Walk the statements of a block in the current context. Yields the value
  /// of the last statement when it is an expression.
  fn infer_block(&mut self, block: &ast::Block) -> Option<types::InferenceResult> {
    self.declare_names(&block.statements);

    let mut value = None;

    for statement in &block.statements {
      let result = self.visit_stmt(statement);

      value = match statement {
        ast::Stmt::Expr(..) => Some(result),
        _ => None,
      };
    }

    value
  }

  /// Register every declaration of a block before any of it is walked.
  fn declare_names(&mut self, statements: &[ast::Stmt]) {
    for statement in statements {
      match statement {
        ast::Stmt::Function(function) => {
          let Some(name) = &function.name else {
            continue;
          };

          let placeholder = self.context.fresh_type_variable(self.scope, name);

          self.context.define_variable(
            self.scope,
            name,
            types::InferenceType::Placeholder(placeholder).into(),
            function.span,
          );
        }
        ast::Stmt::Struct(declaration) => {
          let body = self.context.child_context(self.scope);
          let parameters = self.declare_type_parameters(body, &declaration.type_parameters);
          let module = self.context.module().to_string();

          let owner = types::TypeOwner::Struct(Rc::new(types::StructType::new(
            &declaration.name,
            &module,
            parameters,
          )));

          self.declare_shell(declaration.id, &declaration.name, owner, body, declaration.span);
        }
        ast::Stmt::Enum(declaration) => {
          let body = self.context.child_context(self.scope);
          let parameters = self.declare_type_parameters(body, &declaration.type_parameters);
          let module = self.context.module().to_string();

          let owner = types::TypeOwner::Enum(Rc::new(types::EnumType::new(
            &declaration.name,
            &module,
            parameters,
          )));

          self.declare_shell(declaration.id, &declaration.name, owner, body, declaration.span);
        }
        ast::Stmt::Interface(declaration) => {
          let body = self.context.child_context(self.scope);
          let module = self.context.module().to_string();

          let owner = types::TypeOwner::Interface(Rc::new(types::InterfaceType::new(
            &declaration.name,
            &module,
          )));

          self.declare_shell(declaration.id, &declaration.name, owner, body, declaration.span);
        }
        _ => {}
      }
    }
  }

  fn declare_type_parameters(
    &mut self,
    body: context::ContextId,
    parameters: &[ast::TypeParameter],
  ) -> Vec<types::TypeVariable> {
    parameters
      .iter()
      .map(|parameter| {
        let variable = self.context.fresh_type_variable(body, &parameter.name);

        self.context.define_variable(
          body,
          &parameter.name,
          types::InferenceType::Variable(variable.clone()).into(),
          parameter.span,
        );

        variable
      })
      .collect()
  }

  fn declare_shell(
    &mut self,
    id: ast::NodeId,
    name: &str,
    owner: types::TypeOwner,
    body: context::ContextId,
    at: ast::Span,
  ) {
    let ty = match &owner {
      types::TypeOwner::Struct(owner) => types::InferenceType::StructType(Rc::clone(owner)),
      types::TypeOwner::Enum(owner) => types::InferenceType::EnumType(Rc::clone(owner)),
      types::TypeOwner::Interface(owner) => types::InferenceType::InterfaceType(Rc::clone(owner)),
    };

    self.context.define_variable(self.scope, name, ty.into(), at);

    self.context.define_variable(
      body,
      "self",
      types::InferenceType::SelfType(owner.clone()).into(),
      at,
    );

    self.shells.insert(id, (owner, body));
    self.declaration_scopes.insert(body);
  }

  fn shell(&self, id: ast::NodeId) -> (types::TypeOwner, context::ContextId) {
    self
      .shells
      .get(&id)
      .cloned()
      .expect(auxiliary::BUG_DECLARATION_SHELL)
  }

  /// Infer a named function, method, initializer or closure. The result is
  /// generalized over every variable its signature introduced, and those
  /// variables stay pending until the body's context has been hoisted.
  fn infer_function(
    &mut self,
    function: &ast::Function,
    is_initializer: bool,
  ) -> types::InferenceResult {
    let child = self.context.child_context(self.scope);
    let previous = self.enter(child);

    let parameters = function
      .parameters
      .iter()
      .map(|parameter| {
        let ty = match &parameter.type_annotation {
          Some(annotation) => self.resolve_annotation(annotation),
          None => self.fresh(&parameter.name),
        };

        self
          .context
          .define_variable(child, &parameter.name, ty.clone().into(), parameter.span);

        self.context.extend(parameter.id, child, ty.clone().into());

        ty
      })
      .collect::<Vec<_>>();

    let return_type = match (&function.return_type, is_initializer) {
      (_, true) => types::InferenceType::void(),
      (Some(annotation), false) => self.resolve_annotation(annotation),
      (None, false) => self.fresh("return"),
    };

    let function_type = types::InferenceType::function(parameters, return_type.clone());

    // Direct recursion sees the monomorphic signature.
    if let (Some(name), false) = (&function.name, is_initializer) {
      self
        .context
        .define_variable(child, name, function_type.clone().into(), function.span);
    }

    self.context.start_tracking_returns();

    let value = self.infer_block(&function.body);
    let returns = self.context.finish_tracking_returns();

    if !is_initializer {
      match (returns.is_empty(), value) {
        (true, Some(value)) => self.equate(return_type.clone(), value, function.body.span),
        (true, None) if function.return_type.is_none() => {
          self.equate(return_type.clone(), types::InferenceType::void(), function.body.span)
        }
        (true, None) => {}
        (false, _) => {
          for returned in returns {
            self.equate(return_type.clone(), returned, function.span);
          }
        }
      }
    }

    self.scope = previous;

    let result = self.context.generalize(self.scope, &function_type, child);

    self.context.mark_pending(result.quantified_variables(), child);
    self.hoist(child, function_type.free_variables(), function.span);

    tracing::trace!(name = ?function.name, result = %result, "inferred signature");

    result
  }

  /// Resolve a written type into a type, reporting unknown names.
  pub(crate) fn resolve_annotation(
    &mut self,
    annotation: &ast::TypeAnnotation,
  ) -> types::InferenceType {
    let ty = match annotation.name.as_str() {
      "int" => types::InferenceType::int(),
      "String" | "string" => types::InferenceType::string(),
      "bool" => types::InferenceType::bool(),
      "pointer" => types::InferenceType::Base(types::Primitive::Pointer),
      "void" => types::InferenceType::void(),
      "any" => types::InferenceType::Any,
      name => match self
        .context
        .lookup_variable(self.scope, name)
        .map(types::InferenceResult::into_type)
      {
        Some(types::InferenceType::StructType(owner)) => {
          types::InferenceType::StructInstance(self.instance_with_arguments(&owner, annotation))
        }
        Some(types::InferenceType::EnumType(owner)) => {
          types::InferenceType::EnumInstance(self.instance_with_arguments(&owner, annotation))
        }
        Some(types::InferenceType::InterfaceType(owner)) => {
          types::InferenceType::InterfaceType(owner)
        }
        Some(types::InferenceType::SelfType(owner)) => owner.as_self_instance(),
        // Type parameters are declared as variables of their declaration's body.
        Some(parameter @ types::InferenceType::Variable(..)) => parameter,
        _ => {
          self.context.error(
            diagnostic::DiagnosticKind::UndefinedType(name.to_string()),
            annotation.span,
          );

          types::InferenceType::Any
        }
      },
    };

    if annotation.is_optional {
      self.context.optional_of(ty)
    } else {
      ty
    }
  }

  fn instance_with_arguments<T: types::Nominal>(
    &mut self,
    owner: &Rc<T>,
    annotation: &ast::TypeAnnotation,
  ) -> types::Instance<T> {
    let mut instance = self.context.instantiate_owner(self.scope, owner);

    if annotation.arguments.is_empty() {
      return instance;
    }

    if annotation.arguments.len() != owner.type_parameters().len() {
      self.context.error(
        diagnostic::DiagnosticKind::ArityMismatch {
          expected: owner.type_parameters().len(),
          actual: annotation.arguments.len(),
        },
        annotation.span,
      );
    }

    for (parameter, argument) in owner.type_parameters().iter().zip(&annotation.arguments) {
      let argument = self.resolve_annotation(argument);

      instance.substitutions.insert(parameter.clone(), argument);
    }

    instance
  }

  fn infer_conformances(
    &mut self,
    owner: &types::TypeOwner,
    conformances: &[ast::TypeAnnotation],
  ) {
    for annotation in conformances {
      let interface = self.resolve_annotation(annotation);

      self.context.schedule_conformance(
        self.scope,
        constraint::Conformance {
          conformer: owner.as_self_instance(),
          interface: interface.into(),
          location: annotation.span,
        },
      );
    }
  }

  /// Declare the variable bound by `if let`, unwrapping the optional it is
  /// bound from.
  fn infer_let_unwrap(&mut self, unwrap: &ast::LetUnwrap, optional: types::InferenceResult) {
    let unwrapped = self.fresh(&unwrap.name);

    self
      .context
      .define_variable(self.scope, &unwrap.name, unwrapped.clone().into(), unwrap.span);

    self.context.extend(unwrap.id, self.scope, unwrapped.clone().into());

    self.constrain(constraint::Constraint::Unwrap(constraint::Unwrap {
      optional,
      result: unwrapped,
      location: unwrap.span,
    }));
  }
}

impl Visitor<types::InferenceResult> for InferenceVisitor<'_> {
  fn default_value(&mut self) -> types::InferenceResult {
    types::InferenceType::void().into()
  }

  fn visit_stmt(&mut self, stmt: &ast::Stmt) -> types::InferenceResult {
    match stmt {
      ast::Stmt::Expr(expr) => self.visit_expr(expr),
      _ => stmt.accept(self),
    }
  }

  fn visit_expr(&mut self, expr: &ast::Expr) -> types::InferenceResult {
    let result = expr.accept(self);

    self.context.extend(expr.id(), self.scope, result.clone());

    result
  }

  fn visit_module(&mut self, module: &ast::Module) -> types::InferenceResult {
    self.declare_names(&module.statements);

    for statement in &module.statements {
      self.visit_stmt(statement);
    }

    self.default_value()
  }

  fn visit_literal(&mut self, literal: &ast::Literal) -> types::InferenceResult {
    match literal.value {
      ast::LiteralValue::Int(..) => types::InferenceType::int(),
      ast::LiteralValue::String(..) => types::InferenceType::string(),
      ast::LiteralValue::Bool(..) => types::InferenceType::bool(),
      ast::LiteralValue::None => types::InferenceType::Base(types::Primitive::None),
    }
    .into()
  }

  fn visit_variable_ref(&mut self, reference: &ast::VariableRef) -> types::InferenceResult {
    match self.context.lookup_variable(self.scope, &reference.name) {
      Some(result) => result,
      None => {
        self.context.error(
          diagnostic::DiagnosticKind::UndefinedVariable(reference.name.clone()),
          reference.span,
        );

        types::InferenceType::Any.into()
      }
    }
  }

  fn visit_call(&mut self, call: &ast::Call) -> types::InferenceResult {
    let result = self.fresh("call");

    // A shorthand callee such as `.some` is looked up on the call's type.
    let expected = self
      .context
      .expectation_for(call.id)
      .unwrap_or_else(|| result.clone());

    self.context.push_expectation(call.callee.id(), expected);

    let callee = self.visit_expr(&call.callee);

    self.context.pop_expectation();

    let arguments = call
      .arguments
      .iter()
      .map(|argument| (argument.label.clone(), self.visit_expr(&argument.value)))
      .collect();

    self.constrain(constraint::Constraint::Call(constraint::Call {
      callee,
      arguments,
      result: result.clone(),
      location: call.span,
    }));

    result.into()
  }

  fn visit_member(&mut self, member: &ast::Member) -> types::InferenceResult {
    let result = self.fresh(&member.name);

    let receiver = match &member.receiver {
      Some(receiver) => self.visit_expr(receiver),
      None => match self.context.expectation_for(member.id) {
        Some(expected) => expected.into(),
        None => self.fresh("receiver").into(),
      },
    };

    self.constrain(constraint::Constraint::Member(constraint::Member {
      receiver,
      name: member.name.clone(),
      result: result.clone(),
      location: member.span,
    }));

    result.into()
  }

  fn visit_binary(&mut self, binary: &ast::Binary) -> types::InferenceResult {
    let lhs = self.visit_expr(&binary.lhs);
    let rhs = self.visit_expr(&binary.rhs);
    let result = self.fresh("infix");

    self.constrain(constraint::Constraint::Infix(constraint::Infix {
      lhs,
      rhs,
      operator: binary.operator,
      result: result.clone(),
      location: binary.span,
    }));

    result.into()
  }

  fn visit_unary(&mut self, unary: &ast::Unary) -> types::InferenceResult {
    let operand = self.visit_expr(&unary.operand);

    let ty = match unary.operator {
      ast::UnaryOperator::Not => types::InferenceType::bool(),
      ast::UnaryOperator::Negate => types::InferenceType::int(),
    };

    self.equate(operand, ty.clone(), unary.span);

    ty.into()
  }

  fn visit_closure(&mut self, closure: &ast::Function) -> types::InferenceResult {
    self.infer_function(closure, false)
  }

  fn visit_if_expr(&mut self, if_expr: &ast::IfExpr) -> types::InferenceResult {
    let condition = self.visit_expr(&if_expr.condition);

    self.equate(condition, types::InferenceType::bool(), if_expr.condition.span());

    let result = self.fresh("if");

    for block in [&if_expr.consequence, &if_expr.alternative] {
      let child = self.context.child_context(self.scope);
      let previous = self.enter(child);

      let value = self
        .infer_block(block)
        .unwrap_or_else(|| types::InferenceType::void().into());

      self.equate(result.clone(), value, block.span);
      self.scope = previous;
      self.hoist(child, Vec::new(), block.span);
    }

    result.into()
  }

  fn visit_subscript(&mut self, subscript: &ast::Subscript) -> types::InferenceResult {
    let receiver = self.visit_expr(&subscript.receiver);

    let arguments = subscript
      .arguments
      .iter()
      .map(|argument| self.visit_expr(argument))
      .collect();

    let result = self.fresh("element");

    self.constrain(constraint::Constraint::Subscript(constraint::Subscript {
      receiver,
      arguments,
      result: result.clone(),
      location: subscript.span,
    }));

    result.into()
  }

  fn visit_array(&mut self, array: &ast::ArrayLiteral) -> types::InferenceResult {
    let element = self.fresh("element");

    for value in &array.elements {
      let value_result = self.visit_expr(value);

      self.equate(element.clone(), value_result, value.span());
    }

    self.context.array_of(element).into()
  }

  fn visit_assignment(&mut self, assignment: &ast::Assignment) -> types::InferenceResult {
    let target = self.visit_expr(&assignment.target);
    let value = self.visit_expr(&assignment.value);

    self.equate(target, value, assignment.span);

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all, fields(name = %declaration.name))]
  fn visit_variable_decl(&mut self, declaration: &ast::VariableDecl) -> types::InferenceResult {
    let annotated = declaration
      .type_annotation
      .as_ref()
      .map(|annotation| self.resolve_annotation(annotation));

    let value = declaration.value.as_ref().map(|value| {
      if let Some(annotated) = &annotated {
        self.context.push_expectation(value.id(), annotated.clone());
      }

      let result = self.visit_expr(value);

      if annotated.is_some() {
        self.context.pop_expectation();
      }

      result
    });

    let result = match (annotated, value) {
      (Some(annotated), Some(value)) => {
        self.equate(annotated.clone(), value, declaration.span);

        annotated.into()
      }
      (Some(annotated), None) => annotated.into(),
      // Values keep their scheme, so that every use instantiates it anew.
      (None, Some(value)) => value,
      (None, None) => self.fresh(&declaration.name).into(),
    };

    self
      .context
      .define_variable(self.scope, &declaration.name, result.clone(), declaration.span);

    self.context.extend(declaration.id, self.scope, result.clone());

    result
  }

  fn visit_return(&mut self, return_: &ast::Return) -> types::InferenceResult {
    let value = match &return_.value {
      Some(value) => self.visit_expr(value),
      None => types::InferenceType::void().into(),
    };

    self.context.track_return(value);

    self.default_value()
  }

  fn visit_if(&mut self, if_: &ast::If) -> types::InferenceResult {
    match &if_.condition {
      ast::Condition::Boolean(condition) => {
        let condition_result = self.visit_expr(condition);

        self.equate(condition_result, types::InferenceType::bool(), condition.span());
        self.infer_branch(&if_.consequence);
      }
      ast::Condition::LetUnwrap(unwrap) => {
        let optional = match &unwrap.value {
          Some(value) => self.visit_expr(value),
          None => self.visit_variable_ref(&ast::VariableRef {
            id: unwrap.id,
            span: unwrap.span,
            name: unwrap.name.clone(),
          }),
        };

        // The unwrapped name only exists within the consequence.
        let child = self.context.child_context(self.scope);
        let previous = self.enter(child);

        self.infer_let_unwrap(unwrap, optional);
        self.infer_block(&if_.consequence);
        self.scope = previous;
        self.hoist(child, Vec::new(), if_.consequence.span);
      }
    }

    if let Some(alternative) = &if_.alternative {
      self.infer_branch(alternative);
    }

    self.default_value()
  }

  fn visit_while(&mut self, while_: &ast::While) -> types::InferenceResult {
    let condition = self.visit_expr(&while_.condition);

    self.equate(condition, types::InferenceType::bool(), while_.condition.span());
    self.infer_branch(&while_.body);

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all)]
  fn visit_match(&mut self, match_: &ast::Match) -> types::InferenceResult {
    let target = self.visit_expr(&match_.target).into_type();

    self.context.push_match_target(target.clone());

    let mut has_catch_all = false;

    for arm in &match_.arms {
      if has_catch_all {
        self
          .context
          .warning(diagnostic::DiagnosticKind::UnreachableArm, arm.span);
      }

      has_catch_all |= arm.pattern.is_none();

      let child = self.context.child_context(self.scope);
      let previous = self.enter(child);

      if let Some(pattern_expr) = &arm.pattern {
        let expected = self
          .context
          .match_target()
          .cloned()
          .unwrap_or_else(|| target.clone());

        let pattern = pattern::extract(self, pattern_expr, &expected);

        self.constrain(constraint::Constraint::Bind(constraint::Bind {
          target: target.clone(),
          pattern,
          location: arm.span,
        }));
      }

      self.infer_block(&arm.body);
      self.scope = previous;
      self.hoist(child, Vec::new(), arm.span);
    }

    self.context.pop_match_target();

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all, fields(name = ?function.name))]
  fn visit_function(&mut self, function: &ast::Function) -> types::InferenceResult {
    let result = self.infer_function(function, false);

    if let Some(name) = &function.name {
      self
        .context
        .define_variable(self.scope, name, result.clone(), function.span);
    }

    self.context.extend(function.id, self.scope, result);

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all, fields(name = %declaration.name))]
  fn visit_struct(&mut self, declaration: &ast::Struct) -> types::InferenceResult {
    let (owner, body) = self.shell(declaration.id);

    let struct_type = crate::assert_extract!(&owner, types::TypeOwner::Struct);
    let struct_type = Rc::clone(struct_type);
    let previous = self.enter(body);
    let mut property_types = Vec::new();

    for member in &declaration.members {
      match member {
        ast::StructMember::Property(property) => {
          let ty = match &property.type_annotation {
            Some(annotation) => self.resolve_annotation(annotation),
            None => self.fresh(&property.name),
          };

          if let Some(value) = &property.value {
            self.context.push_expectation(value.id(), ty.clone());

            let value_result = self.visit_expr(value);

            self.context.pop_expectation();
            self.equate(ty.clone(), value_result, property.span);
          }

          self.context.extend(property.id, body, ty.clone().into());
          property_types.push(ty.clone());

          let members = if property.is_static {
            &struct_type.static_members
          } else {
            &struct_type.properties
          };

          members
            .borrow_mut()
            .insert(property.name.clone(), ty.into());
        }
        ast::StructMember::Method(method) => {
          let result = self.infer_function(method, false);
          let name = method.name.clone().unwrap_or_default();

          self.context.extend(method.id, body, result.clone());

          let members = if method.is_static {
            &struct_type.static_members
          } else {
            &struct_type.methods
          };

          members.borrow_mut().insert(name, result);
        }
        ast::StructMember::Initializer(initializer) => {
          let result = self.infer_function(initializer, true);

          let labels = initializer
            .parameters
            .iter()
            .map(|parameter| format!("{}:", parameter.name))
            .collect::<String>();

          self.context.extend(initializer.id, body, result.clone());

          struct_type
            .initializers
            .borrow_mut()
            .insert(format!("init({})", labels), result);
        }
      }
    }

    self.scope = previous;
    self.infer_conformances(&owner, &declaration.conformances);

    // Properties stay pending until what their default values imply is known.
    let variables = property_types
      .iter()
      .flat_map(types::InferenceType::free_variables)
      .filter(|variable| !struct_type.type_parameters.contains(variable))
      .collect::<Vec<_>>();

    self.context.mark_pending(&variables, body);
    self.hoist(body, variables, declaration.span);

    self.context.extend(
      declaration.id,
      self.scope,
      types::InferenceType::StructType(struct_type).into(),
    );

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all, fields(name = %declaration.name))]
  fn visit_enum(&mut self, declaration: &ast::Enum) -> types::InferenceResult {
    let (owner, body) = self.shell(declaration.id);

    let enum_type = crate::assert_extract!(&owner, types::TypeOwner::Enum);
    let enum_type = Rc::clone(enum_type);
    let previous = self.enter(body);

    for case in &declaration.cases {
      let attached_types = case
        .attached_types
        .iter()
        .map(|annotation| self.resolve_annotation(annotation))
        .collect();

      enum_type
        .cases
        .borrow_mut()
        .insert(case.name.clone(), attached_types);
    }

    for method in &declaration.methods {
      let result = self.infer_function(method, false);
      let name = method.name.clone().unwrap_or_default();

      self.context.extend(method.id, body, result.clone());
      enum_type.methods.borrow_mut().insert(name, result);
    }

    self.scope = previous;
    self.infer_conformances(&owner, &declaration.conformances);

    self.context.extend(
      declaration.id,
      self.scope,
      types::InferenceType::EnumType(enum_type).into(),
    );

    self.default_value()
  }

  #[tracing::instrument(level = "trace", skip_all, fields(name = %declaration.name))]
  fn visit_interface(&mut self, declaration: &ast::Interface) -> types::InferenceResult {
    let (owner, body) = self.shell(declaration.id);

    let interface_type = crate::assert_extract!(&owner, types::TypeOwner::Interface);
    let interface_type = Rc::clone(interface_type);
    let previous = self.enter(body);

    for requirement in &declaration.requirements {
      let (name, ty) = match requirement {
        ast::Requirement::Property {
          name,
          type_annotation,
          ..
        } => (name, self.resolve_annotation(type_annotation)),
        ast::Requirement::Method {
          name,
          parameters,
          return_type,
          ..
        } => {
          let parameters = parameters
            .iter()
            .map(|parameter| match &parameter.type_annotation {
              Some(annotation) => self.resolve_annotation(annotation),
              None => self.fresh(&parameter.name),
            })
            .collect();

          let return_type = match return_type {
            Some(annotation) => self.resolve_annotation(annotation),
            None => types::InferenceType::void(),
          };

          (name, types::InferenceType::function(parameters, return_type))
        }
      };

      interface_type
        .requirements
        .borrow_mut()
        .insert(name.clone(), ty.into());
    }

    self.scope = previous;

    self.context.extend(
      declaration.id,
      self.scope,
      types::InferenceType::InterfaceType(interface_type).into(),
    );

    self.default_value()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config;
  use pretty_assertions::assert_eq;

  fn infer(module: &ast::Module) -> context::InferenceContext {
    let mut context =
      context::InferenceContext::new(&module.name, config::InferenceConfig::default());

    InferenceVisitor::new(&mut context).visit_module(module);
    context.solve().solve_deferred();

    context
  }

  fn type_of(context: &context::InferenceContext, node: ast::NodeId) -> String {
    context
      .type_of(node)
      .map(|result| result.to_string())
      .unwrap_or_default()
  }

  #[test]
  fn literals() {
    let mut builder = ast::Builder::default();
    let int = builder.int(1);
    let string = builder.string("hi");
    let boolean = builder.bool(true);
    let ids = [int.id(), string.id(), boolean.id()];

    let statements = vec![builder.expr(int), builder.expr(string), builder.expr(boolean)];
    let module = builder.module("test", statements);
    let context = infer(&module);

    assert_eq!(
      vec!["int", "String", "bool"],
      ids.iter().map(|id| type_of(&context, *id)).collect::<Vec<_>>()
    );
  }

  #[test]
  fn walking_only_queues_constraints() {
    let mut builder = ast::Builder::default();
    let one = builder.int(1);
    let two = builder.int(2);
    let sum = builder.binary(one, ast::BinaryOperator::Plus, two);
    let sum_id = sum.id();
    let statement = builder.expr(sum);
    let module = builder.module("test", vec![statement]);
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());

    InferenceVisitor::new(&mut context).visit_module(&module);

    assert!(type_of(&context, sum_id).starts_with("infix"));

    context.solve();

    assert_eq!("int", type_of(&context, sum_id));
  }

  #[test]
  fn annotated_parameters_flow_into_the_return_type() {
    let mut builder = ast::Builder::default();
    let int = builder.ty("int");
    let x = builder.param("x", Some(int));
    let reference = builder.reference("x");
    let one = builder.int(1);
    let sum = builder.binary(reference, ast::BinaryOperator::Plus, one);
    let body = builder.expr(sum);
    let function = builder.func("increment", vec![x], None, vec![body]);
    let function_id = function.id();
    let module = builder.module("test", vec![function]);
    let context = infer(&module);

    assert_eq!("(int) -> int", type_of(&context, function_id));
    assert!(context.diagnostics().is_empty());
  }

  #[test]
  fn unknown_annotations_are_reported() {
    let mut builder = ast::Builder::default();
    let annotation = builder.ty("Nope");
    let value = builder.int(1);
    let declaration = builder.var_stmt("x", Some(annotation), Some(value));
    let module = builder.module("test", vec![declaration]);
    let context = infer(&module);

    assert_eq!(
      vec![&diagnostic::DiagnosticKind::UndefinedType("Nope".to_string())],
      context
        .diagnostics()
        .iter()
        .map(|diagnostic| &diagnostic.kind)
        .collect::<Vec<_>>()
    );
  }

  #[test]
  fn array_literals_share_an_element_type() {
    let mut builder = ast::Builder::default();
    let one = builder.int(1);
    let two = builder.int(2);
    let array = builder.array(vec![one, two]);
    let declaration = builder.let_stmt("numbers", array);
    let declaration_id = declaration.id();
    let index = builder.int(0);
    let numbers = builder.reference("numbers");
    let subscript = builder.subscript(numbers, vec![index]);
    let subscript_id = subscript.id();
    let statement = builder.expr(subscript);
    let module = builder.module("test", vec![declaration, statement]);
    let context = infer(&module);

    assert_eq!("Array<int>", type_of(&context, declaration_id));
    assert_eq!("int", type_of(&context, subscript_id));
  }

  #[test]
  fn if_expressions_unify_their_branches() {
    let mut builder = ast::Builder::default();
    let condition = builder.bool(true);
    let one = builder.int(1);
    let two = builder.int(2);
    let consequence = builder.expr(one);
    let alternative = builder.expr(two);
    let if_expr = builder.if_expr(condition, vec![consequence], vec![alternative]);
    let if_id = if_expr.id();
    let statement = builder.expr(if_expr);
    let module = builder.module("test", vec![statement]);
    let context = infer(&module);

    assert_eq!("int", type_of(&context, if_id));
  }

  #[test]
  fn struct_members_resolve_through_self() {
    let mut builder = ast::Builder::default();
    let int = builder.ty("int");
    let property = builder.property("count", Some(int), None);
    let receiver = builder.reference("self");
    let access = builder.member(receiver, "count");
    let body = builder.ret(Some(access));
    let method = builder.method("current", Vec::new(), None, vec![body]);
    let declaration = builder.struct_decl("Counter", &[], Vec::new(), vec![property, method]);
    let zero = builder.int(0);
    let argument = builder.labeled("count", zero);
    let counter = builder.reference("Counter");
    let construct = builder.call(counter, vec![argument]);
    let current = builder.member(construct, "current");
    let call = builder.call(current, Vec::new());
    let call_id = call.id();
    let statement = builder.expr(call);
    let module = builder.module("test", vec![declaration, statement]);
    let context = infer(&module);

    assert_eq!("int", type_of(&context, call_id));
    assert!(context.diagnostics().is_empty());
  }
}
