use crate::ast;

macro_rules! define_visit_fn {
  ($method_name:ident, $type_name:ty) => {
    fn $method_name(&mut self, _item: &$type_name) -> T {
      self.default_value()
    }
  };
}

/// One method per syntax node kind. Unhandled kinds produce the visitor's
/// default value.
pub trait Visitor<T = ()> {
  fn default_value(&mut self) -> T;

  fn visit_stmt(&mut self, stmt: &ast::Stmt) -> T
  where
    Self: Sized,
  {
    stmt.accept(self)
  }

  fn visit_expr(&mut self, expr: &ast::Expr) -> T
  where
    Self: Sized,
  {
    expr.accept(self)
  }

  define_visit_fn!(visit_module, ast::Module);
  define_visit_fn!(visit_literal, ast::Literal);
  define_visit_fn!(visit_variable_ref, ast::VariableRef);
  define_visit_fn!(visit_call, ast::Call);
  define_visit_fn!(visit_member, ast::Member);
  define_visit_fn!(visit_binary, ast::Binary);
  define_visit_fn!(visit_unary, ast::Unary);
  define_visit_fn!(visit_closure, ast::Function);
  define_visit_fn!(visit_if_expr, ast::IfExpr);
  define_visit_fn!(visit_subscript, ast::Subscript);
  define_visit_fn!(visit_array, ast::ArrayLiteral);
  define_visit_fn!(visit_assignment, ast::Assignment);
  define_visit_fn!(visit_variable_decl, ast::VariableDecl);
  define_visit_fn!(visit_return, ast::Return);
  define_visit_fn!(visit_if, ast::If);
  define_visit_fn!(visit_while, ast::While);
  define_visit_fn!(visit_match, ast::Match);
  define_visit_fn!(visit_function, ast::Function);
  define_visit_fn!(visit_struct, ast::Struct);
  define_visit_fn!(visit_enum, ast::Enum);
  define_visit_fn!(visit_interface, ast::Interface);
}

pub trait Visitable {
  /// Visit the node itself. Whether its children are visited is up to the
  /// visitor.
  fn accept<T>(&self, visitor: &mut dyn Visitor<T>) -> T;
}

impl Visitable for ast::Module {
  fn accept<T>(&self, visitor: &mut dyn Visitor<T>) -> T {
    visitor.visit_module(self)
  }
}

impl Visitable for ast::Stmt {
  fn accept<T>(&self, visitor: &mut dyn Visitor<T>) -> T {
    match self {
      ast::Stmt::Expr(expr) => expr.accept(visitor),
      ast::Stmt::Variable(declaration) => visitor.visit_variable_decl(declaration),
      ast::Stmt::Return(return_) => visitor.visit_return(return_),
      ast::Stmt::If(if_) => visitor.visit_if(if_),
      ast::Stmt::While(while_) => visitor.visit_while(while_),
      ast::Stmt::Match(match_) => visitor.visit_match(match_),
      ast::Stmt::Function(function) => visitor.visit_function(function),
      ast::Stmt::Struct(struct_) => visitor.visit_struct(struct_),
      ast::Stmt::Enum(enum_) => visitor.visit_enum(enum_),
      ast::Stmt::Interface(interface) => visitor.visit_interface(interface),
    }
  }
}

impl Visitable for ast::Expr {
  fn accept<T>(&self, visitor: &mut dyn Visitor<T>) -> T {
    match self {
      ast::Expr::Literal(literal) => visitor.visit_literal(literal),
      ast::Expr::Variable(reference) => visitor.visit_variable_ref(reference),
      ast::Expr::Call(call) => visitor.visit_call(call),
      ast::Expr::Member(member) => visitor.visit_member(member),
      ast::Expr::Binary(binary) => visitor.visit_binary(binary),
      ast::Expr::Unary(unary) => visitor.visit_unary(unary),
      ast::Expr::Closure(closure) => visitor.visit_closure(closure),
      ast::Expr::If(if_) => visitor.visit_if_expr(if_),
      ast::Expr::Subscript(subscript) => visitor.visit_subscript(subscript),
      ast::Expr::Array(array) => visitor.visit_array(array),
      ast::Expr::Assignment(assignment) => visitor.visit_assignment(assignment),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  /// Counts the literals reachable through calls.
  struct LiteralCounter;

  impl Visitor<usize> for LiteralCounter {
    fn default_value(&mut self) -> usize {
      0
    }

    fn visit_literal(&mut self, _literal: &ast::Literal) -> usize {
      1
    }

    fn visit_call(&mut self, call: &ast::Call) -> usize {
      let arguments = call
        .arguments
        .iter()
        .map(|argument| self.visit_expr(&argument.value))
        .sum::<usize>();

      self.visit_expr(&call.callee) + arguments
    }
  }

  #[test]
  fn dispatches_by_node_kind() {
    let mut builder = ast::Builder::default();
    let callee = builder.reference("f");
    let first = builder.int(1);
    let second = builder.string("two");
    let call = builder.call_with(callee, vec![first, second]);
    let statement = builder.expr(call);

    assert_eq!(2, LiteralCounter.visit_stmt(&statement));
  }
}
