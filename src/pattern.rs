//! Classification of `match` arm patterns.

use crate::{ast, inference, types, visit::Visitor};

/// Turn the syntax of a pattern into a [`types::Pattern`] that matches values
/// of the `expected` type.
///
/// Bare names bind fresh variables in the current context. Call-shaped
/// patterns recurse into their arguments, which are aligned with the case's
/// attached types once the pattern is bound. Anything else is an ordinary
/// expression matched by value.
pub(crate) fn extract(
  visitor: &mut inference::InferenceVisitor<'_>,
  expr: &ast::Expr,
  expected: &types::InferenceType,
) -> types::Pattern {
  match expr {
    ast::Expr::Variable(reference) => {
      let ty = visitor.fresh(&reference.name);
      let scope = visitor.scope;

      visitor
        .context
        .define_variable(scope, &reference.name, ty.clone().into(), reference.span);

      visitor.context.extend(reference.id, scope, ty.clone().into());

      types::Pattern {
        ty,
        kind: types::PatternKind::Variable(reference.name.clone()),
      }
    }
    ast::Expr::Call(call) => {
      visitor
        .context
        .push_expectation(call.callee.id(), expected.clone());

      let callee = visitor.visit_expr(&call.callee).into_type();

      visitor.context.pop_expectation();

      let arguments = call
        .arguments
        .iter()
        .map(|argument| {
          let argument_type = visitor.fresh("pattern");

          extract(visitor, &argument.value, &argument_type)
        })
        .collect();

      let scope = visitor.scope;

      visitor
        .context
        .extend(call.id, scope, expected.clone().into());

      types::Pattern {
        ty: expected.clone(),
        kind: types::PatternKind::Call { callee, arguments },
      }
    }
    _ => {
      visitor.context.push_expectation(expr.id(), expected.clone());

      let ty = visitor.visit_expr(expr).into_type();

      visitor.context.pop_expectation();

      types::Pattern {
        ty,
        kind: types::PatternKind::Value,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{config, context};
  use pretty_assertions::assert_eq;

  #[test]
  fn classifies_pattern_syntax() {
    let mut context = context::InferenceContext::new("test", config::InferenceConfig::default());
    let mut builder = ast::Builder::default();
    let literal = builder.int(1);
    let name = builder.reference("a");
    let callee = builder.dot("foo");
    let inner = builder.reference("b");
    let call = builder.call_with(callee, vec![inner]);
    let mut visitor = inference::InferenceVisitor::new(&mut context);
    let expected = visitor.fresh("target");

    let literal = extract(&mut visitor, &literal, &expected);
    let name = extract(&mut visitor, &name, &expected);
    let call = extract(&mut visitor, &call, &expected);

    assert_eq!(types::PatternKind::Value, literal.kind);
    assert_eq!(types::InferenceType::int(), literal.ty);
    assert_eq!(types::PatternKind::Variable("a".to_string()), name.kind);
    assert_eq!(expected, call.ty);
    assert_eq!(1, call.values().len());

    assert_eq!(
      types::PatternKind::Variable("b".to_string()),
      call.values()[0].kind
    );

    let root = visitor.scope;

    assert!(visitor.context.lookup_variable(root, "a").is_some());
    assert!(visitor.context.lookup_variable(root, "b").is_some());
  }
}
