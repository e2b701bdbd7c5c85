#![deny(rust_2018_idioms)]

pub mod ast;
mod auxiliary;
pub mod builtins;
pub mod config;
pub mod constraint;
pub mod context;
pub mod diagnostic;
mod inference;
pub mod instantiation;
mod pattern;
pub mod solver;
pub mod substitution;
pub mod types;
pub mod unification;
pub mod visit;

use visit::Visitor;

/// Infer the types of a whole module.
///
/// Names that are neither declared by the module nor by the prelude are looked
/// up in the top-level names of each context in `imports`. Diagnostics are
/// accumulated on the returned context rather than aborting the run; use
/// [`context::InferenceContext::check`] to turn them into a result.
pub fn check_module(
  module: &ast::Module,
  imports: &[&context::InferenceContext],
  config: config::InferenceConfig,
) -> context::InferenceContext {
  let mut context = context::InferenceContext::new(&module.name, config).with_imports(imports);

  tracing::debug!(module = %module.name, imports = imports.len(), "inferring");

  inference::InferenceVisitor::new(&mut context).visit_module(module);
  context.solve().solve_deferred();

  tracing::debug!(
    module = %module.name,
    diagnostics = context.diagnostics().len(),
    "inferred"
  );

  context
}
