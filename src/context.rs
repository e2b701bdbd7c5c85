//! The inference context is an arena of lexical contexts addressed by
//! [`ContextId`] handles. Every context owns its named-variable table and its
//! own substitution table; everything else (the variable counter, the
//! constraint queues, diagnostics and the node table) is shared by the whole
//! run and lives on the arena itself.
//!
//! A context sees its own substitutions and those of its ancestors, never those
//! of its children or siblings. Data only flows upwards through explicit hoists.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::{ast, auxiliary, builtins, config, constraint, diagnostic, solver, types};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

#[derive(Debug, Default)]
pub(crate) struct Scope {
  pub parent: Option<ContextId>,
  pub children: Vec<ContextId>,
  pub names: indexmap::IndexMap<String, types::InferenceResult>,
  pub substitutions: types::Substitutions,
  /// Variables minted while this context was the current one.
  pub variables: BTreeSet<types::VariableId>,
  /// Queued constraints that are to be solved against this context.
  pub outstanding: usize,
}

/// A read-only snapshot of a completed module's top-level names, with
/// substitutions already applied.
#[derive(Debug, Clone)]
pub struct Exports {
  pub module: String,
  pub names: indexmap::IndexMap<String, types::InferenceResult>,
}

pub struct InferenceContext {
  pub(crate) run: types::RunId,
  pub(crate) module: String,
  pub(crate) config: config::InferenceConfig,
  pub(crate) builtins: Option<builtins::Builtins>,
  next_variable: usize,
  scopes: Vec<Scope>,
  root: ContextId,
  imports: Vec<Exports>,
  /// Every annotated syntax node, along with the context its result must be
  /// resolved against.
  nodes: HashMap<ast::NodeId, (ContextId, types::InferenceResult)>,
  pub(crate) diagnostics: diagnostic::DiagnosticsHelper,
  pub(crate) queue: VecDeque<solver::Queued>,
  pub(crate) deferred: Vec<solver::Queued>,
  /// Quantified variables of declarations whose bodies have not been hoisted
  /// yet, along with the body context they are waiting on.
  pub(crate) pending: BTreeMap<types::VariableId, ContextId>,
  /// Number of queued constraints that have been settled so far, solved or
  /// exhausted.
  pub(crate) settled: usize,
  /// Interface conformance checks already scheduled, by owner and interface name.
  pub(crate) scheduled_conformances: BTreeSet<(String, String)>,
  placeholders: HashMap<types::VariableId, types::InferenceResult>,
  returns: Vec<Vec<types::InferenceResult>>,
  expectations: Vec<(ast::NodeId, types::InferenceType)>,
  match_targets: Vec<types::InferenceType>,
}

impl InferenceContext {
  pub fn new(module: &str, config: config::InferenceConfig) -> Self {
    let mut context = Self {
      run: auxiliary::next_run_id(),
      module: module.to_string(),
      builtins: None,
      next_variable: 0,
      scopes: vec![Scope::default()],
      root: ContextId(0),
      imports: Vec::new(),
      nodes: HashMap::new(),
      diagnostics: diagnostic::DiagnosticsHelper::default(),
      queue: VecDeque::new(),
      deferred: Vec::new(),
      pending: BTreeMap::new(),
      settled: 0,
      scheduled_conformances: BTreeSet::new(),
      placeholders: HashMap::new(),
      returns: Vec::new(),
      expectations: Vec::new(),
      match_targets: Vec::new(),
      config,
    };

    // The prelude lives in its own context, above the module's root, so that
    // module declarations may shadow it and exports never include it.
    let prelude = context.root;

    if context.config.prelude {
      context.builtins = Some(builtins::register(&mut context, prelude));
    }

    context.root = context.child_context(prelude);

    context
  }

  /// Attach snapshots of other modules; names that miss locally are looked up
  /// in them, in order.
  pub fn with_imports(mut self, imports: &[&InferenceContext]) -> Self {
    self
      .imports
      .extend(imports.iter().map(|import| import.exports()));

    self
  }

  pub fn import(&mut self, exports: Exports) {
    self.imports.push(exports);
  }

  pub fn module(&self) -> &str {
    &self.module
  }

  /// The module's top-level context.
  pub fn root(&self) -> ContextId {
    self.root
  }

  pub(crate) fn scope(&self, id: ContextId) -> &Scope {
    self.scopes.get(id.0).expect(auxiliary::BUG_CONTEXT_HANDLE)
  }

  pub(crate) fn scope_mut(&mut self, id: ContextId) -> &mut Scope {
    self.scopes.get_mut(id.0).expect(auxiliary::BUG_CONTEXT_HANDLE)
  }

  pub fn parent_of(&self, id: ContextId) -> Option<ContextId> {
    self.scope(id).parent
  }

  pub fn child_context(&mut self, parent: ContextId) -> ContextId {
    let id = ContextId(self.scopes.len());

    self.scopes.push(Scope {
      parent: Some(parent),
      ..Scope::default()
    });

    self.scope_mut(parent).children.push(id);

    id
  }

  /// The contexts to consult for `id`, starting with itself and ending at the
  /// prelude.
  pub(crate) fn chain(&self, id: ContextId) -> impl Iterator<Item = ContextId> + '_ {
    std::iter::successors(Some(id), move |current| self.scope(*current).parent)
  }

  pub fn fresh_type_variable(&mut self, scope: ContextId, label: &str) -> types::TypeVariable {
    let id = types::VariableId {
      run: self.run,
      index: self.next_variable,
    };

    self.next_variable += 1;
    self.scope_mut(scope).variables.insert(id);

    types::TypeVariable::new(id, label)
  }

  pub(crate) fn owns(&self, scope: ContextId, variable: &types::TypeVariable) -> bool {
    self.scope(scope).variables.contains(&variable.id)
  }

  /// Whether the variable was minted in the given context or any of its
  /// descendants.
  pub(crate) fn owns_within(&self, scope: ContextId, variable: &types::TypeVariable) -> bool {
    self.owns(scope, variable)
      || self
        .scope(scope)
        .children
        .iter()
        .any(|child| self.owns_within(*child, variable))
  }

  pub fn define_variable(
    &mut self,
    scope: ContextId,
    name: &str,
    result: types::InferenceResult,
    at: ast::Span,
  ) {
    let existing = self.scope(scope).names.get(name).cloned();

    match existing {
      Some(types::InferenceResult::Type(types::InferenceType::Placeholder(placeholder))) => {
        tracing::debug!(name, "resolving placeholder {:?}", placeholder);

        if let types::InferenceResult::Type(ty) = &result {
          self.bind(scope, placeholder.clone(), ty.clone());
        }

        self.placeholders.insert(placeholder.id, result.clone());
      }
      Some(..) => {
        self.error(
          diagnostic::DiagnosticKind::InvalidRedeclaration(name.to_string()),
          at,
        );

        return;
      }
      None => {}
    }

    self
      .scope_mut(scope)
      .names
      .insert(name.to_string(), result);
  }

  pub fn lookup_variable(&self, scope: ContextId, name: &str) -> Option<types::InferenceResult> {
    for id in self.chain(scope) {
      if let Some(result) = self.scope(id).names.get(name) {
        return Some(result.clone());
      }
    }

    self
      .imports
      .iter()
      .find_map(|import| import.names.get(name).cloned())
  }

  /// Replace a placeholder that has since been defined with its definition.
  pub(crate) fn resolve_placeholder(
    &self,
    scope: ContextId,
    result: &types::InferenceResult,
  ) -> types::InferenceResult {
    let mut current = result.clone();

    // Each hop resolves a distinct placeholder, so the number of hops is bounded
    // by the number of placeholders.
    for _ in 0..=self.placeholders.len() {
      let variable = match &current {
        types::InferenceResult::Type(ty) => match self.apply(scope, ty) {
          types::InferenceType::Placeholder(variable) => variable,
          _ => return current,
        },
        types::InferenceResult::Scheme(..) => return current,
      };

      match self.placeholders.get(&variable.id) {
        Some(definition) => current = definition.clone(),
        None => return current,
      }
    }

    current
  }

  /// Find the substitution of a variable, as seen from the given context.
  pub(crate) fn lookup_substitution(
    &self,
    scope: ContextId,
    variable: &types::TypeVariable,
  ) -> Option<&types::InferenceType> {
    self
      .chain(scope)
      .find_map(|id| self.scope(id).substitutions.get(variable))
  }

  pub(crate) fn bind(
    &mut self,
    scope: ContextId,
    variable: types::TypeVariable,
    ty: types::InferenceType,
  ) {
    tracing::trace!("{:?} := {}", variable, ty);

    self.scope_mut(scope).substitutions.insert(variable, ty);
  }

  pub(crate) fn error(&mut self, kind: diagnostic::DiagnosticKind, at: ast::Span) {
    self.report(diagnostic::Diagnostic::error(kind, at));
  }

  pub(crate) fn warning(&mut self, kind: diagnostic::DiagnosticKind, at: ast::Span) {
    self.report(diagnostic::Diagnostic::warning(kind, at));
  }

  pub(crate) fn report(&mut self, diagnostic: diagnostic::Diagnostic) {
    tracing::debug!("diagnostic: {}", diagnostic.message());

    self.diagnostics.add_one(diagnostic);
  }

  pub fn diagnostics(&self) -> &[diagnostic::Diagnostic] {
    &self.diagnostics.diagnostics
  }

  pub fn errors(&self) -> Vec<&diagnostic::Diagnostic> {
    self
      .diagnostics
      .diagnostics
      .iter()
      .filter(|diagnostic| diagnostic.is_error())
      .collect()
  }

  /// Succeeds when inference reported no errors.
  pub fn check(&self) -> diagnostic::Maybe {
    self.diagnostics.check()
  }

  /// Annotate a syntax node with its result.
  pub fn extend(&mut self, node: ast::NodeId, scope: ContextId, result: types::InferenceResult) {
    self.nodes.insert(node, (scope, result));
  }

  /// The result of a syntax node, exactly as it was recorded during the walk.
  pub fn raw_result_of(&self, node: ast::NodeId) -> Option<&types::InferenceResult> {
    self.nodes.get(&node).map(|(_, result)| result)
  }

  /// The resolved result of a syntax node.
  pub fn type_of(&self, node: ast::NodeId) -> Option<types::InferenceResult> {
    let (scope, result) = self.nodes.get(&node)?;
    let result = self.resolve_placeholder(*scope, result);

    Some(self.apply_substitutions(*scope, &result))
  }

  pub fn start_tracking_returns(&mut self) {
    self.returns.push(Vec::new());
  }

  /// Record a `return`. Returns outside of any callable body are ignored.
  pub fn track_return(&mut self, result: types::InferenceResult) {
    if let Some(returns) = self.returns.last_mut() {
      returns.push(result);
    }
  }

  pub fn finish_tracking_returns(&mut self) -> Vec<types::InferenceResult> {
    self.returns.pop().expect(auxiliary::BUG_RETURN_TRACKING)
  }

  /// Hint the type a specific node is expected to have.
  pub(crate) fn push_expectation(&mut self, node: ast::NodeId, ty: types::InferenceType) {
    self.expectations.push((node, ty));
  }

  pub(crate) fn pop_expectation(&mut self) {
    self.expectations.pop().expect(auxiliary::BUG_HINT_STACK);
  }

  pub(crate) fn expectation_for(&self, node: ast::NodeId) -> Option<types::InferenceType> {
    self
      .expectations
      .iter()
      .rev()
      .find(|(expected_node, _)| *expected_node == node)
      .map(|(_, ty)| ty.clone())
  }

  pub(crate) fn push_match_target(&mut self, ty: types::InferenceType) {
    self.match_targets.push(ty);
  }

  pub(crate) fn pop_match_target(&mut self) {
    self.match_targets.pop().expect(auxiliary::BUG_HINT_STACK);
  }

  pub(crate) fn match_target(&self) -> Option<&types::InferenceType> {
    self.match_targets.last()
  }

  /// Number of queued constraints belonging to a context or any of its
  /// descendants.
  pub(crate) fn subtree_outstanding(&self, scope: ContextId) -> usize {
    let node = self.scope(scope);

    node.outstanding
      + node
        .children
        .iter()
        .map(|child| self.subtree_outstanding(*child))
        .sum::<usize>()
  }

  /// Whether instantiating this result now would miss information that a
  /// pending hoist is about to provide. Code within a declaration's own body
  /// never waits on that declaration.
  pub(crate) fn is_pending(&self, scope: ContextId, result: &types::InferenceResult) -> bool {
    if self.pending.is_empty() {
      return false;
    }

    let result = self.resolve_placeholder(scope, result);

    self
      .apply_substitutions(scope, &result)
      .as_type()
      .free_variables()
      .iter()
      .filter_map(|variable| self.pending.get(&variable.id))
      .any(|body| !self.chain(scope).any(|id| id == *body))
  }

  pub(crate) fn mark_pending(&mut self, variables: &[types::TypeVariable], body: ContextId) {
    self
      .pending
      .extend(variables.iter().map(|variable| (variable.id, body)));
  }

  pub(crate) fn release_pending(&mut self, variables: &[types::TypeVariable]) {
    for variable in variables {
      self.pending.remove(&variable.id);
    }
  }

  /// Schedule a conformance check unless the same pair was already scheduled.
  pub(crate) fn schedule_conformance(
    &mut self,
    scope: ContextId,
    conformance: constraint::Conformance,
  ) {
    let key = match conformance.key(self, scope) {
      Some(key) => key,
      None => return,
    };

    if self.scheduled_conformances.insert(key) {
      self.defer_constraint(scope, constraint::Constraint::Conformance(conformance));
    }
  }

  /// Snapshot the module's top-level names for importing into another run.
  pub fn exports(&self) -> Exports {
    let root = self.root;

    let names = self
      .scope(root)
      .names
      .iter()
      .map(|(name, result)| {
        let result = self.resolve_placeholder(root, result);

        let result = match self.apply_substitutions(root, &result) {
          // Context handles mean nothing to the importing run.
          types::InferenceResult::Scheme(scheme) => types::InferenceResult::Scheme(types::Scheme {
            body: None,
            ..scheme
          }),
          result => result,
        };

        (name.clone(), result)
      })
      .collect();

    Exports {
      module: self.module.clone(),
      names,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn new_context() -> InferenceContext {
    InferenceContext::new("test", config::InferenceConfig::default())
  }

  fn span() -> ast::Span {
    ast::Span::default()
  }

  #[test]
  fn fresh_variables_are_unique() {
    let mut context = new_context();
    let root = context.root();
    let a = context.fresh_type_variable(root, "a");
    let b = context.fresh_type_variable(root, "a");

    assert!(a != b);
    assert!(b.is_newer_than(&a));
    assert!(context.owns(root, &a));
  }

  #[test]
  fn runs_do_not_share_variables() {
    let mut first = new_context();
    let mut second = new_context();
    let first_root = first.root();
    let second_root = second.root();

    let a = first.fresh_type_variable(first_root, "a");
    let b = second.fresh_type_variable(second_root, "a");

    assert!(a != b);
  }

  #[test]
  fn child_sees_parent_names_but_not_vice_versa() {
    let mut context = new_context();
    let root = context.root();
    let child = context.child_context(root);

    context.define_variable(root, "x", types::InferenceType::int().into(), span());
    context.define_variable(child, "y", types::InferenceType::bool().into(), span());

    assert_eq!(
      Some(types::InferenceType::int().into()),
      context.lookup_variable(child, "x")
    );

    assert_eq!(None, context.lookup_variable(root, "y"));
    assert_eq!(Some(root), context.parent_of(child));
  }

  #[test]
  fn redeclaration_in_same_scope_is_reported() {
    let mut context = new_context();
    let root = context.root();

    context.define_variable(root, "x", types::InferenceType::int().into(), span());
    context.define_variable(root, "x", types::InferenceType::bool().into(), span());

    assert_eq!(1, context.diagnostics().len());

    assert_eq!(
      diagnostic::DiagnosticKind::InvalidRedeclaration("x".to_string()),
      context.diagnostics()[0].kind
    );

    assert_eq!(
      Some(types::InferenceType::int().into()),
      context.lookup_variable(root, "x")
    );
  }

  #[test]
  fn shadowing_in_child_scope_is_allowed() {
    let mut context = new_context();
    let root = context.root();
    let child = context.child_context(root);

    context.define_variable(root, "x", types::InferenceType::int().into(), span());
    context.define_variable(child, "x", types::InferenceType::bool().into(), span());

    assert!(context.diagnostics().is_empty());

    assert_eq!(
      Some(types::InferenceType::bool().into()),
      context.lookup_variable(child, "x")
    );
  }

  #[test]
  fn defining_a_placeholder_resolves_it() {
    let mut context = new_context();
    let root = context.root();
    let placeholder = context.fresh_type_variable(root, "later");
    let placeholder_type = types::InferenceType::Placeholder(placeholder);

    context.define_variable(root, "later", placeholder_type.clone().into(), span());
    context.define_variable(root, "later", types::InferenceType::int().into(), span());

    assert!(context.diagnostics().is_empty());

    assert_eq!(
      types::InferenceResult::Type(types::InferenceType::int()),
      context.resolve_placeholder(root, &placeholder_type.into())
    );
  }

  #[test]
  fn return_tracking_nests() {
    let mut context = new_context();

    context.start_tracking_returns();
    context.track_return(types::InferenceType::int().into());
    context.start_tracking_returns();
    context.track_return(types::InferenceType::bool().into());

    assert_eq!(
      vec![types::InferenceResult::Type(types::InferenceType::bool())],
      context.finish_tracking_returns()
    );

    assert_eq!(
      vec![types::InferenceResult::Type(types::InferenceType::int())],
      context.finish_tracking_returns()
    );
  }

  #[test]
  fn expectations_are_keyed_by_node() {
    let mut context = new_context();

    context.push_expectation(ast::NodeId(1), types::InferenceType::int());

    assert_eq!(
      Some(types::InferenceType::int()),
      context.expectation_for(ast::NodeId(1))
    );

    assert_eq!(None, context.expectation_for(ast::NodeId(2)));
    context.pop_expectation();
    assert_eq!(None, context.expectation_for(ast::NodeId(1)));
  }

  #[test]
  fn imports_are_consulted_after_local_names() {
    let mut library = new_context();
    let library_root = library.root();

    library.define_variable(
      library_root,
      "answer",
      types::InferenceType::int().into(),
      span(),
    );

    let context = new_context().with_imports(&[&library]);

    assert_eq!(
      Some(types::InferenceType::int().into()),
      context.lookup_variable(context.root(), "answer")
    );
  }

  #[test]
  fn declarations_do_not_wait_on_themselves() {
    let mut context = new_context();
    let root = context.root();
    let body = context.child_context(root);
    let nested = context.child_context(body);
    let variable = context.fresh_type_variable(body, "return");
    let result = types::InferenceResult::Type(types::InferenceType::Variable(variable.clone()));

    context.mark_pending(&[variable.clone()], body);

    assert!(context.is_pending(root, &result));
    assert!(!context.is_pending(nested, &result));

    context.release_pending(&[variable]);

    assert!(!context.is_pending(root, &result));
  }
}
