//! The work queue that drives constraint solving.
//!
//! Constraints are solved in the order they were enqueued. A constraint that
//! reports being blocked is appended again. Its retry counter only grows when
//! nothing was settled since its previous attempt, so chains of dependent
//! constraints of any length get through as long as the queue keeps moving.
//! Once the counter reaches the cap configured for its kind, the constraint's
//! exhaustion behavior settles it. The queue enforces the cap, constraints
//! themselves never count their attempts.

use crate::{constraint, context};

#[derive(Debug)]
pub(crate) struct Queued {
  pub context: context::ContextId,
  pub retries: usize,
  /// How many constraints had been settled when this one was last attempted.
  pub seen: usize,
  pub constraint: constraint::Constraint,
}

impl context::InferenceContext {
  /// Enqueue a constraint for the main solving pass.
  pub fn add_constraint(&mut self, scope: context::ContextId, constraint: constraint::Constraint) {
    self.enqueue(Queued {
      context: scope,
      retries: 0,
      seen: self.settled,
      constraint,
    });
  }

  /// Enqueue a constraint for after the main pass has reached a fixpoint.
  pub fn defer_constraint(
    &mut self,
    scope: context::ContextId,
    constraint: constraint::Constraint,
  ) {
    self.deferred.push(Queued {
      context: scope,
      retries: 0,
      seen: self.settled,
      constraint,
    });
  }

  /// Drain the queue until it is empty.
  pub fn solve(&mut self) -> &mut Self {
    while let Some(queued) = self.queue.pop_front() {
      self.step(queued);
    }

    self
  }

  /// Solve deferred constraints, along with anything they enqueue, until
  /// neither queue has work left.
  pub fn solve_deferred(&mut self) -> &mut Self {
    while !self.deferred.is_empty() {
      for queued in std::mem::take(&mut self.deferred) {
        self.enqueue(queued);
      }

      self.solve();
    }

    self
  }

  fn enqueue(&mut self, queued: Queued) {
    self.scope_mut(queued.context).outstanding += 1;
    self.queue.push_back(queued);
  }

  fn retry(&mut self, mut queued: Queued) {
    if queued.seen == self.settled {
      queued.retries += 1;
    }

    queued.seen = self.settled;
    self.queue.push_back(queued);
  }

  fn step(&mut self, queued: Queued) {
    let scope = queued.context;
    let kind = queued.constraint.kind();

    tracing::trace!(
      retries = queued.retries,
      "solving {}",
      queued.constraint.describe(self, scope)
    );

    match queued.constraint.solve(self, scope) {
      constraint::Outcome::Solved => {}
      constraint::Outcome::Blocked => {
        let limit = self.config.retry_limits.limit_for(kind);

        if queued.retries < limit {
          tracing::debug!(?kind, retries = queued.retries, "blocked, retrying");
          self.retry(queued);

          return;
        }

        tracing::debug!(?kind, retries = queued.retries, "retries exhausted");
        queued.constraint.exhaust(self, scope);
      }
    }

    tracing::trace!("solved {}", queued.constraint.describe(self, scope));

    self.scope_mut(scope).outstanding -= 1;
    self.settled += 1;
  }
}

#[cfg(test)]
mod tests {
  use crate::{ast, config, constraint, context, types};
  use pretty_assertions::assert_eq;

  #[test]
  fn blocked_constraints_are_retried_until_their_cap() {
    let mut config = config::InferenceConfig::default();

    config.retry_limits.unwrap = 3;

    let mut context = context::InferenceContext::new("test", config);
    let root = context.root();
    let optional = types::InferenceType::Variable(context.fresh_type_variable(root, "optional"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));

    context.add_constraint(
      root,
      constraint::Constraint::Unwrap(constraint::Unwrap {
        optional: optional.clone().into(),
        result: result.clone(),
        location: ast::Span::default(),
      }),
    );

    context.solve();

    // Exhaustion assumes the unknown value is optional.
    assert_eq!(
      context.optional_of(result),
      context.apply(root, &optional)
    );

    assert_eq!(0, context.subtree_outstanding(root));
    assert!(context.diagnostics().is_empty());
  }

  #[test]
  fn retried_constraints_see_later_progress() {
    let mut context =
      context::InferenceContext::new("test", config::InferenceConfig::default());

    let root = context.root();
    let lhs = types::InferenceType::Variable(context.fresh_type_variable(root, "lhs"));
    let result = types::InferenceType::Variable(context.fresh_type_variable(root, "result"));

    context.add_constraint(
      root,
      constraint::Constraint::Infix(constraint::Infix {
        lhs: lhs.clone().into(),
        rhs: types::InferenceType::string().into(),
        operator: ast::BinaryOperator::Less,
        result: result.clone(),
        location: ast::Span::default(),
      }),
    );

    context.add_constraint(
      root,
      constraint::Constraint::Equality(constraint::Equality {
        lhs: lhs.into(),
        rhs: types::InferenceType::string().into(),
        location: ast::Span::default(),
      }),
    );

    context.solve();

    assert_eq!(types::InferenceType::bool(), context.apply(root, &result));
    assert!(context.diagnostics().is_empty());
  }

  #[test]
  fn deferred_constraints_run_after_the_main_pass() {
    let mut context =
      context::InferenceContext::new("test", config::InferenceConfig::default());

    let root = context.root();
    let variable = types::InferenceType::Variable(context.fresh_type_variable(root, "x"));

    context.defer_constraint(
      root,
      constraint::Constraint::Equality(constraint::Equality {
        lhs: variable.clone().into(),
        rhs: types::InferenceType::int().into(),
        location: ast::Span::default(),
      }),
    );

    context.solve();
    assert_eq!(variable, context.apply(root, &variable));

    context.solve_deferred();
    assert_eq!(types::InferenceType::int(), context.apply(root, &variable));
  }

  #[test]
  fn progress_does_not_spend_retries() {
    let mut context =
      context::InferenceContext::new("test", config::InferenceConfig::default());

    let root = context.root();
    let pointer = types::InferenceType::Base(types::Primitive::Pointer);

    let links = (0..12)
      .map(|_| types::InferenceType::Variable(context.fresh_type_variable(root, "link")))
      .collect::<Vec<_>>();

    // Each offset only unblocks once the previous one was solved, and the
    // queue meets them in the worst order. Exhausting any of them would guess
    // `int` for its pointer.
    for pair in links.windows(2).rev() {
      context.add_constraint(
        root,
        constraint::Constraint::Infix(constraint::Infix {
          lhs: pair[0].clone().into(),
          rhs: types::InferenceType::int().into(),
          operator: ast::BinaryOperator::Plus,
          result: pair[1].clone(),
          location: ast::Span::default(),
        }),
      );
    }

    context.add_constraint(
      root,
      constraint::Constraint::Equality(constraint::Equality {
        lhs: links[0].clone().into(),
        rhs: pointer.clone().into(),
        location: ast::Span::default(),
      }),
    );

    context.solve();

    for link in &links {
      assert_eq!(pointer, context.apply(root, link));
    }

    assert!(context.diagnostics().is_empty());
  }
}
