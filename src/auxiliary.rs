use crate::{ast, types};

#[macro_export]
macro_rules! assert_extract {
  ($subject:expr, $path:path) => {
    match $subject {
      $path(inner) => inner,
      _ => unreachable!(),
    }
  };
}

pub(crate) const BUG_CONTEXT_HANDLE: &str =
  "context handles should only ever be minted by the arena that owns them";

pub(crate) const BUG_RETURN_TRACKING: &str =
  "return tracking should have been started before collecting the tracked returns";

pub(crate) const BUG_HINT_STACK: &str =
  "hint stacks should be balanced; every pop must follow a matching push";

pub(crate) const BUG_DECLARATION_SHELL: &str =
  "nominal declarations should be registered as shells before their bodies are walked";

/// Process-wide counter for inference runs. Every run stamps the variables
/// it mints with its own run id, so that two modules never produce colliding
/// variable identities when one is later imported into the other.
static NEXT_RUN_ID: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);

pub(crate) fn next_run_id() -> types::RunId {
  types::RunId(NEXT_RUN_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
}

#[derive(Default)]
pub struct IdGenerator {
  counter: usize,
}

impl IdGenerator {
  /// Create a unique, non-repeating identifier based from a counter.
  ///
  /// This is used to create unique ids for syntax tree nodes.
  pub fn next(&mut self) -> usize {
    let id = self.counter;

    self.counter += 1;

    id
  }

  pub fn next_node_id(&mut self) -> ast::NodeId {
    ast::NodeId(self.next())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn id_generator_is_monotonic() {
    let mut id_generator = IdGenerator::default();

    assert_eq!(0, id_generator.next());
    assert_eq!(ast::NodeId(1), id_generator.next_node_id());
    assert_eq!(ast::NodeId(2), id_generator.next_node_id());
  }

  #[test]
  fn run_ids_are_never_reused() {
    let first = next_run_id();
    let second = next_run_id();

    assert!(first != second);
  }
}
