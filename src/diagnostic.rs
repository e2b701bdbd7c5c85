//! Diagnostics are user-facing errors whose purpose is to inform the user of any kind of
//! problem found in the program being inferred (except for logic bugs, or internal errors).
//!
//! Inference never stops at the first diagnostic: every failure is recorded, and the
//! offending type is replaced with `any` so that a single run reports as many independent
//! problems as possible.

use crate::{ast, types};

/// A function that may produce multiple diagnostics which are visible to the
/// end user, in the case of its failure.
pub type Maybe<T = ()> = Result<T, Vec<Diagnostic>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagnosticKind {
  #[error("undefined variable `{0}`")]
  UndefinedVariable(String),
  #[error("undefined type `{0}`")]
  UndefinedType(String),
  #[error("`{receiver}` has no member named `{member}`")]
  UndefinedMember {
    receiver: types::InferenceType,
    member: String,
  },
  #[error("expected {expected} argument(s) but got {actual}")]
  ArityMismatch { expected: usize, actual: usize },
  #[error("type mismatch: `{0}` is not compatible with `{1}`")]
  TypeMismatch(types::InferenceType, types::InferenceType),
  #[error("cannot construct the infinite type `{0}` = `{1}`")]
  InfiniteType(types::TypeVariable, types::InferenceType),
  #[error("`{0}` is not callable")]
  NotCallable(types::InferenceType),
  #[error("`{conformer}` does not conform to `{interface}`")]
  MissingRequirements { conformer: String, interface: String },
  #[error("missing requirement `{name}: {requirement}`")]
  MissingRequirement {
    name: String,
    requirement: types::InferenceType,
  },
  #[error("`{name}` has type `{found}`, but `{requirement}` is required")]
  IncompatibleRequirement {
    name: String,
    requirement: types::InferenceType,
    found: types::InferenceType,
  },
  #[error("cannot conform to non-interface type `{0}`")]
  NonInterfaceConformance(types::InferenceType),
  #[error("cannot unwrap non-optional type `{0}`")]
  CannotUnwrap(types::InferenceType),
  #[error("`{0}` cannot be subscripted since it has no `get` method")]
  MissingSubscriptGetter(types::InferenceType),
  #[error("invalid redeclaration of `{0}`")]
  InvalidRedeclaration(String),
  #[error("could not resolve pattern binding against `{0}`")]
  UnresolvedPattern(types::InferenceType),
  #[error("enum case `{case}` has {expected} attached value(s), but the pattern has {actual}")]
  PatternArityMismatch {
    case: String,
    expected: usize,
    actual: usize,
  },
  #[error("operator `{operator}` cannot be applied to `{lhs}` and `{rhs}`")]
  UnsupportedOperands {
    operator: ast::BinaryOperator,
    lhs: types::InferenceType,
    rhs: types::InferenceType,
  },
  #[error("unreachable match arm, an earlier `else` arm matches everything")]
  UnreachableArm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub severity: Severity,
  pub location: ast::Span,
  pub sub_diagnostics: Vec<Diagnostic>,
}

impl Diagnostic {
  pub fn error(kind: DiagnosticKind, location: ast::Span) -> Self {
    Self {
      kind,
      severity: Severity::Error,
      location,
      sub_diagnostics: Vec::new(),
    }
  }

  pub fn warning(kind: DiagnosticKind, location: ast::Span) -> Self {
    Self {
      severity: Severity::Warning,
      ..Self::error(kind, location)
    }
  }

  pub fn with_sub_diagnostics(mut self, sub_diagnostics: Vec<Diagnostic>) -> Self {
    self.sub_diagnostics = sub_diagnostics;

    self
  }

  pub fn message(&self) -> String {
    self.kind.to_string()
  }

  pub fn is_warning(&self) -> bool {
    self.severity == Severity::Warning
  }

  pub fn is_error(&self) -> bool {
    !self.is_warning()
  }

  pub fn to_codespan(&self) -> codespan_reporting::diagnostic::Diagnostic<usize> {
    use codespan_reporting::diagnostic::Label;

    let diagnostic = match self.severity {
      Severity::Error => codespan_reporting::diagnostic::Diagnostic::error(),
      Severity::Warning => codespan_reporting::diagnostic::Diagnostic::warning(),
    };

    let mut labels = vec![Label::primary(
      self.location.file_id,
      self.location.range(),
    )];

    labels.extend(self.sub_diagnostics.iter().map(|sub_diagnostic| {
      Label::secondary(
        sub_diagnostic.location.file_id,
        sub_diagnostic.location.range(),
      )
      .with_message(sub_diagnostic.message())
    }));

    diagnostic
      .with_message(self.message())
      .with_labels(labels)
      .with_notes(
        self
          .sub_diagnostics
          .iter()
          .map(Diagnostic::message)
          .collect(),
      )
  }
}

/// Render diagnostics without color, in order, against the given source files.
pub fn render(
  files: &codespan_reporting::files::SimpleFiles<String, String>,
  diagnostics: &[Diagnostic],
) -> Result<String, codespan_reporting::files::Error> {
  use codespan_reporting::term;

  let mut buffer = term::termcolor::Buffer::no_color();
  let config = term::Config::default();

  for diagnostic in diagnostics {
    term::emit(&mut buffer, &config, files, &diagnostic.to_codespan())?;
  }

  Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

#[derive(Default, Clone, Debug)]
pub struct DiagnosticsHelper {
  pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsHelper {
  pub fn check(&self) -> Maybe {
    if self.contains_errors() {
      Err(self.diagnostics.clone())
    } else {
      Ok(())
    }
  }

  pub fn add_one(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }

  pub fn contains_errors(&self) -> bool {
    self.diagnostics.iter().any(Diagnostic::is_error)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn span(start: usize, end: usize) -> ast::Span {
    ast::Span {
      file_id: 0,
      start,
      end,
    }
  }

  #[test]
  fn message_comes_from_kind() {
    let diagnostic = Diagnostic::error(
      DiagnosticKind::TypeMismatch(types::InferenceType::int(), types::InferenceType::string()),
      span(0, 1),
    );

    assert_eq!(
      "type mismatch: `int` is not compatible with `String`",
      diagnostic.message()
    );
  }

  #[test]
  fn helper_reports_errors() {
    let mut helper = DiagnosticsHelper::default();

    assert!(helper.check().is_ok());

    helper.add_one(Diagnostic::error(
      DiagnosticKind::UndefinedVariable("x".to_string()),
      span(0, 1),
    ));

    assert!(helper.contains_errors());
    assert_eq!(1, helper.check().unwrap_err().len());
  }

  #[test]
  fn warnings_do_not_fail_the_check() {
    let mut helper = DiagnosticsHelper::default();

    helper.add_one(Diagnostic::warning(DiagnosticKind::UnreachableArm, span(0, 1)));

    assert!(!helper.contains_errors());
    assert!(helper.check().is_ok());
    assert!(helper.diagnostics[0].is_warning());
  }

  #[test]
  fn render_includes_sub_diagnostics() {
    let mut files = codespan_reporting::files::SimpleFiles::new();
    let file_id = files.add("main.tlk".to_string(), "struct Person: Greetable {}".to_string());

    let diagnostic = Diagnostic::error(
      DiagnosticKind::MissingRequirements {
        conformer: "Person".to_string(),
        interface: "Greetable".to_string(),
      },
      ast::Span {
        file_id,
        start: 7,
        end: 13,
      },
    )
    .with_sub_diagnostics(vec![Diagnostic::error(
      DiagnosticKind::MissingRequirement {
        name: "name".to_string(),
        requirement: types::InferenceType::string(),
      },
      span(15, 24),
    )]);

    let output = render(&files, &[diagnostic]).expect("rendering should succeed");

    assert!(output.contains("`Person` does not conform to `Greetable`"));
    assert!(output.contains("missing requirement `name: String`"));
  }
}
