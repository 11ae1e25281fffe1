/*! Error types for axquery operations. */

use std::fmt;
use std::time::Duration;

/// Which name set a failed lookup was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
  Attribute,
  ParamAttribute,
  Action,
  /// Dynamic dispatch: attribute, parameterized attribute or search.
  Member,
}

impl fmt::Display for NameKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Attribute => "attribute",
      Self::ParamAttribute => "parameterized attribute",
      Self::Action => "action",
      Self::Member => "attribute or search",
    })
  }
}

/// Errors reported by a [`NodeService`](crate::NodeService).
///
/// These are surfaced to callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
  #[error("Accessibility permissions not granted")]
  PermissionDenied,

  #[error("Handle no longer refers to a live element")]
  InvalidHandle,

  #[error("Round trip to the accessibility service timed out")]
  Timeout,

  #[error("Operation not supported: {0}")]
  NotSupported(String),

  #[error("Accessibility call failed: {0}")]
  Failed(String),
}

/// Result type for [`NodeService`](crate::NodeService) primitives.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Diagnostics for a singular search that found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
  /// The type token as the caller wrote it.
  pub token: String,
  /// Rendered filter set, e.g. `{title: "OK"}`.
  pub filters: String,
  /// Rendered path from the root down to the searching element.
  pub path: Vec<String>,
  /// `true` when the search walked ancestors instead of descendants.
  pub upward: bool,
}

impl fmt::Display for SearchFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let relation = if self.upward { "an ancestor" } else { "a descendant" };
    write!(f, "Could not find `{}`", self.token)?;
    if !self.filters.is_empty() {
      write!(f, " with {}", self.filters)?;
    }
    write!(f, " as {relation} of:")?;
    for (depth, line) in self.path.iter().enumerate() {
      write!(f, "\n{:indent$}{line}", "", indent = (depth + 1) * 2)?;
    }
    Ok(())
  }
}

/// Errors that can occur during axquery operations.
#[derive(Debug, thiserror::Error)]
pub enum AxError {
  #[error("Unknown {kind} `{name}` for {element}")]
  LookupFailure {
    kind: NameKind,
    name: String,
    element: String,
  },

  #[error("Attribute `{name}` is not writable on {element}")]
  ReadOnlyAttribute { name: String, element: String },

  #[error("{0}")]
  SearchFailure(Box<SearchFailure>),

  #[error("Parameterized attribute `{name}` needs a parameter")]
  MissingArgument { name: String },

  #[error("Timed out after {timeout:?} waiting for `{notification}`")]
  NotificationTimeout {
    notification: String,
    timeout: Duration,
  },

  #[error("Invalid filter: {0}")]
  InvalidFilter(String),

  #[error(transparent)]
  Service(#[from] ServiceError),
}

impl AxError {
  /// True for [`AxError::LookupFailure`].
  pub const fn is_lookup_failure(&self) -> bool {
    matches!(self, Self::LookupFailure { .. })
  }

  /// True for [`AxError::SearchFailure`].
  pub const fn is_search_failure(&self) -> bool {
    matches!(self, Self::SearchFailure(_))
  }
}

/// Result type for axquery operations.
pub type AxResult<T> = Result<T, AxError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_failure_renders_indented_path() {
    let failure = SearchFailure {
      token: "button".into(),
      filters: "{title: \"OK\"}".into(),
      path: vec!["Application(\"Finder\")".into(), "Window(\"Docs\")".into()],
      upward: false,
    };
    assert_eq!(
      failure.to_string(),
      "Could not find `button` with {title: \"OK\"} as a descendant of:\n  Application(\"Finder\")\n    Window(\"Docs\")"
    );
  }

  #[test]
  fn search_failure_without_filters() {
    let failure = SearchFailure {
      token: "window".into(),
      filters: String::new(),
      path: vec!["Button".into()],
      upward: true,
    };
    assert_eq!(
      failure.to_string(),
      "Could not find `window` as an ancestor of:\n  Button"
    );
  }

  #[test]
  fn service_errors_convert() {
    let err: AxError = ServiceError::Timeout.into();
    assert!(matches!(err, AxError::Service(ServiceError::Timeout)));
    assert!(!err.is_lookup_failure());
  }
}
