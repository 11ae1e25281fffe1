/*!
Filter sets and cardinality-aware search.

A search token names a class (`button`, `AXCloseButton`) and its grammatical
number decides the result: `"button"` returns the first match or fails with
[`AxError::SearchFailure`], `"buttons"` returns every match, possibly none.
*/

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::{Element, TypeMatch};
use crate::a11y::{cardinality, normalize, Cardinality, Value, PREDICATE_MARKER};
use crate::platform::NodeService;
use crate::types::{AxError, AxResult, SearchFailure};

/// Caller-supplied test over an attribute value.
pub type Predicate<S> = Arc<dyn Fn(&Value<S>) -> bool + Send + Sync>;

/// Condition on one attribute of a candidate.
pub enum FilterValue<S: NodeService> {
  /// The attribute equals the value.
  Equals(Value<S>),
  /// The attribute is a string matching the pattern.
  Matches(Regex),
  Satisfies(Predicate<S>),
  /// The key is a type token: the candidate has a matching descendant of that type.
  Contains(Filters<S>),
}

impl<S: NodeService> FilterValue<S> {
  fn accepts(&self, value: &Value<S>) -> bool {
    match self {
      Self::Equals(expected) => value == expected,
      Self::Matches(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
      Self::Satisfies(predicate) => predicate(value),
      Self::Contains(_) => false,
    }
  }
}

impl<S: NodeService> Clone for FilterValue<S> {
  fn clone(&self) -> Self {
    match self {
      Self::Equals(value) => Self::Equals(value.clone()),
      Self::Matches(pattern) => Self::Matches(pattern.clone()),
      Self::Satisfies(predicate) => Self::Satisfies(Arc::clone(predicate)),
      Self::Contains(nested) => Self::Contains(nested.clone()),
    }
  }
}

impl<S: NodeService> fmt::Debug for FilterValue<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
      Self::Matches(pattern) => f.debug_tuple("Matches").field(&pattern.as_str()).finish(),
      Self::Satisfies(_) => f.write_str("Satisfies(..)"),
      Self::Contains(nested) => f.debug_tuple("Contains").field(nested).finish(),
    }
  }
}

impl<S: NodeService> fmt::Display for FilterValue<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Equals(value) => write!(f, "{value}"),
      Self::Matches(pattern) => write!(f, "/{}/", pattern.as_str()),
      Self::Satisfies(_) => f.write_str("<predicate>"),
      Self::Contains(nested) => write!(f, "{nested}"),
    }
  }
}

/// Ordered set of attribute conditions. A candidate must satisfy all of them.
///
/// ```
/// use axquery::platform::memory::MemoryTree;
/// use axquery::Filters;
///
/// let filters = Filters::<MemoryTree>::new()
///     .with("title", "OK")
///     .with("enabled", true);
/// assert_eq!(filters.to_string(), r#"{title: "OK", enabled: true}"#);
/// ```
pub struct Filters<S: NodeService> {
  entries: Vec<(String, FilterValue<S>)>,
}

impl<S: NodeService> Default for Filters<S> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: NodeService> Clone for Filters<S> {
  fn clone(&self) -> Self {
    Self {
      entries: self.entries.clone(),
    }
  }
}

impl<S: NodeService> fmt::Debug for Filters<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(self.entries.iter().map(|(name, value)| (name, value)))
      .finish()
  }
}

impl<S: NodeService> fmt::Display for Filters<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (name, value)) in self.entries.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{name}: {value}")?;
    }
    f.write_str("}")
  }
}

impl<S: NodeService> Filters<S> {
  pub const fn new() -> Self {
    Self {
      entries: Vec::new(),
    }
  }

  fn push(mut self, name: &str, value: FilterValue<S>) -> Self {
    self.entries.push((name.to_owned(), value));
    self
  }

  /// Require `name` to equal `value`.
  pub fn with(self, name: &str, value: impl Into<Value<S>>) -> Self {
    self.push(name, FilterValue::Equals(value.into()))
  }

  /// Require `name` to be a string matching `pattern`.
  pub fn matches(self, name: &str, pattern: Regex) -> Self {
    self.push(name, FilterValue::Matches(pattern))
  }

  /// Like [`matches`](Self::matches), compiling `pattern` first.
  pub fn pattern(self, name: &str, pattern: &str) -> AxResult<Self> {
    let pattern =
      Regex::new(pattern).map_err(|err| AxError::InvalidFilter(format!("`{name}`: {err}")))?;
    Ok(self.matches(name, pattern))
  }

  /// Require `predicate` to accept the value of `name`.
  pub fn satisfying<F>(self, name: &str, predicate: F) -> Self
  where
    F: Fn(&Value<S>) -> bool + Send + Sync + 'static,
  {
    self.push(name, FilterValue::Satisfies(Arc::new(predicate)))
  }

  /// Require a descendant of type `token` matching `nested`.
  pub fn contains(self, token: &str, nested: Self) -> Self {
    self.push(token, FilterValue::Contains(nested))
  }

  /// Build filters from a JSON object. Scalars and arrays compare for
  /// equality; nested objects become descendant conditions.
  ///
  /// Keys are visited in `serde_json` map order.
  pub fn from_json(json: &serde_json::Value) -> AxResult<Self> {
    let serde_json::Value::Object(map) = json else {
      return Err(AxError::InvalidFilter(format!(
        "expected an object, got {json}"
      )));
    };
    map.iter().try_fold(Self::new(), |filters, (name, value)| {
      Ok(match value {
        serde_json::Value::Object(_) => filters.contains(name, Self::from_json(value)?),
        scalar => filters.with(name, json_value::<S>(scalar)?),
      })
    })
  }

  pub fn from_json_str(json: &str) -> AxResult<Self> {
    let json: serde_json::Value =
      serde_json::from_str(json).map_err(|err| AxError::InvalidFilter(err.to_string()))?;
    Self::from_json(&json)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue<S>)> {
    self.entries.iter().map(|(name, value)| (name.as_str(), value))
  }

  /// Rendering for diagnostics; empty when there are no conditions.
  pub(crate) fn render(&self) -> String {
    if self.is_empty() {
      String::new()
    } else {
      self.to_string()
    }
  }
}

fn json_value<S: NodeService>(json: &serde_json::Value) -> AxResult<Value<S>> {
  Ok(match json {
    serde_json::Value::Null => Value::Null,
    serde_json::Value::Bool(b) => Value::Boolean(*b),
    serde_json::Value::Number(n) => Value::Number(
      n.as_f64()
        .ok_or_else(|| AxError::InvalidFilter(format!("number out of range: {n}")))?,
    ),
    serde_json::Value::String(s) => Value::String(s.clone()),
    serde_json::Value::Array(items) => Value::Array(
      items
        .iter()
        .map(json_value)
        .collect::<AxResult<Vec<_>>>()?,
    ),
    serde_json::Value::Object(_) => {
      return Err(AxError::InvalidFilter(
        "objects are only allowed as top-level filter values".into(),
      ))
    }
  })
}

/// Result of a search whose cardinality was inferred from the token.
pub enum SearchResult<S: NodeService> {
  One(Element<S>),
  Many(Vec<Element<S>>),
}

impl<S: NodeService> SearchResult<S> {
  pub fn into_vec(self) -> Vec<Element<S>> {
    match self {
      Self::One(element) => vec![element],
      Self::Many(elements) => elements,
    }
  }

  /// The single match, or the first of many.
  pub fn first(&self) -> Option<&Element<S>> {
    match self {
      Self::One(element) => Some(element),
      Self::Many(elements) => elements.first(),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::One(_) => 1,
      Self::Many(elements) => elements.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<S: NodeService> Clone for SearchResult<S> {
  fn clone(&self) -> Self {
    match self {
      Self::One(element) => Self::One(element.clone()),
      Self::Many(elements) => Self::Many(elements.clone()),
    }
  }
}

impl<S: NodeService> PartialEq for SearchResult<S> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::One(a), Self::One(b)) => a == b,
      (Self::Many(a), Self::Many(b)) => a == b,
      _ => false,
    }
  }
}

impl<S: NodeService> fmt::Debug for SearchResult<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::One(element) => f.debug_tuple("One").field(element).finish(),
      Self::Many(elements) => f.debug_tuple("Many").field(elements).finish(),
    }
  }
}

/// Cardinality and singular class key of a search token.
pub(crate) fn search_key(token: &str) -> (Cardinality, String) {
  let key = normalize(token);
  cardinality(key.trim_end_matches(PREDICATE_MARKER))
}

impl<S: NodeService> Element<S> {
  fn type_matches(&self, key: &str, mode: TypeMatch) -> bool {
    match mode {
      TypeMatch::Kind => self.class().is_a(key),
      TypeMatch::Exact => self.class().key() == key,
    }
  }

  /// Whether this element satisfies every condition in `filters`.
  ///
  /// An attribute this element lacks is a non-match. Service failures while
  /// reading a filtered attribute are returned.
  pub fn satisfies(&self, filters: &Filters<S>) -> AxResult<bool> {
    for (name, condition) in filters.iter() {
      if !self.satisfies_one(name, condition)? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn satisfies_one(&self, name: &str, condition: &FilterValue<S>) -> AxResult<bool> {
    if let FilterValue::Contains(nested) = condition {
      let (_, key) = search_key(name);
      let found = self.matching(&key, nested).next().transpose()?;
      return Ok(found.is_some());
    }
    Ok(match self.try_attribute(name)? {
      Some(value) => condition.accepts(&value),
      None => false,
    })
  }

  fn is_match(&self, key: &str, mode: TypeMatch, filters: &Filters<S>) -> AxResult<bool> {
    if !self.type_matches(key, mode) {
      return Ok(false);
    }
    self.satisfies(filters)
  }

  /// Matching descendants in search order. A service failure is yielded
  /// as an error item.
  fn matching<'a>(
    &self,
    key: &'a str,
    filters: &'a Filters<S>,
  ) -> impl Iterator<Item = AxResult<Element<S>>> + 'a {
    let config = self.config();
    self
      .descendants(config.search_order)
      .filter_map(move |candidate| match candidate.is_match(key, config.type_match, filters) {
        Ok(true) => Some(Ok(candidate)),
        Ok(false) => None,
        Err(err) => {
          log::debug!("Search for {key} stopped at {}: {err}", candidate.class());
          Some(Err(err))
        }
      })
  }

  fn first_match(&self, key: &str, filters: &Filters<S>) -> AxResult<Option<Self>> {
    self.matching(key, filters).next().transpose()
  }

  fn all_matches(&self, key: &str, filters: &Filters<S>) -> AxResult<Vec<Self>> {
    self.matching(key, filters).collect()
  }

  fn search_failure(&self, token: &str, filters: &Filters<S>, upward: bool) -> AxError {
    AxError::SearchFailure(Box::new(SearchFailure {
      token: token.to_owned(),
      filters: filters.render(),
      path: self.path(),
      upward,
    }))
  }

  /// Search descendants, inferring cardinality from `token`.
  pub fn search(&self, token: &str, filters: &Filters<S>) -> AxResult<SearchResult<S>> {
    let (cardinality, key) = search_key(token);
    match cardinality {
      Cardinality::One => match self.first_match(&key, filters)? {
        Some(found) => Ok(SearchResult::One(found)),
        None => Err(self.search_failure(token, filters, false)),
      },
      Cardinality::All => Ok(SearchResult::Many(self.all_matches(&key, filters)?)),
    }
  }

  /// First matching descendant of type `token`, singular or plural.
  pub fn find(&self, token: &str, filters: &Filters<S>) -> AxResult<Self> {
    let (_, key) = search_key(token);
    match self.first_match(&key, filters)? {
      Some(found) => Ok(found),
      None => Err(self.search_failure(token, filters, false)),
    }
  }

  /// Every matching descendant of type `token`, singular or plural.
  pub fn find_all(&self, token: &str, filters: &Filters<S>) -> AxResult<Vec<Self>> {
    let (_, key) = search_key(token);
    self.all_matches(&key, filters)
  }

  /// Nearest ancestor of type `token` matching `filters`.
  pub fn ancestor(&self, token: &str, filters: &Filters<S>) -> AxResult<Self> {
    let (_, key) = search_key(token);
    let mode = self.config().type_match;
    for node in self.ancestry()?.into_iter().skip(1) {
      if node.is_match(&key, mode, filters)? {
        return Ok(node);
      }
    }
    Err(self.search_failure(token, filters, true))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::fixtures::{self, titles};
  use crate::platform::memory::MemoryTree;
  use crate::types::ServiceError;
  use serde_json::json;

  type F = Filters<MemoryTree>;

  mod plurality {
    use super::*;

    #[test]
    fn singular_returns_first_match() {
      let (ax, nodes) = fixtures::tree();
      let app = ax.element(nodes.app).expect("app");
      let found = app.search("button", &F::new()).expect("button");
      assert!(matches!(&found, SearchResult::One(e) if e.handle() == &nodes.c1a));
    }

    #[test]
    fn plural_returns_all_matches() {
      let (ax, nodes) = fixtures::tree();
      let app = ax.element(nodes.app).expect("app");
      let found = app.search("buttons", &F::new()).expect("buttons");
      assert_eq!(titles(&found.into_vec()), vec!["OK", "Cancel"]);
    }

    #[test]
    fn empty_singular_fails_and_empty_plural_does_not() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let err = window
        .search("radio_button", &F::new())
        .expect_err("no radio buttons");
      assert!(err.is_search_failure());
      let found = window.search("radio_buttons", &F::new()).expect("plural");
      assert!(found.is_empty());
    }

    #[test]
    fn failure_reports_token_filters_and_path() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let err = window
        .search("button", &F::new().with("title", "Help"))
        .expect_err("no help button");
      let AxError::SearchFailure(failure) = err else {
        panic!("expected a search failure");
      };
      assert_eq!(failure.token, "button");
      assert_eq!(failure.filters, r#"{title: "Help"}"#);
      assert_eq!(failure.path, vec![r#"Application("Finder")"#, r#"Window("Docs")"#]);
      assert!(!failure.upward);
    }

    #[test]
    fn find_and_find_all_ignore_number() {
      let (ax, nodes) = fixtures::tree();
      let app = ax.element(nodes.app).expect("app");
      assert_eq!(app.find("buttons", &F::new()).ok().map(|e| *e.handle()), Some(nodes.c1a));
      assert_eq!(app.find_all("button", &F::new()).map(|v| v.len()).ok(), Some(2));
    }

    #[test]
    fn identifier_tokens_work() {
      let (ax, nodes) = fixtures::tree();
      let app = ax.element(nodes.app).expect("app");
      let found = app.find("AXCheckBox", &F::new()).expect("check box");
      assert_eq!(found.handle(), &nodes.c1b);
    }
  }

  mod matching {
    use super::*;
    use crate::core::TypeMatch;

    #[test]
    fn subclasses_match_by_default() {
      let (ax, nodes) = fixtures::tree();
      let app = ax.element(nodes.app).expect("app");
      let cancel = app
        .find("button", &F::new().with("title", "Cancel"))
        .expect("close button");
      assert_eq!(cancel.class().name(), "CloseButton");
    }

    #[test]
    fn exact_type_match_excludes_subclasses() {
      let (ax, nodes) = fixtures::tree();
      ax.set_type_match(TypeMatch::Exact);
      let app = ax.element(nodes.app).expect("app");
      assert_eq!(titles(&app.find_all("buttons", &F::new()).expect("search")), vec!["OK"]);
    }

    #[test]
    fn element_token_matches_everything() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      assert_eq!(window.find_all("elements", &F::new()).map(|v| v.len()).ok(), Some(5));
    }

    #[test]
    fn absent_attributes_do_not_match() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let with_title = window
        .find_all("elements", &F::new().satisfying("title", |_| true))
        .expect("search");
      assert_eq!(titles(&with_title), vec!["OK", "Remember", "Cancel"]);
    }

    #[test]
    fn results_are_a_subset_satisfying_every_filter() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let filters = F::new().with("enabled", false).with("title", "Cancel");
      let found = window.find_all("elements", &filters).expect("search");
      assert_eq!(titles(&found), vec!["Cancel"]);
      assert!(found.iter().all(|e| e.satisfies(&filters).is_ok_and(|ok| ok)));
    }

    #[test]
    fn pattern_filters() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let filters = F::new().pattern("title", "^(OK|Re)").expect("valid pattern");
      assert_eq!(
        titles(&window.find_all("elements", &filters).expect("search")),
        vec!["OK", "Remember"]
      );
      assert!(matches!(
        F::new().pattern("title", "("),
        Err(AxError::InvalidFilter(_))
      ));
    }

    #[test]
    fn predicate_filters() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let enabled = window
        .find_all(
          "buttons",
          &F::new().satisfying("enabled", |v| v.as_bool() == Some(true)),
        )
        .expect("search");
      assert_eq!(titles(&enabled), vec!["OK"]);
    }

    #[test]
    fn descendant_conditions() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let groups = window
        .find_all("groups", &F::new().contains("close_button", F::new()))
        .expect("search");
      assert_eq!(groups.iter().map(|g| *g.handle()).collect::<Vec<_>>(), vec![nodes.c2]);
    }

    #[test]
    fn equality_skips_buttons_without_the_attribute() {
      let (ax, nodes) = fixtures::tree();
      let help = ax.service().add_child(nodes.c2, &["AXButton"]);
      ax.service().set_attribute(help, "AXTitle", "Help".into());
      let window = ax.element(nodes.window).expect("window");
      let enabled = window
        .find_all("buttons", &F::new().with("enabled", true))
        .expect("search");
      assert_eq!(enabled.iter().map(|e| *e.handle()).collect::<Vec<_>>(), vec![nodes.c1a]);
    }

    #[test]
    fn service_failures_during_filtering_are_returned() {
      let _ = env_logger::builder().is_test(true).try_init();
      let (ax, nodes) = fixtures::tree();
      ax.service().break_attribute(nodes.c1a, "AXTitle");
      ax.service().break_attribute(nodes.c2a, "AXTitle");
      let window = ax.element(nodes.window).expect("window");
      let filters = F::new().with("title", "OK");
      for result in [
        window.search("button", &filters).map(|_| ()),
        window.find("button", &filters).map(|_| ()),
        window.find_all("buttons", &filters).map(|_| ()),
      ] {
        assert!(matches!(
          result,
          Err(AxError::Service(ServiceError::Failed(_)))
        ));
      }
    }

    #[test]
    fn children_failures_stay_isolated() {
      let (ax, nodes) = fixtures::tree();
      ax.service().break_children(nodes.c1);
      let window = ax.element(nodes.window).expect("window");
      let buttons = window.find_all("buttons", &F::new()).expect("search");
      assert_eq!(buttons.iter().map(|e| *e.handle()).collect::<Vec<_>>(), vec![nodes.c2a]);
    }

    #[test]
    fn depth_first_order_changes_the_first_match() {
      let tree = MemoryTree::new();
      let root = tree.add_root(&["AXWindow"]);
      let outer = tree.add_child(root, &["AXGroup"]);
      let deep = tree.add_child(outer, &["AXButton"]);
      let shallow = tree.add_child(root, &["AXButton"]);
      let ax = crate::AxQuery::new(tree).expect("session");
      let root = ax.element(root).expect("root");
      assert_eq!(root.find("button", &F::new()).ok().map(|e| *e.handle()), Some(shallow));
      ax.set_search_order(crate::Traversal::DepthFirst);
      assert_eq!(root.find("button", &F::new()).ok().map(|e| *e.handle()), Some(deep));
    }
  }

  mod ancestors {
    use super::*;

    #[test]
    fn nearest_matching_ancestor() {
      let (ax, nodes) = fixtures::tree();
      let cancel = ax.element(nodes.c2a).expect("cancel");
      assert_eq!(cancel.ancestor("window", &F::new()).ok().map(|e| *e.handle()), Some(nodes.window));
      assert_eq!(cancel.ancestor("element", &F::new()).ok().map(|e| *e.handle()), Some(nodes.c2));
    }

    #[test]
    fn missing_ancestor_fails_upward() {
      let (ax, nodes) = fixtures::tree();
      let cancel = ax.element(nodes.c2a).expect("cancel");
      let err = cancel.ancestor("table", &F::new()).expect_err("no table");
      assert!(matches!(err, AxError::SearchFailure(ref f) if f.upward));
      assert!(err.to_string().contains("as an ancestor of"));
    }

    #[test]
    fn ancestor_filter_failures_are_returned() {
      let (ax, nodes) = fixtures::tree();
      ax.service().break_attribute(nodes.c2, "AXTitle");
      let cancel = ax.element(nodes.c2a).expect("cancel");
      let err = cancel
        .ancestor("group", &F::new().with("title", "Tools"))
        .expect_err("broken read");
      assert!(matches!(err, AxError::Service(_)));
    }
  }

  mod json {
    use super::*;

    #[test]
    fn scalars_become_equality() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let filters = F::from_json(&json!({"title": "Remember", "value": 0})).expect("filters");
      assert_eq!(window.find("element", &filters).ok().map(|e| *e.handle()), Some(nodes.c1b));
    }

    #[test]
    fn objects_become_descendant_conditions() {
      let (ax, nodes) = fixtures::tree();
      let window = ax.element(nodes.window).expect("window");
      let filters = F::from_json_str(r#"{"button": {"title": "OK"}}"#).expect("filters");
      assert_eq!(window.find("group", &filters).ok().map(|e| *e.handle()), Some(nodes.c1));
    }

    #[test]
    fn non_objects_are_rejected() {
      assert!(matches!(F::from_json(&json!([1, 2])), Err(AxError::InvalidFilter(_))));
      assert!(matches!(
        F::from_json(&json!({"title": [{"nested": true}]})),
        Err(AxError::InvalidFilter(_))
      ));
      assert!(matches!(F::from_json_str("{"), Err(AxError::InvalidFilter(_))));
    }

    #[test]
    fn rendering() {
      let filters = F::new()
        .with("title", "OK")
        .pattern("help", "^Save")
        .expect("pattern")
        .satisfying("enabled", |_| true)
        .contains("row", F::new().with("selected", true));
      assert_eq!(
        filters.to_string(),
        r#"{title: "OK", help: /^Save/, enabled: <predicate>, row: {selected: true}}"#
      );
      assert_eq!(F::new().render(), "");
    }
  }
}
