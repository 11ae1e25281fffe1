/*!
Dynamic name dispatch.

`resolve_call` decides what a bare name means for an element, in order:
an attribute, a parameterized attribute, or (when the element has children)
a search for descendants of that type. `call` runs the decision.
*/

use std::fmt;

use super::{Element, Filters, SearchResult};
use crate::a11y::{normalize, Value};
use crate::platform::NodeService;
use crate::types::{AxError, AxResult, NameKind};

/// What a name resolved to, carrying the resolved identifier or token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dispatch {
  Attribute(String),
  ParamAttribute(String),
  /// Descendant search for the normalised type token.
  Search(String),
}

/// Argument to [`Element::call`].
pub enum Arg<S: NodeService> {
  None,
  /// Parameter for a parameterized attribute.
  Param(Value<S>),
  /// Filters for a search.
  Filters(Filters<S>),
}

impl<S: NodeService> fmt::Debug for Arg<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::None => f.write_str("None"),
      Self::Param(value) => f.debug_tuple("Param").field(value).finish(),
      Self::Filters(filters) => f.debug_tuple("Filters").field(filters).finish(),
    }
  }
}

impl<S: NodeService> From<Filters<S>> for Arg<S> {
  fn from(filters: Filters<S>) -> Self {
    Self::Filters(filters)
  }
}

/// Result of [`Element::call`].
pub enum Outcome<S: NodeService> {
  Value(Value<S>),
  Found(SearchResult<S>),
}

impl<S: NodeService> Outcome<S> {
  pub fn into_value(self) -> Option<Value<S>> {
    match self {
      Self::Value(value) => Some(value),
      Self::Found(_) => None,
    }
  }

  pub fn into_found(self) -> Option<SearchResult<S>> {
    match self {
      Self::Found(found) => Some(found),
      Self::Value(_) => None,
    }
  }
}

impl<S: NodeService> fmt::Debug for Outcome<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
      Self::Found(found) => f.debug_tuple("Found").field(found).finish(),
    }
  }
}

const CHILDREN: &str = "children";

impl<S: NodeService> Element<S> {
  /// Decide what `name` means for this element without running it.
  pub fn resolve_call(&self, name: &str) -> AxResult<Dispatch> {
    if let Some(id) = self.attribute_shape().resolve(name) {
      return Ok(Dispatch::Attribute(id.to_owned()));
    }
    if let Some(id) = self.param_shape()?.resolve(name) {
      return Ok(Dispatch::ParamAttribute(id.to_owned()));
    }
    if self.has_attribute(CHILDREN) {
      return Ok(Dispatch::Search(normalize(name)));
    }
    Err(self.lookup_failure(NameKind::Member, name))
  }

  /// Resolve `name` and run it.
  ///
  /// ```
  /// use axquery::platform::memory::MemoryTree;
  /// use axquery::{Arg, AxQuery, Filters};
  ///
  /// let tree = MemoryTree::new();
  /// let window = tree.add_root(&["AXWindow"]);
  /// tree.set_attribute(window, "AXTitle", "Docs".into());
  /// let ok = tree.add_child(window, &["AXButton"]);
  /// tree.set_attribute(ok, "AXTitle", "OK".into());
  ///
  /// let ax = AxQuery::new(tree)?;
  /// let window = ax.element(window)?;
  /// let title = window.call("title", Arg::None)?.into_value();
  /// assert_eq!(title.as_ref().and_then(|v| v.as_str()), Some("Docs"));
  ///
  /// let found = window.call("button", Filters::new().with("title", "OK").into())?;
  /// assert_eq!(found.into_found().map(|f| f.len()), Some(1));
  /// # Ok::<(), axquery::AxError>(())
  /// ```
  pub fn call(&self, name: &str, arg: Arg<S>) -> AxResult<Outcome<S>> {
    match self.resolve_call(name)? {
      Dispatch::Attribute(id) => self.read_id(&id).map(Outcome::Value),
      Dispatch::ParamAttribute(id) => match arg {
        Arg::Param(param) => self.read_param_id(&id, &param).map(Outcome::Value),
        Arg::None | Arg::Filters(_) => Err(AxError::MissingArgument {
          name: name.to_owned(),
        }),
      },
      Dispatch::Search(token) => {
        let filters = match arg {
          Arg::Filters(filters) => filters,
          Arg::None | Arg::Param(_) => Filters::new(),
        };
        self.search(&token, &filters).map(Outcome::Found)
      }
    }
  }
}
