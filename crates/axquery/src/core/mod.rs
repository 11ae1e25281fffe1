/*!
Core axquery session - owns the node service and the search configuration.

# Module Structure

- `mod.rs` - `AxQuery` session, `AxQueryBuilder`, `Config`
- `element.rs` - the `Element` proxy: attribute, action and relation access
- `dispatch.rs` - two-stage dynamic name dispatch (`resolve_call` / `call`)
- `enumerate.rs` - breadth-first and depth-first descendant cursors
- `search.rs` - filter sets and cardinality-aware search
- `notify.rs` - blocking notification waits
- `render.rs` - element descriptions, paths and subtree dumps

# Example

```
use axquery::platform::memory::MemoryTree;
use axquery::{AxQuery, Filters};

let tree = MemoryTree::new();
let app = tree.add_root(&["AXApplication"]);
let window = tree.add_child(app, &["AXWindow"]);
let ok = tree.add_child(window, &["AXButton"]);
tree.set_attribute(ok, "AXTitle", "OK".into());

let ax = AxQuery::new(tree)?;
let app = ax.element(app)?;
let button = app.find("button", &Filters::new().with("title", "OK"))?;
assert_eq!(button.string_attribute("title")?.as_deref(), Some("OK"));
# Ok::<(), axquery::AxError>(())
```
*/

mod dispatch;
mod element;
mod enumerate;
mod notify;
mod render;
mod search;

pub use dispatch::{Arg, Dispatch, Outcome};
pub use element::Element;
pub use enumerate::{BreadthFirst, DepthFirst, DepthFirstWithLevel, Descendants};
pub use notify::Notified;
pub use search::{FilterValue, Filters, Predicate, SearchResult};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::platform::NodeService;
use crate::types::AxResult;

/// Order in which searches visit descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
  #[default]
  BreadthFirst,
  DepthFirst,
}

/// How a search token is compared against an element's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMatch {
  /// The class or any subclass of it (`button` matches a `CloseButton`).
  #[default]
  Kind,
  /// Exactly the named class.
  Exact,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Global round-trip timeout forwarded to the service. Unset keeps the service default.
  pub timeout_secs: Option<f32>,
  /// Default wait for [`Element::wait_for`].
  pub notification_timeout_secs: f64,
  pub search_order: Traversal,
  pub type_match: TypeMatch,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      timeout_secs: None,
      notification_timeout_secs: 10.0,
      search_order: Traversal::default(),
      type_match: TypeMatch::default(),
    }
  }
}

impl Config {
  /// Negative values mean zero. Values beyond `Duration::MAX` saturate.
  pub fn notification_timeout(&self) -> Duration {
    Duration::try_from_secs_f64(self.notification_timeout_secs.max(0.0)).unwrap_or(Duration::MAX)
  }
}

/// State shared by a session and every element it hands out.
pub(crate) struct Shared<S: NodeService> {
  pub(crate) service: S,
  pub(crate) config: RwLock<Config>,
}

/// An axquery session over a node service.
///
/// Clone is cheap (Arc bump). Elements keep the session alive.
pub struct AxQuery<S: NodeService> {
  shared: Arc<Shared<S>>,
}

impl<S: NodeService> Clone for AxQuery<S> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<S: NodeService + fmt::Debug> fmt::Debug for AxQuery<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AxQuery")
      .field("service", &self.shared.service)
      .field("config", &*self.shared.config.read())
      .finish()
  }
}

/// Builder for configuring an [`AxQuery`] session.
///
/// # Example
///
/// ```
/// use axquery::platform::memory::MemoryTree;
/// use axquery::{AxQuery, Traversal};
///
/// let ax = AxQuery::builder(MemoryTree::new())
///     .timeout_secs(2.5)
///     .search_order(Traversal::DepthFirst)
///     .build()?;
/// assert_eq!(ax.service().timeout(None), Some(2.5));
/// # Ok::<(), axquery::AxError>(())
/// ```
#[must_use = "Builder does nothing until .build() is called"]
pub struct AxQueryBuilder<S: NodeService> {
  service: S,
  config: Config,
}

impl<S: NodeService> AxQueryBuilder<S> {
  /// Replace the whole configuration (e.g. one loaded from a file).
  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Global round-trip timeout in seconds.
  pub fn timeout_secs(mut self, secs: f32) -> Self {
    self.config.timeout_secs = Some(secs);
    self
  }

  /// Default notification wait in seconds. Default: 10.
  pub fn notification_timeout_secs(mut self, secs: f64) -> Self {
    self.config.notification_timeout_secs = secs;
    self
  }

  /// Descendant order for searches. Default: breadth-first.
  pub fn search_order(mut self, order: Traversal) -> Self {
    self.config.search_order = order;
    self
  }

  /// Class comparison for searches. Default: [`TypeMatch::Kind`].
  pub fn type_match(mut self, type_match: TypeMatch) -> Self {
    self.config.type_match = type_match;
    self
  }

  /// Build the session, forwarding the global timeout to the service if set.
  pub fn build(self) -> AxResult<AxQuery<S>> {
    if let Some(secs) = self.config.timeout_secs {
      self.service.set_timeout(None, secs)?;
    }
    Ok(AxQuery {
      shared: Arc::new(Shared {
        service: self.service,
        config: RwLock::new(self.config),
      }),
    })
  }
}

impl<S: NodeService> AxQuery<S> {
  /// Create a session with default configuration.
  pub fn new(service: S) -> AxResult<Self> {
    Self::builder(service).build()
  }

  pub fn builder(service: S) -> AxQueryBuilder<S> {
    AxQueryBuilder {
      service,
      config: Config::default(),
    }
  }

  pub fn service(&self) -> &S {
    &self.shared.service
  }

  /// Snapshot of the current configuration.
  pub fn config(&self) -> Config {
    self.shared.config.read().clone()
  }

  /// Set the round-trip timeout for every node.
  pub fn set_global_timeout(&self, secs: f32) -> AxResult<()> {
    self.shared.service.set_timeout(None, secs)?;
    self.shared.config.write().timeout_secs = Some(secs);
    Ok(())
  }

  pub fn set_search_order(&self, order: Traversal) {
    self.shared.config.write().search_order = order;
  }

  pub fn set_type_match(&self, type_match: TypeMatch) {
    self.shared.config.write().type_match = type_match;
  }

  /// Wrap a handle obtained from the service.
  pub fn element(&self, handle: S::Handle) -> AxResult<Element<S>> {
    Element::wrap(Arc::clone(&self.shared), handle)
  }
}
