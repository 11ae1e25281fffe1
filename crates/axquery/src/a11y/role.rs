/*!
Role taxonomy.

A node's role chain (most specific first, e.g. `["AXCloseButton", "AXButton"]`)
resolves to a [`Class`]. Classes are registered lazily the first time a role
is seen and are never rebound, so the taxonomy mirrors the roles discovered
at run time: `CloseButton` → `Button` → `Element`.
*/

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use super::naming::{snake_case, unprefix};

/// Name of the generic base class every other class descends from.
pub const BASE_CLASS: &str = "Element";

#[derive(Debug)]
struct ClassInner {
  name: String,
  key: String,
  parent: Option<Class>,
}

/// A node class in the role taxonomy.
///
/// Cheap to clone. Two `Class` values are equal only if they are the same
/// registered class.
#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

impl Class {
  fn new(name: String, parent: Option<Self>) -> Self {
    let key = snake_case(&name);
    Self(Arc::new(ClassInner { name, key, parent }))
  }

  /// The generic base class.
  pub fn base() -> Self {
    Self::clone(&registry().base)
  }

  /// Class name without namespace, e.g. `CloseButton`.
  pub fn name(&self) -> &str {
    &self.0.name
  }

  /// Snake-case key used by searches, e.g. `close_button`.
  pub fn key(&self) -> &str {
    &self.0.key
  }

  pub fn parent(&self) -> Option<&Self> {
    self.0.parent.as_ref()
  }

  pub fn is_base(&self) -> bool {
    self.0.parent.is_none()
  }

  /// This class followed by its ancestors, ending with the base class.
  pub fn lineage(&self) -> impl Iterator<Item = &Self> + '_ {
    std::iter::successors(Some(self), |class| class.parent())
  }

  /// Whether this class is, or descends from, the class with `key`.
  pub fn is_a(&self, key: &str) -> bool {
    self.lineage().any(|class| class.key() == key)
  }

  /// Look up an already registered class by name (`Button` or `AXButton`).
  pub fn lookup(name: &str) -> Option<Self> {
    registry().classes.read().get(unprefix(name)).cloned()
  }
}

impl PartialEq for Class {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl Eq for Class {}

impl Hash for Class {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::ptr::hash(Arc::as_ptr(&self.0), state);
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lineage: Vec<&str> = self.lineage().map(Class::name).collect();
    write!(f, "Class({})", lineage.join(" < "))
  }
}

impl fmt::Display for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

struct Registry {
  base: Class,
  classes: RwLock<HashMap<String, Class>>,
}

fn registry() -> &'static Registry {
  static REGISTRY: OnceLock<Registry> = OnceLock::new();
  REGISTRY.get_or_init(|| {
    let base = Class::new(BASE_CLASS.to_owned(), None);
    let mut classes = HashMap::new();
    classes.insert(BASE_CLASS.to_owned(), base.clone());
    Registry {
      base,
      classes: RwLock::new(classes),
    }
  })
}

/// Resolve a role chain (most specific first) to its class.
///
/// Unknown roles are registered with the resolution of the rest of the chain
/// as parent. Registration is first-writer-wins: concurrent discovery of the
/// same role observes a single class.
///
/// ```
/// use axquery::a11y::resolve_class;
///
/// let close = resolve_class(&["AXCloseButton", "AXButton"]);
/// assert_eq!(close.name(), "CloseButton");
/// assert_eq!(close.parent().map(|p| p.name()), Some("Button"));
/// assert!(close.is_a("button"));
/// assert!(close.is_a("element"));
/// ```
pub fn resolve_class<R: AsRef<str>>(role_chain: &[R]) -> Class {
  let Some((first, rest)) = role_chain.split_first() else {
    return Class::base();
  };
  let name = unprefix(first.as_ref());
  if name.is_empty() {
    return resolve_class(rest);
  }
  if let Some(class) = registry().classes.read().get(name) {
    return class.clone();
  }

  let parent = resolve_class(rest);
  let mut classes = registry().classes.write();
  classes
    .entry(name.to_owned())
    .or_insert_with(|| {
      log::debug!("Registering class {name} < {}", parent.name());
      Class::new(name.to_owned(), Some(parent))
    })
    .clone()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::thread;

  #[test]
  fn empty_chain_is_base() {
    let class = resolve_class::<&str>(&[]);
    assert!(class.is_base());
    assert_eq!(class, Class::base());
    assert_eq!(class.key(), "element");
  }

  #[test]
  fn resolving_twice_returns_identical_class() {
    let a = resolve_class(&["AXRoleTestSlider"]);
    let b = resolve_class(&["AXRoleTestSlider"]);
    assert_eq!(a, b);
  }

  #[test]
  fn chain_builds_parents() {
    let class = resolve_class(&["AXRoleTestMinimize", "AXRoleTestTitleButton"]);
    assert_eq!(class.name(), "RoleTestMinimize");
    let parent = class.parent().cloned();
    assert_eq!(parent.as_ref().map(Class::name), Some("RoleTestTitleButton"));
    assert_eq!(
      parent.and_then(|p| p.parent().cloned()),
      Some(Class::base())
    );
  }

  #[test]
  fn roles_are_never_rebound() {
    let first = resolve_class(&["AXRoleTestRebind"]);
    let again = resolve_class(&["AXRoleTestRebind", "AXRoleTestOtherParent"]);
    assert_eq!(first, again);
    assert!(again.parent().is_some_and(Class::is_base));
  }

  #[test]
  fn empty_links_are_skipped() {
    let class = resolve_class(&["", "AXRoleTestNoSubrole"]);
    assert_eq!(class.name(), "RoleTestNoSubrole");
  }

  #[test]
  fn lookup_accepts_prefixed_names() {
    let class = resolve_class(&["AXRoleTestLookup"]);
    assert_eq!(Class::lookup("AXRoleTestLookup"), Some(class.clone()));
    assert_eq!(Class::lookup("RoleTestLookup"), Some(class));
    assert_eq!(Class::lookup("RoleTestNeverSeen"), None);
  }

  #[test]
  fn concurrent_discovery_yields_one_class() {
    let handles: Vec<_> = (0..8)
      .map(|_| thread::spawn(|| resolve_class(&["AXRoleTestRaced", "AXRoleTestRacedParent"])))
      .collect();
    let classes: Vec<Class> = handles
      .into_iter()
      .map(|h| h.join().expect("resolver thread panicked"))
      .collect();
    assert!(classes.windows(2).all(|w| w[0] == w[1]));
  }

  #[test]
  fn debug_shows_lineage() {
    let class = resolve_class(&["AXRoleTestDebugLeaf", "AXRoleTestDebugMid"]);
    assert_eq!(
      format!("{class:?}"),
      "Class(RoleTestDebugLeaf < RoleTestDebugMid < Element)"
    );
  }
}
