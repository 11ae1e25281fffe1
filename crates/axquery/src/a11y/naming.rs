/*!
Symbolic name normalisation and resolution.

Platform identifiers (`AXTitle`, `AXIsApplicationRunning`, `AXTitleUIElement`)
are exposed under snake-case names (`title`, `application_running`,
`title_ui_element`). A name array reported by a node is interned as a
[`NameShape`]; the shape owns a resolution table that is built on first lookup
and shared by every node reporting the same array.
*/

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Trailing marker for predicate-style lookups (`enabled?`).
pub const PREDICATE_MARKER: char = '?';

/// Strip a vendor/`AX` namespace prefix and an `Is` predicate marker.
///
/// ```
/// use axquery::a11y::unprefix;
///
/// assert_eq!(unprefix("AXTitle"), "Title");
/// assert_eq!(unprefix("AXIsApplicationRunning"), "ApplicationRunning");
/// assert_eq!(unprefix("MyAXWidget"), "MyAXWidget");
/// assert_eq!(unprefix("title"), "title");
/// ```
pub fn unprefix(identifier: &str) -> &str {
  let Some(ax) = identifier.find("AX") else {
    return identifier;
  };
  // Only an all-uppercase vendor prefix may precede `AX`.
  if !identifier[..ax].bytes().all(|b| b.is_ascii_uppercase()) {
    return identifier;
  }
  let rest = &identifier[ax + 2..];
  match rest.strip_prefix("Is") {
    Some(tail) if tail.starts_with(|c: char| c.is_ascii_uppercase()) => tail,
    _ => rest,
  }
}

/// Convert `CamelCase`, `kebab-case` or spaced words to `snake_case`.
///
/// Acronyms stay together: `TitleUIElement` becomes `title_ui_element`.
pub fn snake_case(name: &str) -> String {
  let chars: Vec<char> = name.chars().collect();
  let mut out = String::with_capacity(name.len() + 4);
  for (i, &c) in chars.iter().enumerate() {
    if c == '-' || c == ' ' || c == '_' {
      if !out.is_empty() && !out.ends_with('_') {
        out.push('_');
      }
      continue;
    }
    if c.is_uppercase() && i > 0 {
      let prev = chars[i - 1];
      let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
      let boundary = prev.is_lowercase()
        || prev.is_ascii_digit()
        || (prev.is_uppercase() && next_is_lower);
      if boundary && !out.is_empty() && !out.ends_with('_') {
        out.push('_');
      }
    }
    out.extend(c.to_lowercase());
  }
  while out.ends_with('_') {
    out.pop();
  }
  out
}

/// Normalise a symbolic or platform name into a lookup key.
///
/// A trailing [`PREDICATE_MARKER`] is kept so the caller can retry without it.
pub fn normalize(name: &str) -> String {
  let (stem, predicate) = match name.strip_suffix(PREDICATE_MARKER) {
    Some(stem) => (stem, true),
    None => (name, false),
  };
  let mut key = snake_case(unprefix(stem));
  if predicate {
    key.push(PREDICATE_MARKER);
  }
  key
}

/// An interned, ordered set of platform identifiers with its resolution table.
#[derive(Debug)]
pub struct NameShape {
  names: Arc<[String]>,
  table: OnceLock<HashMap<String, usize>>,
}

impl NameShape {
  fn new(names: Arc<[String]>) -> Self {
    Self {
      names,
      table: OnceLock::new(),
    }
  }

  /// The identifiers, in the order the service reported them.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// Whether the resolution table has been built yet.
  pub fn is_table_built(&self) -> bool {
    self.table.get().is_some()
  }

  fn table(&self) -> &HashMap<String, usize> {
    self.table.get_or_init(|| {
      log::debug!("Building resolution table for {} names", self.names.len());
      let mut table = HashMap::with_capacity(self.names.len());
      for (idx, name) in self.names.iter().enumerate() {
        // First identifier to claim a key keeps it
        table.entry(normalize(name)).or_insert(idx);
      }
      table
    })
  }

  /// Resolve a symbolic name to the identifier it denotes.
  ///
  /// Tries the normalised key first, then the key without its predicate marker.
  pub fn resolve(&self, name: &str) -> Option<&str> {
    let key = normalize(name);
    let table = self.table();
    table
      .get(&key)
      .or_else(|| {
        key
          .strip_suffix(PREDICATE_MARKER)
          .and_then(|stem| table.get(stem))
      })
      .and_then(|&idx| self.names.get(idx))
      .map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.resolve(name).is_some()
  }
}

type ShapeMap = HashMap<Arc<[String]>, Arc<NameShape>>;

fn shapes() -> &'static RwLock<ShapeMap> {
  static SHAPES: OnceLock<RwLock<ShapeMap>> = OnceLock::new();
  SHAPES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Intern a name array. Equal arrays share one [`NameShape`].
pub fn intern(names: Vec<String>) -> Arc<NameShape> {
  if let Some(shape) = shapes().read().get(names.as_slice()) {
    return Arc::clone(shape);
  }
  let mut map = shapes().write();
  if let Some(shape) = map.get(names.as_slice()) {
    return Arc::clone(shape);
  }
  let key: Arc<[String]> = names.into();
  let shape = Arc::new(NameShape::new(Arc::clone(&key)));
  map.insert(key, Arc::clone(&shape));
  shape
}
