/*!
Element proxy.

An [`Element`] wraps one service handle. Its class is resolved from the
node's role chain and its attribute names are captured when it is wrapped;
action and parameterized-attribute names are fetched on first use. Symbolic
names (`title`, `main_window`, `enabled?`) resolve against those name shapes.
*/

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use super::{Config, Shared};
use crate::a11y::{intern, resolve_class, Class, NameShape, RawValue, Value};
use crate::platform::NodeService;
use crate::types::{AxError, AxResult, Bounds, NameKind, Point, ProcessId};

const CHILDREN: &str = "children";
const PARENT: &str = "parent";
const POSITION: &str = "position";
const SIZE: &str = "size";

struct ElementInner<S: NodeService> {
  shared: Arc<Shared<S>>,
  handle: S::Handle,
  class: Class,
  attributes: Arc<NameShape>,
  actions: OnceLock<Arc<NameShape>>,
  params: OnceLock<Arc<NameShape>>,
  pid: OnceLock<ProcessId>,
}

/// Proxy for a node in the accessibility tree.
///
/// Clone is cheap. Two elements are equal when they wrap the same handle.
pub struct Element<S: NodeService>(Arc<ElementInner<S>>);

impl<S: NodeService> Clone for Element<S> {
  fn clone(&self) -> Self {
    Self(Arc::clone(&self.0))
  }
}

impl<S: NodeService> PartialEq for Element<S> {
  fn eq(&self, other: &Self) -> bool {
    self.0.handle == other.0.handle
  }
}

impl<S: NodeService> Eq for Element<S> {}

impl<S: NodeService> Hash for Element<S> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.handle.hash(state);
  }
}

impl<S: NodeService> fmt::Debug for Element<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Element")
      .field("class", &self.0.class.name())
      .field("handle", &self.0.handle)
      .finish()
  }
}

impl<S: NodeService> Element<S> {
  pub(crate) fn wrap(shared: Arc<Shared<S>>, handle: S::Handle) -> AxResult<Self> {
    let roles = shared.service.role_of(&handle)?;
    let class = resolve_class(&roles);
    let attributes = intern(shared.service.attribute_names(&handle)?);
    log::trace!("Wrapped {handle:?} as {class}");
    Ok(Self(Arc::new(ElementInner {
      shared,
      handle,
      class,
      attributes,
      actions: OnceLock::new(),
      params: OnceLock::new(),
      pid: OnceLock::new(),
    })))
  }

  /// Wrap another handle from the same session.
  pub(crate) fn adopt(&self, handle: S::Handle) -> AxResult<Self> {
    Self::wrap(Arc::clone(&self.0.shared), handle)
  }

  pub(crate) fn massage(&self, raw: Option<RawValue<S::Handle>>) -> AxResult<Value<S>> {
    match raw {
      Some(raw) => Value::massage(raw, &mut |handle| self.adopt(handle)),
      None => Ok(Value::Null),
    }
  }

  pub(crate) fn config(&self) -> Config {
    self.0.shared.config.read().clone()
  }

  pub(crate) fn lookup_failure(&self, kind: NameKind, name: &str) -> AxError {
    AxError::LookupFailure {
      kind,
      name: name.to_owned(),
      element: self.describe(),
    }
  }

  pub fn handle(&self) -> &S::Handle {
    &self.0.handle
  }

  pub fn class(&self) -> &Class {
    &self.0.class
  }

  pub fn service(&self) -> &S {
    &self.0.shared.service
  }

  /// Attribute identifiers as reported when this element was wrapped.
  pub fn attribute_names(&self) -> &[String] {
    self.0.attributes.names()
  }

  pub(crate) fn attribute_shape(&self) -> &NameShape {
    &self.0.attributes
  }

  pub fn has_attribute(&self, name: &str) -> bool {
    self.0.attributes.contains(name)
  }

  pub(crate) fn action_shape(&self) -> AxResult<&NameShape> {
    if let Some(shape) = self.0.actions.get() {
      return Ok(shape);
    }
    let shape = intern(self.service().action_names(self.handle())?);
    Ok(self.0.actions.get_or_init(|| shape))
  }

  pub(crate) fn param_shape(&self) -> AxResult<&NameShape> {
    if let Some(shape) = self.0.params.get() {
      return Ok(shape);
    }
    let shape = intern(self.service().param_attribute_names(self.handle())?);
    Ok(self.0.params.get_or_init(|| shape))
  }

  pub fn action_names(&self) -> AxResult<Vec<String>> {
    Ok(self.action_shape()?.names().to_vec())
  }

  pub fn param_attribute_names(&self) -> AxResult<Vec<String>> {
    Ok(self.param_shape()?.names().to_vec())
  }

  pub fn has_action(&self, name: &str) -> AxResult<bool> {
    Ok(self.action_shape()?.contains(name))
  }

  fn resolve_attribute(&self, name: &str) -> AxResult<&str> {
    self
      .0
      .attributes
      .resolve(name)
      .ok_or_else(|| self.lookup_failure(NameKind::Attribute, name))
  }

  pub(crate) fn read_id(&self, id: &str) -> AxResult<Value<S>> {
    let raw = self.service().read_attribute(self.handle(), id)?;
    self.massage(raw)
  }

  pub(crate) fn read_param_id(&self, id: &str, param: &Value<S>) -> AxResult<Value<S>> {
    let raw = self
      .service()
      .read_param_attribute(self.handle(), id, &param.to_raw())?;
    self.massage(raw)
  }

  /// Read an attribute. A known attribute without a value reads as `Null`.
  pub fn attribute(&self, name: &str) -> AxResult<Value<S>> {
    let id = self.resolve_attribute(name)?;
    self.read_id(id)
  }

  /// Like [`attribute`](Self::attribute), but `None` for names this element lacks.
  pub fn try_attribute(&self, name: &str) -> AxResult<Option<Value<S>>> {
    match self.0.attributes.resolve(name) {
      Some(id) => self.read_id(id).map(Some),
      None => Ok(None),
    }
  }

  pub fn string_attribute(&self, name: &str) -> AxResult<Option<String>> {
    Ok(self.attribute(name)?.as_str().map(str::to_owned))
  }

  pub fn bool_attribute(&self, name: &str) -> AxResult<Option<bool>> {
    Ok(self.attribute(name)?.as_bool())
  }

  pub fn attribute_writable(&self, name: &str) -> AxResult<bool> {
    let id = self.resolve_attribute(name)?;
    Ok(self.service().attribute_writable(self.handle(), id)?)
  }

  /// Write an attribute, returning the value that was set.
  pub fn set_attribute(&self, name: &str, value: impl Into<Value<S>>) -> AxResult<Value<S>> {
    let value = value.into();
    let id = self.resolve_attribute(name)?;
    if !self.service().attribute_writable(self.handle(), id)? {
      return Err(AxError::ReadOnlyAttribute {
        name: name.to_owned(),
        element: self.describe(),
      });
    }
    self
      .service()
      .write_attribute(self.handle(), id, &value.to_raw())?;
    Ok(value)
  }

  pub fn param_attribute(&self, name: &str, param: impl Into<Value<S>>) -> AxResult<Value<S>> {
    let id = self
      .param_shape()?
      .resolve(name)
      .ok_or_else(|| self.lookup_failure(NameKind::ParamAttribute, name))?;
    self.read_param_id(id, &param.into())
  }

  /// Perform an action. The element may be stale afterwards.
  pub fn perform_action(&self, name: &str) -> AxResult<()> {
    let id = self
      .action_shape()?
      .resolve(name)
      .ok_or_else(|| self.lookup_failure(NameKind::Action, name))?;
    log::debug!("Performing {id} on {}", self.class());
    Ok(self.service().perform_action(self.handle(), id)?)
  }

  /// Child elements in service order. Children that cannot be wrapped are skipped.
  pub fn children(&self) -> AxResult<Vec<Self>> {
    let Some(id) = self.0.attributes.resolve(CHILDREN) else {
      return Ok(Vec::new());
    };
    let items = match self.service().read_attribute(self.handle(), id)? {
      Some(RawValue::Array(items)) => items,
      Some(single) => vec![single],
      None => Vec::new(),
    };
    Ok(
      items
        .into_iter()
        .filter_map(|item| match item {
          RawValue::Handle(handle) => self
            .adopt(handle)
            .map_err(|err| log::debug!("Skipping child of {}: {err}", self.class()))
            .ok(),
          other => {
            log::debug!("Ignoring {} in children of {}", other.kind(), self.class());
            None
          }
        })
        .collect(),
    )
  }

  pub fn parent(&self) -> AxResult<Option<Self>> {
    Ok(self.try_attribute(PARENT)?.and_then(Value::into_element))
  }

  /// This element followed by its ancestors, ending at the root.
  pub fn ancestry(&self) -> AxResult<Vec<Self>> {
    let mut chain = vec![self.clone()];
    let mut seen = HashSet::from([self.handle().clone()]);
    let mut current = self.clone();
    while let Some(parent) = current.parent()? {
      if !seen.insert(parent.handle().clone()) {
        log::debug!("Parent cycle at {}", parent.class());
        break;
      }
      chain.push(parent.clone());
      current = parent;
    }
    Ok(chain)
  }

  /// The topmost ancestor, normally the application element.
  pub fn application(&self) -> AxResult<Self> {
    let mut chain = self.ancestry()?;
    Ok(chain.pop().unwrap_or_else(|| self.clone()))
  }

  /// Deepest element at a screen point within this element's tree.
  pub fn element_at(&self, point: Point) -> AxResult<Option<Self>> {
    self
      .service()
      .element_at_point(self.handle(), point)?
      .map(|handle| self.adopt(handle))
      .transpose()
  }

  pub fn pid(&self) -> AxResult<ProcessId> {
    if let Some(pid) = self.0.pid.get() {
      return Ok(*pid);
    }
    let pid = ProcessId(self.service().pid_of(self.handle())?);
    Ok(*self.0.pid.get_or_init(|| pid))
  }

  /// Round-trip timeout for this element only.
  pub fn set_timeout(&self, secs: f32) -> AxResult<()> {
    Ok(self.service().set_timeout(Some(self.handle()), secs)?)
  }

  /// Whether the node still exists.
  pub fn is_valid(&self) -> bool {
    self.service().role_of(self.handle()).is_ok()
  }

  /// Screen frame from `position` and `size`, if the element has both.
  pub fn bounds(&self) -> AxResult<Option<Bounds>> {
    let (Some(position), Some(size)) = (self.try_attribute(POSITION)?, self.try_attribute(SIZE)?)
    else {
      return Ok(None);
    };
    Ok(
      position
        .as_point()
        .zip(size.as_size())
        .map(|(origin, size)| Bounds::from_parts(origin, size)),
    )
  }

  /// Centre of [`bounds`](Self::bounds).
  pub fn to_point(&self) -> AxResult<Option<Point>> {
    Ok(self.bounds()?.map(|b| b.center()))
  }
}
