/*!
In-memory node service.

`MemoryTree` holds a small accessibility tree in process so searches and
attribute access can be exercised without a live desktop. It models the parts
of a real service that matter to the engine: `AXRole`/`AXSubrole`,
`AXParent`/`AXChildren`, writable attributes, actions, parameterized
attributes, notifications, and injected failures.
*/

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::traits::{NodeService, NotificationCallback};
use crate::a11y::RawValue;
use crate::types::{Bounds, Point, ServiceError, ServiceResult};

const ROLE: &str = "AXRole";
const SUBROLE: &str = "AXSubrole";
const PARENT: &str = "AXParent";
const CHILDREN: &str = "AXChildren";
const POSITION: &str = "AXPosition";
const SIZE: &str = "AXSize";

const DEFAULT_PID: u32 = 1;

/// Handle into a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemHandle(usize);

impl MemHandle {
  pub const fn index(self) -> usize {
    self.0
  }
}

/// Computes a parameterized attribute from its parameter.
pub type ParamFn = Arc<dyn Fn(&RawValue<MemHandle>) -> Option<RawValue<MemHandle>> + Send + Sync>;

struct Node {
  roles: Vec<String>,
  pid: u32,
  parent: Option<MemHandle>,
  children: Vec<MemHandle>,
  attributes: Vec<(String, Option<RawValue<MemHandle>>)>,
  hidden: HashSet<String>,
  writable: HashSet<String>,
  actions: Vec<String>,
  params: Vec<(String, ParamFn)>,
  broken: HashSet<String>,
  destroyed: bool,
}

impl Node {
  fn new(roles: &[&str], parent: Option<MemHandle>, pid: u32) -> Self {
    Self {
      roles: roles.iter().map(|r| (*r).to_owned()).collect(),
      pid,
      parent,
      children: Vec::new(),
      attributes: Vec::new(),
      hidden: HashSet::new(),
      writable: HashSet::new(),
      actions: Vec::new(),
      params: Vec::new(),
      broken: HashSet::new(),
      destroyed: false,
    }
  }

  fn attribute_names(&self) -> Vec<String> {
    let mut names = vec![ROLE.to_owned()];
    if self.roles.len() > 1 {
      names.push(SUBROLE.to_owned());
    }
    if self.parent.is_some() {
      names.push(PARENT.to_owned());
    }
    names.push(CHILDREN.to_owned());
    names.extend(self.attributes.iter().map(|(name, _)| name.clone()));
    names.retain(|name| !self.hidden.contains(name));
    names
  }

  fn custom(&self, id: &str) -> Option<&Option<RawValue<MemHandle>>> {
    self
      .attributes
      .iter()
      .find(|(name, _)| name == id)
      .map(|(_, value)| value)
  }

  fn bounds(&self) -> Option<Bounds> {
    let origin = match self.custom(POSITION) {
      Some(Some(RawValue::Point(p))) => *p,
      _ => return None,
    };
    let size = match self.custom(SIZE) {
      Some(Some(RawValue::Size(s))) => *s,
      _ => return None,
    };
    Some(Bounds::from_parts(origin, size))
  }
}

struct Registration {
  id: u64,
  handle: MemHandle,
  notification: String,
  callback: Arc<NotificationCallback<MemHandle>>,
}

type Registrations = Arc<Mutex<Vec<Registration>>>;

/// Live notification registration on a [`MemoryTree`]. Unsubscribes on drop.
pub struct MemSubscription {
  registrations: Registrations,
  id: u64,
}

impl Drop for MemSubscription {
  fn drop(&mut self) {
    self.registrations.lock().retain(|r| r.id != self.id);
  }
}

impl fmt::Debug for MemSubscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemSubscription").field("id", &self.id).finish()
  }
}

/// An accessibility tree held in memory.
pub struct MemoryTree {
  nodes: RwLock<Vec<Node>>,
  registrations: Registrations,
  next_registration: AtomicU64,
  timeouts: Mutex<HashMap<Option<MemHandle>, f32>>,
  performed: Mutex<Vec<(MemHandle, String)>>,
  reads: AtomicUsize,
}

impl fmt::Debug for MemoryTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryTree")
      .field("nodes", &self.nodes.read().len())
      .finish_non_exhaustive()
  }
}

impl Default for MemoryTree {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryTree {
  pub fn new() -> Self {
    Self {
      nodes: RwLock::new(Vec::new()),
      registrations: Arc::new(Mutex::new(Vec::new())),
      next_registration: AtomicU64::new(1),
      timeouts: Mutex::new(HashMap::new()),
      performed: Mutex::new(Vec::new()),
      reads: AtomicUsize::new(0),
    }
  }

  /// Add a parentless node. `roles` is most specific first.
  pub fn add_root(&self, roles: &[&str]) -> MemHandle {
    let mut nodes = self.nodes.write();
    nodes.push(Node::new(roles, None, DEFAULT_PID));
    MemHandle(nodes.len() - 1)
  }

  /// Add a node as the last child of `parent`. Inherits the parent's pid.
  pub fn add_child(&self, parent: MemHandle, roles: &[&str]) -> MemHandle {
    let mut nodes = self.nodes.write();
    let pid = nodes.get(parent.0).map_or(DEFAULT_PID, |p| p.pid);
    nodes.push(Node::new(roles, Some(parent), pid));
    let child = MemHandle(nodes.len() - 1);
    if let Some(p) = nodes.get_mut(parent.0) {
      p.children.push(child);
    }
    child
  }

  /// Also list an existing node among `parent`'s children, leaving its own
  /// parent unchanged. Lets a tree report a node twice or form a cycle.
  pub fn link_child(&self, parent: MemHandle, child: MemHandle) {
    self.with_node(parent, |p| p.children.push(child));
  }

  fn with_node<R>(&self, handle: MemHandle, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
    self.nodes.write().get_mut(handle.0).map(f)
  }

  /// Set (or add) an attribute value.
  pub fn set_attribute(&self, handle: MemHandle, id: &str, value: RawValue<MemHandle>) {
    self.with_node(handle, |node| {
      node.hidden.remove(id);
      match node.attributes.iter_mut().find(|(name, _)| name == id) {
        Some((_, slot)) => *slot = Some(value),
        None => node.attributes.push((id.to_owned(), Some(value))),
      }
    });
  }

  /// Declare an attribute that is supported but currently has no value.
  pub fn declare_attribute(&self, handle: MemHandle, id: &str) {
    self.with_node(handle, |node| {
      if node.custom(id).is_none() {
        node.attributes.push((id.to_owned(), None));
      }
    });
  }

  /// Stop reporting an attribute (including the built-in ones).
  pub fn hide_attribute(&self, handle: MemHandle, id: &str) {
    self.with_node(handle, |node| node.hidden.insert(id.to_owned()));
  }

  pub fn set_writable(&self, handle: MemHandle, id: &str) {
    self.with_node(handle, |node| node.writable.insert(id.to_owned()));
  }

  pub fn add_action(&self, handle: MemHandle, id: &str) {
    self.with_node(handle, |node| node.actions.push(id.to_owned()));
  }

  pub fn add_param_attribute<F>(&self, handle: MemHandle, id: &str, compute: F)
  where
    F: Fn(&RawValue<MemHandle>) -> Option<RawValue<MemHandle>> + Send + Sync + 'static,
  {
    let compute: ParamFn = Arc::new(compute);
    self.with_node(handle, |node| node.params.push((id.to_owned(), compute)));
  }

  pub fn set_pid(&self, handle: MemHandle, pid: u32) {
    self.with_node(handle, |node| node.pid = pid);
  }

  /// Make reading `id` on this node fail while still listing it.
  pub fn break_attribute(&self, handle: MemHandle, id: &str) {
    self.with_node(handle, |node| node.broken.insert(id.to_owned()));
  }

  /// Make reading `AXChildren` on this node fail.
  pub fn break_children(&self, handle: MemHandle) {
    self.break_attribute(handle, CHILDREN);
  }

  /// Invalidate a node: every later call on it fails with `InvalidHandle`.
  pub fn destroy(&self, handle: MemHandle) {
    self.with_node(handle, |node| node.destroyed = true);
  }

  /// Deliver `notification` to callbacks registered on `handle`.
  pub fn post(&self, handle: MemHandle, notification: &str) {
    self.post_for(handle, notification, handle);
  }

  /// Deliver `notification` registered on `handle`, reporting `subject` as the node.
  pub fn post_for(&self, handle: MemHandle, notification: &str, subject: MemHandle) {
    let callbacks: Vec<_> = self
      .registrations
      .lock()
      .iter()
      .filter(|r| r.handle == handle && r.notification == notification)
      .map(|r| Arc::clone(&r.callback))
      .collect();
    for callback in callbacks {
      callback(subject, notification);
    }
  }

  /// Number of live notification registrations.
  pub fn subscription_count(&self) -> usize {
    self.registrations.lock().len()
  }

  /// Actions performed so far, in order.
  pub fn performed_actions(&self) -> Vec<(MemHandle, String)> {
    self.performed.lock().clone()
  }

  /// Number of `read_attribute` round trips so far.
  pub fn read_count(&self) -> usize {
    self.reads.load(Ordering::Relaxed)
  }

  /// Timeout last set for `handle` (`None` for the global timeout).
  pub fn timeout(&self, handle: Option<MemHandle>) -> Option<f32> {
    self.timeouts.lock().get(&handle).copied()
  }

  fn read<R>(
    &self,
    handle: &MemHandle,
    f: impl FnOnce(&Node) -> ServiceResult<R>,
  ) -> ServiceResult<R> {
    let nodes = self.nodes.read();
    match nodes.get(handle.0) {
      Some(node) if !node.destroyed => f(node),
      _ => Err(ServiceError::InvalidHandle),
    }
  }

  fn deepest_at(nodes: &[Node], handle: MemHandle, point: Point) -> Option<MemHandle> {
    let node = nodes.get(handle.0)?;
    if node.destroyed || !node.bounds().is_some_and(|b| b.contains(point)) {
      return None;
    }
    node
      .children
      .iter()
      .rev()
      .find_map(|&child| Self::deepest_at(nodes, child, point))
      .or(Some(handle))
  }
}

impl NodeService for MemoryTree {
  type Handle = MemHandle;
  type Subscription = MemSubscription;

  fn role_of(&self, handle: &MemHandle) -> ServiceResult<Vec<String>> {
    self.read(handle, |node| Ok(node.roles.clone()))
  }

  fn attribute_names(&self, handle: &MemHandle) -> ServiceResult<Vec<String>> {
    self.read(handle, |node| Ok(node.attribute_names()))
  }

  fn action_names(&self, handle: &MemHandle) -> ServiceResult<Vec<String>> {
    self.read(handle, |node| Ok(node.actions.clone()))
  }

  fn param_attribute_names(&self, handle: &MemHandle) -> ServiceResult<Vec<String>> {
    self.read(handle, |node| {
      Ok(node.params.iter().map(|(name, _)| name.clone()).collect())
    })
  }

  fn read_attribute(
    &self,
    handle: &MemHandle,
    id: &str,
  ) -> ServiceResult<Option<RawValue<MemHandle>>> {
    self.reads.fetch_add(1, Ordering::Relaxed);
    self.read(handle, |node| {
      if node.hidden.contains(id) {
        return Err(ServiceError::NotSupported(id.to_owned()));
      }
      if node.broken.contains(id) {
        return Err(ServiceError::Failed(format!("{id} unavailable")));
      }
      match id {
        ROLE => Ok(node.roles.last().cloned().map(RawValue::String)),
        SUBROLE if node.roles.len() > 1 => Ok(node.roles.first().cloned().map(RawValue::String)),
        PARENT => Ok(node.parent.map(RawValue::Handle)),
        CHILDREN => Ok(Some(RawValue::Array(
          node.children.iter().copied().map(RawValue::Handle).collect(),
        ))),
        _ => node
          .custom(id)
          .cloned()
          .ok_or_else(|| ServiceError::NotSupported(id.to_owned())),
      }
    })
  }

  fn read_param_attribute(
    &self,
    handle: &MemHandle,
    id: &str,
    param: &RawValue<MemHandle>,
  ) -> ServiceResult<Option<RawValue<MemHandle>>> {
    let compute = self.read(handle, |node| {
      node
        .params
        .iter()
        .find(|(name, _)| name == id)
        .map(|(_, f)| Arc::clone(f))
        .ok_or_else(|| ServiceError::NotSupported(id.to_owned()))
    })?;
    Ok(compute(param))
  }

  fn attribute_writable(&self, handle: &MemHandle, id: &str) -> ServiceResult<bool> {
    self.read(handle, |node| Ok(node.writable.contains(id)))
  }

  fn write_attribute(
    &self,
    handle: &MemHandle,
    id: &str,
    value: &RawValue<MemHandle>,
  ) -> ServiceResult<()> {
    self.read(handle, |node| {
      if node.writable.contains(id) {
        Ok(())
      } else {
        Err(ServiceError::Failed(format!("{id} is not settable")))
      }
    })?;
    self.set_attribute(*handle, id, value.clone());
    Ok(())
  }

  fn perform_action(&self, handle: &MemHandle, id: &str) -> ServiceResult<()> {
    self.read(handle, |node| {
      if node.actions.iter().any(|a| a == id) {
        Ok(())
      } else {
        Err(ServiceError::NotSupported(id.to_owned()))
      }
    })?;
    self.performed.lock().push((*handle, id.to_owned()));
    Ok(())
  }

  fn register_notification(
    &self,
    handle: &MemHandle,
    id: &str,
    callback: NotificationCallback<MemHandle>,
  ) -> ServiceResult<MemSubscription> {
    self.read(handle, |_| Ok(()))?;
    let registration = self.next_registration.fetch_add(1, Ordering::Relaxed);
    self.registrations.lock().push(Registration {
      id: registration,
      handle: *handle,
      notification: id.to_owned(),
      callback: Arc::new(callback),
    });
    Ok(MemSubscription {
      registrations: Arc::clone(&self.registrations),
      id: registration,
    })
  }

  fn pid_of(&self, handle: &MemHandle) -> ServiceResult<u32> {
    self.read(handle, |node| Ok(node.pid))
  }

  fn set_timeout(&self, handle: Option<&MemHandle>, seconds: f32) -> ServiceResult<()> {
    if let Some(h) = handle {
      self.read(h, |_| Ok(()))?;
    }
    self.timeouts.lock().insert(handle.copied(), seconds);
    Ok(())
  }

  fn element_at_point(&self, handle: &MemHandle, point: Point) -> ServiceResult<Option<MemHandle>> {
    self.read(handle, |_| Ok(()))?;
    Ok(Self::deepest_at(&self.nodes.read(), *handle, point))
  }
}

/// Geometry helpers for building trees in tests.
impl MemoryTree {
  /// Give a node `AXPosition` and `AXSize` attributes.
  pub fn set_frame(&self, handle: MemHandle, frame: Bounds) {
    self.set_attribute(handle, POSITION, RawValue::Point(frame.origin()));
    self.set_attribute(handle, SIZE, RawValue::Size(frame.size()));
  }
}
