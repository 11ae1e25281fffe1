/*!
Platform abstraction traits.

[`NodeService`] is the contract between the engine and whatever owns the
accessibility tree. The engine only talks to nodes through these primitives;
platform types never leak past an implementation.
*/

use std::fmt::Debug;
use std::hash::Hash;

use crate::a11y::RawValue;
use crate::types::{Point, ServiceResult};

/// Callback invoked by the service when a registered notification fires.
///
/// Receives the handle the notification was delivered for and the
/// notification identifier. May be called from any thread.
pub type NotificationCallback<H> = Box<dyn Fn(H, &str) + Send + Sync + 'static>;

/// Primitive operations on externally owned accessibility nodes.
///
/// Every call is a (potentially slow) round trip. Implementations report
/// failures as [`ServiceError`](crate::ServiceError); the engine surfaces them
/// unchanged.
pub trait NodeService: Send + Sync + Sized + 'static {
  /// Opaque node reference. Equal handles denote the same node.
  type Handle: Clone + Eq + Hash + Debug + Send + Sync + 'static;

  /// Live notification registration. Dropping it unsubscribes.
  type Subscription: Send + 'static;

  /// Role chain of a node, most specific first (e.g. subrole, role).
  fn role_of(&self, handle: &Self::Handle) -> ServiceResult<Vec<String>>;

  /// Attribute identifiers supported by a node, in service order.
  fn attribute_names(&self, handle: &Self::Handle) -> ServiceResult<Vec<String>>;

  /// Action identifiers supported by a node.
  fn action_names(&self, handle: &Self::Handle) -> ServiceResult<Vec<String>>;

  /// Parameterized attribute identifiers supported by a node.
  fn param_attribute_names(&self, handle: &Self::Handle) -> ServiceResult<Vec<String>>;

  /// Read an attribute. `None` means the attribute currently has no value.
  fn read_attribute(
    &self,
    handle: &Self::Handle,
    id: &str,
  ) -> ServiceResult<Option<RawValue<Self::Handle>>>;

  /// Read a parameterized attribute.
  fn read_param_attribute(
    &self,
    handle: &Self::Handle,
    id: &str,
    param: &RawValue<Self::Handle>,
  ) -> ServiceResult<Option<RawValue<Self::Handle>>>;

  fn attribute_writable(&self, handle: &Self::Handle, id: &str) -> ServiceResult<bool>;

  fn write_attribute(
    &self,
    handle: &Self::Handle,
    id: &str,
    value: &RawValue<Self::Handle>,
  ) -> ServiceResult<()>;

  fn perform_action(&self, handle: &Self::Handle, id: &str) -> ServiceResult<()>;

  /// Register `callback` for notification `id` on `handle`.
  fn register_notification(
    &self,
    handle: &Self::Handle,
    id: &str,
    callback: NotificationCallback<Self::Handle>,
  ) -> ServiceResult<Self::Subscription>;

  /// Process ID of the application owning a node.
  fn pid_of(&self, handle: &Self::Handle) -> ServiceResult<u32>;

  /// Round-trip timeout for one node, or for every node when `handle` is `None`.
  fn set_timeout(&self, handle: Option<&Self::Handle>, seconds: f32) -> ServiceResult<()>;

  /// Deepest node at a screen point, within the tree of `handle`.
  fn element_at_point(
    &self,
    handle: &Self::Handle,
    point: Point,
  ) -> ServiceResult<Option<Self::Handle>>;
}
