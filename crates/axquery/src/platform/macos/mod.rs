/*!
macOS node service over the Accessibility API.

Requires the accessibility permission. Notification callbacks are delivered
through the main run loop, which the host application must run.
*/

#![allow(unsafe_code)]

mod boxing;
mod handles;
mod mapping;
mod observer;

use objc2_application_services::AXIsProcessTrusted;
use objc2_core_foundation::{CFString, CFType};

pub use handles::AxHandle;
pub use observer::MacSubscription;

use self::boxing::{to_cf, unbox};
use self::mapping::service_error;
use crate::a11y::RawValue;
use crate::platform::{NodeService, NotificationCallback};
use crate::types::{Point, ServiceError, ServiceResult};

/// Check if accessibility permissions are granted.
pub fn has_permissions() -> bool {
  unsafe { AXIsProcessTrusted() }
}

/// The macOS accessibility service.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacOs {
  _private: (),
}

impl MacOs {
  /// Fails with [`ServiceError::PermissionDenied`] when this process is not trusted.
  pub fn new() -> ServiceResult<Self> {
    if !has_permissions() {
      return Err(ServiceError::PermissionDenied);
    }
    Ok(Self { _private: () })
  }

  /// Application node for a running process.
  pub fn application(&self, pid: u32) -> AxHandle {
    AxHandle::application(pid)
  }

  /// The system-wide node, root of every application.
  pub fn system_wide(&self) -> AxHandle {
    AxHandle::system_wide()
  }

  fn string_attribute(&self, handle: &AxHandle, id: &str) -> ServiceResult<Option<String>> {
    Ok(match self.read_attribute(handle, id)? {
      Some(RawValue::String(s)) if !s.is_empty() => Some(s),
      _ => None,
    })
  }
}

fn unbox_for(id: &str, value: &CFType) -> ServiceResult<RawValue<AxHandle>> {
  unbox(value).map_err(|err| match err {
    ServiceError::NotSupported(what) => ServiceError::NotSupported(format!("{id}: {what}")),
    other => other,
  })
}

impl NodeService for MacOs {
  type Handle = AxHandle;
  type Subscription = MacSubscription;

  fn role_of(&self, handle: &AxHandle) -> ServiceResult<Vec<String>> {
    let role = self.string_attribute(handle, "AXRole")?;
    let subrole = match self.string_attribute(handle, "AXSubrole") {
      Ok(subrole) => subrole,
      Err(ServiceError::NotSupported(_)) => None,
      Err(err) => return Err(err),
    };
    Ok(subrole.into_iter().chain(role).collect())
  }

  fn attribute_names(&self, handle: &AxHandle) -> ServiceResult<Vec<String>> {
    handle
      .attribute_names()
      .map_err(|e| service_error(e, "list attributes"))
  }

  fn action_names(&self, handle: &AxHandle) -> ServiceResult<Vec<String>> {
    handle
      .action_names()
      .map_err(|e| service_error(e, "list actions"))
  }

  fn param_attribute_names(&self, handle: &AxHandle) -> ServiceResult<Vec<String>> {
    handle
      .param_attribute_names()
      .map_err(|e| service_error(e, "list parameterized attributes"))
  }

  fn read_attribute(&self, handle: &AxHandle, id: &str) -> ServiceResult<Option<RawValue<AxHandle>>> {
    let value = handle
      .copy_attribute(&CFString::from_str(id))
      .map_err(|e| service_error(e, &format!("read {id}")))?;
    value.map(|v| unbox_for(id, &v)).transpose()
  }

  fn read_param_attribute(
    &self,
    handle: &AxHandle,
    id: &str,
    param: &RawValue<AxHandle>,
  ) -> ServiceResult<Option<RawValue<AxHandle>>> {
    let param = to_cf(param)?;
    let value = handle
      .copy_param_attribute(&CFString::from_str(id), &param)
      .map_err(|e| service_error(e, &format!("read {id}")))?;
    value.map(|v| unbox_for(id, &v)).transpose()
  }

  fn attribute_writable(&self, handle: &AxHandle, id: &str) -> ServiceResult<bool> {
    handle
      .is_settable(&CFString::from_str(id))
      .map_err(|e| service_error(e, &format!("check {id}")))
  }

  fn write_attribute(&self, handle: &AxHandle, id: &str, value: &RawValue<AxHandle>) -> ServiceResult<()> {
    let value = to_cf(value)?;
    handle
      .set_attribute(&CFString::from_str(id), &value)
      .map_err(|e| service_error(e, &format!("write {id}")))
  }

  fn perform_action(&self, handle: &AxHandle, id: &str) -> ServiceResult<()> {
    handle
      .perform_action(&CFString::from_str(id))
      .map_err(|e| service_error(e, &format!("perform {id}")))
  }

  fn register_notification(
    &self,
    handle: &AxHandle,
    id: &str,
    callback: NotificationCallback<AxHandle>,
  ) -> ServiceResult<MacSubscription> {
    let pid = self.pid_of(handle)?;
    observer::subscribe(handle, pid, id, callback)
  }

  fn pid_of(&self, handle: &AxHandle) -> ServiceResult<u32> {
    handle.pid().map_err(|e| service_error(e, "read pid"))
  }

  fn set_timeout(&self, handle: Option<&AxHandle>, seconds: f32) -> ServiceResult<()> {
    let result = match handle {
      Some(handle) => handle.set_timeout(seconds),
      None => AxHandle::system_wide().set_timeout(seconds),
    };
    result.map_err(|e| service_error(e, "set timeout"))
  }

  fn element_at_point(&self, handle: &AxHandle, point: Point) -> ServiceResult<Option<AxHandle>> {
    handle
      .element_at(point.x, point.y)
      .map_err(|e| service_error(e, &format!("hit test {point:?}")))
  }
}
