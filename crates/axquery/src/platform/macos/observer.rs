/*!
Notification observers.

Each subscription owns one `AXObserver` whose run loop source is added to the
main run loop. Callbacks only fire while that run loop is running.

macOS hands observer callbacks a raw `refcon` pointer, so callbacks are kept
in a registry keyed by a stable id and the id travels as the `refcon`.
*/

#![allow(unsafe_code)]

use objc2_application_services::{AXError, AXObserver, AXUIElement};
use objc2_core_foundation::{kCFRunLoopDefaultMode, CFRetained, CFRunLoop, CFString};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use super::handles::AxHandle;
use super::mapping::service_error;
use crate::platform::NotificationCallback;
use crate::types::{ServiceError, ServiceResult};

type Callback = Arc<NotificationCallback<AxHandle>>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

static CONTEXTS: LazyLock<Mutex<HashMap<u64, Callback>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

/// Live registration. Dropping it removes the notification and the observer.
pub struct MacSubscription {
  observer: CFRetained<AXObserver>,
  target: AxHandle,
  notification: CFRetained<CFString>,
  context_id: u64,
}

// The observer is only used again in Drop.
unsafe impl Send for MacSubscription {}

impl Drop for MacSubscription {
  fn drop(&mut self) {
    unsafe {
      let _ = self
        .observer
        .remove_notification(self.target.inner(), &self.notification);
      if let Some(main) = CFRunLoop::main() {
        main.remove_source(Some(&self.observer.run_loop_source()), kCFRunLoopDefaultMode);
      }
    }
    CONTEXTS.lock().remove(&self.context_id);
  }
}

fn create_observer(pid: u32) -> ServiceResult<CFRetained<AXObserver>> {
  let mut observer_ptr: *mut AXObserver = std::ptr::null_mut();
  #[allow(clippy::cast_possible_wrap)] // PIDs are always positive and < i32::MAX
  let result = unsafe {
    AXObserver::create(
      pid as i32,
      Some(observer_callback),
      NonNull::from(&mut observer_ptr),
    )
  };
  if result != AXError::Success {
    return Err(service_error(result, &format!("create observer for pid {pid}")));
  }
  let ptr = NonNull::new(observer_ptr)
    .ok_or_else(|| ServiceError::Failed("AXObserverCreate returned null".into()))?;
  let observer = unsafe { CFRetained::from_raw(ptr) };

  // Callbacks only fire for sources on a running run loop
  unsafe {
    if let Some(main) = CFRunLoop::main() {
      main.add_source(Some(&observer.run_loop_source()), kCFRunLoopDefaultMode);
    }
  }
  Ok(observer)
}

/// Register `callback` for `notification` on `target`.
pub(super) fn subscribe(
  target: &AxHandle,
  pid: u32,
  notification: &str,
  callback: NotificationCallback<AxHandle>,
) -> ServiceResult<MacSubscription> {
  let observer = create_observer(pid)?;
  let context_id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
  CONTEXTS.lock().insert(context_id, Arc::new(callback));

  let name = CFString::from_str(notification);
  #[allow(clippy::cast_possible_truncation)]
  let refcon = context_id as usize as *mut c_void;
  let result = unsafe { observer.add_notification(target.inner(), &name, refcon) };
  if result != AXError::Success {
    CONTEXTS.lock().remove(&context_id);
    if let Some(main) = CFRunLoop::main() {
      unsafe { main.remove_source(Some(&observer.run_loop_source()), kCFRunLoopDefaultMode) };
    }
    return Err(service_error(result, &format!("observe {notification}")));
  }
  log::debug!("Observing {notification} on {target:?} (context {context_id})");

  Ok(MacSubscription {
    observer,
    target: target.clone(),
    notification: name,
    context_id,
  })
}

unsafe extern "C-unwind" fn observer_callback(
  _observer: NonNull<AXObserver>,
  element: NonNull<AXUIElement>,
  notification: NonNull<CFString>,
  refcon: *mut c_void,
) {
  use std::panic::AssertUnwindSafe;

  let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
    let context_id = refcon as usize as u64;
    // Clone out so the registry lock is not held while the callback runs
    let Some(callback) = CONTEXTS.lock().get(&context_id).cloned() else {
      return;
    };
    let name = unsafe { notification.as_ref() }.to_string();
    let handle = AxHandle::new(unsafe { CFRetained::retain(element) });
    callback(handle, &name);
  }));

  if result.is_err() {
    log::warn!("Accessibility notification handler panicked");
  }
}
