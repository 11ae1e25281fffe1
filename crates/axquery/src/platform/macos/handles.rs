/*! Opaque `AXUIElement` handle with safe accessor methods.

All unsafe element calls are encapsulated here. Methods return the raw
`AXError` so callers can map it with the operation's context.
*/

#![allow(unsafe_code)]
#![allow(
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use objc2_application_services::{AXError, AXUIElement};
use objc2_core_foundation::{CFArray, CFHash, CFRetained, CFString, CFType};
use std::ffi::c_void;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;

// FFI binding for CFEqual (not exposed by objc2-core-foundation)
extern "C" {
  fn CFEqual(cf1: *const c_void, cf2: *const c_void) -> u8;
}

pub(super) fn check(result: AXError) -> Result<(), AXError> {
  if result == AXError::Success {
    Ok(())
  } else {
    Err(result)
  }
}

/// Handle to a macOS accessibility element. Clone is cheap (reference counted).
#[derive(Clone)]
pub struct AxHandle {
  inner: CFRetained<AXUIElement>,
  /// `CFHash`, computed once at construction
  cached_hash: u64,
}

impl AxHandle {
  pub(super) fn new(element: CFRetained<AXUIElement>) -> Self {
    let cached_hash = CFHash(Some(&*element)) as u64;
    Self {
      inner: element,
      cached_hash,
    }
  }

  /// Application element for a process.
  pub(super) fn application(pid: u32) -> Self {
    Self::new(unsafe { AXUIElement::new_application(pid as i32) })
  }

  pub(super) fn system_wide() -> Self {
    Self::new(unsafe { AXUIElement::new_system_wide() })
  }

  pub(super) fn inner(&self) -> &AXUIElement {
    &self.inner
  }

  pub(super) fn retained(&self) -> CFRetained<AXUIElement> {
    self.inner.clone()
  }

  /// Compare with another handle using `CFEqual` (local, no IPC).
  fn cf_equal(&self, other: &Self) -> bool {
    // Use as_ptr() to get the CF pointer, not a pointer to the wrapper struct.
    let self_ptr = CFRetained::as_ptr(&self.inner).as_ptr().cast::<c_void>();
    let other_ptr = CFRetained::as_ptr(&other.inner).as_ptr().cast::<c_void>();
    unsafe { CFEqual(self_ptr, other_ptr) != 0 }
  }

  pub(super) fn pid(&self) -> Result<u32, AXError> {
    let mut pid: i32 = 0;
    check(unsafe { self.inner.pid(NonNull::new_unchecked(&raw mut pid)) })?;
    Ok(pid as u32)
  }

  fn copy_names(
    &self,
    copy: impl FnOnce(&AXUIElement, NonNull<*const CFArray>) -> AXError,
  ) -> Result<Vec<String>, AXError> {
    let mut names_ref: *const CFArray<CFString> = std::ptr::null();
    let result = copy(
      &self.inner,
      NonNull::from(&mut names_ref).cast::<*const CFArray>(),
    );
    if result == AXError::NoValue || (result == AXError::Success && names_ref.is_null()) {
      return Ok(Vec::new());
    }
    check(result)?;
    let names =
      unsafe { CFRetained::<CFArray<CFString>>::from_raw(NonNull::new_unchecked(names_ref.cast_mut())) };
    Ok((0..names.len()).filter_map(|i| names.get(i)).map(|s| s.to_string()).collect())
  }

  pub(super) fn attribute_names(&self) -> Result<Vec<String>, AXError> {
    self.copy_names(|element, out| unsafe { element.copy_attribute_names(out) })
  }

  pub(super) fn action_names(&self) -> Result<Vec<String>, AXError> {
    self.copy_names(|element, out| unsafe { element.copy_action_names(out) })
  }

  pub(super) fn param_attribute_names(&self) -> Result<Vec<String>, AXError> {
    self.copy_names(|element, out| unsafe { element.copy_parameterized_attribute_names(out) })
  }

  /// Copy an attribute value. `Ok(None)` when the attribute has no value.
  pub(super) fn copy_attribute(&self, attr: &CFString) -> Result<Option<CFRetained<CFType>>, AXError> {
    let mut value: *const CFType = std::ptr::null();
    let result = unsafe {
      self
        .inner
        .copy_attribute_value(attr, NonNull::from(&mut value))
    };
    Self::take_value(result, value)
  }

  pub(super) fn copy_param_attribute(
    &self,
    attr: &CFString,
    param: &CFType,
  ) -> Result<Option<CFRetained<CFType>>, AXError> {
    let mut value: *const CFType = std::ptr::null();
    let result = unsafe {
      self.inner.copy_parameterized_attribute_value(
        attr,
        param,
        NonNull::from(&mut value),
      )
    };
    Self::take_value(result, value)
  }

  fn take_value(
    result: AXError,
    value: *const CFType,
  ) -> Result<Option<CFRetained<CFType>>, AXError> {
    if result == AXError::NoValue {
      return Ok(None);
    }
    check(result)?;
    Ok(NonNull::new(value.cast_mut()).map(|ptr| unsafe { CFRetained::from_raw(ptr) }))
  }

  pub(super) fn is_settable(&self, attr: &CFString) -> Result<bool, AXError> {
    let mut settable: u8 = 0;
    check(unsafe {
      self
        .inner
        .is_attribute_settable(attr, NonNull::new_unchecked(&raw mut settable))
    })?;
    Ok(settable != 0)
  }

  pub(super) fn set_attribute(&self, attr: &CFString, value: &CFType) -> Result<(), AXError> {
    check(unsafe { self.inner.set_attribute_value(attr, value) })
  }

  pub(super) fn perform_action(&self, action: &CFString) -> Result<(), AXError> {
    check(unsafe { self.inner.perform_action(action) })
  }

  pub(super) fn set_timeout(&self, seconds: f32) -> Result<(), AXError> {
    check(unsafe { self.inner.set_messaging_timeout(seconds) })
  }

  /// Deepest element at a screen position within this element's application.
  pub(super) fn element_at(&self, x: f64, y: f64) -> Result<Option<Self>, AXError> {
    let mut element_ptr: *const AXUIElement = std::ptr::null();
    let result = unsafe {
      self.inner.copy_element_at_position(
        x as f32,
        y as f32,
        NonNull::from(&mut element_ptr),
      )
    };
    if result == AXError::NoValue {
      return Ok(None);
    }
    check(result)?;
    Ok(
      NonNull::new(element_ptr.cast_mut())
        .map(|ptr| Self::new(unsafe { CFRetained::from_raw(ptr) })),
    )
  }
}

impl Hash for AxHandle {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.cached_hash.hash(state);
  }
}

impl PartialEq for AxHandle {
  fn eq(&self, other: &Self) -> bool {
    self.cached_hash == other.cached_hash && self.cf_equal(other)
  }
}

impl Eq for AxHandle {}

impl fmt::Debug for AxHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "AxHandle({:#x})", self.cached_hash)
  }
}

unsafe impl Send for AxHandle {}
unsafe impl Sync for AxHandle {}
