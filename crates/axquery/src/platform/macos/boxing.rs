/*! Conversion between Core Foundation values and [`RawValue`]. */

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use objc2_application_services::{AXUIElement, AXValue as AXValueRef, AXValueType};
use objc2_core_foundation::{
  kCFBooleanFalse, kCFBooleanTrue, kCFNull, CFArray, CFBoolean, CFNumber, CFRange, CFRetained,
  CFString, CFType, CGPoint, CGRect, CGSize,
};
use std::ffi::c_void;
use std::ptr::NonNull;

use super::handles::AxHandle;
use crate::a11y::RawValue;
use crate::types::{Bounds, Point, ServiceError, ServiceResult, Size, TextRange};

type Raw = RawValue<AxHandle>;

/// Unbox a CF value. Types with no [`RawValue`] shape are
/// [`ServiceError::NotSupported`].
pub(super) fn unbox(value: &CFType) -> ServiceResult<Raw> {
  if let Some(s) = value.downcast_ref::<CFString>() {
    return Ok(Raw::String(s.to_string()));
  }
  if let Some(b) = value.downcast_ref::<CFBoolean>() {
    return Ok(Raw::Boolean(b.as_bool()));
  }
  if let Some(n) = value.downcast_ref::<CFNumber>() {
    return n
      .as_f64()
      .map(Raw::Number)
      .ok_or_else(|| ServiceError::NotSupported("CFNumber without a float value".into()));
  }
  if let Some(element) = value.downcast_ref::<AXUIElement>() {
    return Ok(Raw::Handle(AxHandle::new(unsafe {
      CFRetained::retain(NonNull::from(element))
    })));
  }
  if let Some(boxed) = value.downcast_ref::<AXValueRef>() {
    return unbox_ax_value(boxed);
  }
  if let Some(array) = value.downcast_ref::<CFArray>() {
    // SAFETY: CFArray elements are always CF objects
    let array: CFRetained<CFArray<CFType>> =
      unsafe { CFRetained::cast_unchecked(CFRetained::retain(NonNull::from(array))) };
    return (0..array.len())
      .filter_map(|i| array.get(i))
      .map(|v| unbox(&v))
      .collect::<ServiceResult<Vec<_>>>()
      .map(Raw::Array);
  }
  if is_null(value) {
    return Ok(Raw::Null);
  }
  Err(ServiceError::NotSupported("value of an unknown CF type".into()))
}

fn is_null(value: &CFType) -> bool {
  unsafe { kCFNull }.is_some_and(|null| {
    let null: &CFType = null.as_ref();
    std::ptr::eq(null, value)
  })
}

/// Read the struct inside an `AXValue` into `out`.
fn read_struct<T>(boxed: &AXValueRef, kind: AXValueType, out: &mut T) -> bool {
  NonNull::new(std::ptr::from_mut(out).cast::<c_void>())
    .is_some_and(|ptr| unsafe { boxed.value(kind, ptr) })
}

fn unbox_ax_value(boxed: &AXValueRef) -> ServiceResult<Raw> {
  let kind = unsafe { boxed.r#type() };
  match kind {
    AXValueType::CGPoint => {
      let mut p = CGPoint { x: 0.0, y: 0.0 };
      if read_struct(boxed, kind, &mut p) {
        return Ok(Raw::Point(Point::new(p.x, p.y)));
      }
    }
    AXValueType::CGSize => {
      let mut s = CGSize {
        width: 0.0,
        height: 0.0,
      };
      if read_struct(boxed, kind, &mut s) {
        return Ok(Raw::Size(Size::new(s.width, s.height)));
      }
    }
    AXValueType::CGRect => {
      let mut r = CGRect::default();
      if read_struct(boxed, kind, &mut r) {
        return Ok(Raw::Rect(Bounds::from_parts(
          Point::new(r.origin.x, r.origin.y),
          Size::new(r.size.width, r.size.height),
        )));
      }
    }
    AXValueType::CFRange => {
      let mut r = CFRange {
        location: 0,
        length: 0,
      };
      if read_struct(boxed, kind, &mut r) {
        return Ok(Raw::Range(TextRange::new(
          r.location.max(0) as usize,
          r.length.max(0) as usize,
        )));
      }
    }
    _ => {}
  }
  Err(ServiceError::NotSupported(format!("AXValue of type {kind:?}")))
}

fn upcast<T: ?Sized>(value: CFRetained<T>) -> CFRetained<CFType> {
  // SAFETY: every CF object is a CFType
  unsafe { CFRetained::cast_unchecked(value) }
}

fn box_struct<T>(kind: AXValueType, mut value: T) -> ServiceResult<CFRetained<CFType>> {
  NonNull::new(std::ptr::from_mut(&mut value).cast::<c_void>())
    .and_then(|ptr| unsafe { AXValueRef::new(kind, ptr) })
    .map(upcast)
    .ok_or_else(|| ServiceError::Failed(format!("could not box {kind:?}")))
}

/// Box a value for a write or a parameterized read.
pub(super) fn to_cf(value: &Raw) -> ServiceResult<CFRetained<CFType>> {
  match value {
    Raw::Null => unsafe { kCFNull }
      .map(|null| upcast(unsafe { CFRetained::retain(NonNull::from(null)) }))
      .ok_or_else(|| ServiceError::Failed("kCFNull unavailable".into())),
    Raw::Boolean(b) => unsafe { if *b { kCFBooleanTrue } else { kCFBooleanFalse } }
      .map(|cf| upcast(unsafe { CFRetained::retain(NonNull::from(cf)) }))
      .ok_or_else(|| ServiceError::Failed("kCFBoolean unavailable".into())),
    Raw::Number(n) => Ok(upcast(CFNumber::new_f64(*n))),
    Raw::String(s) => Ok(upcast(CFString::from_str(s))),
    Raw::Point(p) => box_struct(AXValueType::CGPoint, CGPoint { x: p.x, y: p.y }),
    Raw::Size(s) => box_struct(
      AXValueType::CGSize,
      CGSize {
        width: s.width,
        height: s.height,
      },
    ),
    Raw::Rect(b) => box_struct(
      AXValueType::CGRect,
      CGRect {
        origin: CGPoint { x: b.x, y: b.y },
        size: CGSize {
          width: b.w,
          height: b.h,
        },
      },
    ),
    Raw::Range(r) => box_struct(
      AXValueType::CFRange,
      CFRange {
        location: r.location as isize,
        length: r.length as isize,
      },
    ),
    Raw::Handle(h) => Ok(upcast(h.retained())),
    Raw::Array(items) => {
      let boxed = items.iter().map(to_cf).collect::<ServiceResult<Vec<_>>>()?;
      let refs: Vec<&CFType> = boxed.iter().map(|v| &**v).collect();
      Ok(upcast(CFArray::from_objects(&refs)))
    }
  }
}
