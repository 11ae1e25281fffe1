/*!
Attribute values.

[`RawValue`] is the shape values travel in between the engine and a
[`NodeService`]: handles and boxed geometry. [`Value`] is what callers see:
handles become [`Element`]s, everything else passes through. Converting a raw
value into a `Value` ("massaging") recurses into arrays; converting back
("boxing") is lossless for every shape.
*/

use std::fmt;

use crate::core::Element;
use crate::platform::NodeService;
use crate::types::{AxResult, Bounds, Point, Size, TextRange};

/// A value as exchanged with the node service.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue<H> {
  Null,
  Boolean(bool),
  Number(f64),
  String(String),
  Point(Point),
  Size(Size),
  Rect(Bounds),
  Range(TextRange),
  /// Reference to another node.
  Handle(H),
  Array(Vec<RawValue<H>>),
}

impl<H> RawValue<H> {
  /// Short name of the variant, for diagnostics.
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Boolean(_) => "boolean",
      Self::Number(_) => "number",
      Self::String(_) => "string",
      Self::Point(_) => "point",
      Self::Size(_) => "size",
      Self::Rect(_) => "rect",
      Self::Range(_) => "range",
      Self::Handle(_) => "element",
      Self::Array(_) => "array",
    }
  }
}

impl<H> From<bool> for RawValue<H> {
  fn from(b: bool) -> Self {
    Self::Boolean(b)
  }
}

impl<H> From<f64> for RawValue<H> {
  fn from(n: f64) -> Self {
    Self::Number(n)
  }
}

impl<H> From<i32> for RawValue<H> {
  fn from(n: i32) -> Self {
    Self::Number(f64::from(n))
  }
}

impl<H> From<&str> for RawValue<H> {
  fn from(s: &str) -> Self {
    Self::String(s.to_owned())
  }
}

impl<H> From<String> for RawValue<H> {
  fn from(s: String) -> Self {
    Self::String(s)
  }
}

impl<H> From<Point> for RawValue<H> {
  fn from(p: Point) -> Self {
    Self::Point(p)
  }
}

impl<H> From<Size> for RawValue<H> {
  fn from(s: Size) -> Self {
    Self::Size(s)
  }
}

impl<H> From<Bounds> for RawValue<H> {
  fn from(r: Bounds) -> Self {
    Self::Rect(r)
  }
}

impl<H> From<TextRange> for RawValue<H> {
  fn from(r: TextRange) -> Self {
    Self::Range(r)
  }
}

/// A massaged attribute value.
pub enum Value<S: NodeService> {
  Null,
  Boolean(bool),
  Number(f64),
  String(String),
  Point(Point),
  Size(Size),
  Bounds(Bounds),
  Range(TextRange),
  Element(Element<S>),
  Array(Vec<Value<S>>),
}

impl<S: NodeService> Value<S> {
  /// Convert a raw value, wrapping every handle with `wrap`.
  pub(crate) fn massage<F>(raw: RawValue<S::Handle>, wrap: &mut F) -> AxResult<Self>
  where
    F: FnMut(S::Handle) -> AxResult<Element<S>>,
  {
    Ok(match raw {
      RawValue::Null => Self::Null,
      RawValue::Boolean(b) => Self::Boolean(b),
      RawValue::Number(n) => Self::Number(n),
      RawValue::String(s) => Self::String(s),
      RawValue::Point(p) => Self::Point(p),
      RawValue::Size(s) => Self::Size(s),
      RawValue::Rect(r) => Self::Bounds(r),
      RawValue::Range(r) => Self::Range(r),
      RawValue::Handle(h) => Self::Element(wrap(h)?),
      RawValue::Array(items) => Self::Array(
        items
          .into_iter()
          .map(|item| Self::massage(item, wrap))
          .collect::<AxResult<_>>()?,
      ),
    })
  }

  /// Box this value into the shape the node service expects.
  pub fn to_raw(&self) -> RawValue<S::Handle> {
    match self {
      Self::Null => RawValue::Null,
      Self::Boolean(b) => RawValue::Boolean(*b),
      Self::Number(n) => RawValue::Number(*n),
      Self::String(s) => RawValue::String(s.clone()),
      Self::Point(p) => RawValue::Point(*p),
      Self::Size(s) => RawValue::Size(*s),
      Self::Bounds(r) => RawValue::Rect(*r),
      Self::Range(r) => RawValue::Range(*r),
      Self::Element(e) => RawValue::Handle(e.handle().clone()),
      Self::Array(items) => RawValue::Array(items.iter().map(Self::to_raw).collect()),
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      _ => None,
    }
  }

  pub const fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Boolean(b) => Some(*b),
      _ => None,
    }
  }

  pub const fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub const fn as_point(&self) -> Option<Point> {
    match self {
      Self::Point(p) => Some(*p),
      _ => None,
    }
  }

  pub const fn as_size(&self) -> Option<Size> {
    match self {
      Self::Size(s) => Some(*s),
      _ => None,
    }
  }

  pub const fn as_bounds(&self) -> Option<Bounds> {
    match self {
      Self::Bounds(b) => Some(*b),
      _ => None,
    }
  }

  pub const fn as_range(&self) -> Option<TextRange> {
    match self {
      Self::Range(r) => Some(*r),
      _ => None,
    }
  }

  pub const fn as_element(&self) -> Option<&Element<S>> {
    match self {
      Self::Element(e) => Some(e),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Self]> {
    match self {
      Self::Array(items) => Some(items),
      _ => None,
    }
  }

  pub const fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  /// Take the element out of this value, if it is one.
  pub fn into_element(self) -> Option<Element<S>> {
    match self {
      Self::Element(e) => Some(e),
      _ => None,
    }
  }

  /// Elements held by this value: the element itself, or every element in an array.
  pub fn into_elements(self) -> Vec<Element<S>> {
    match self {
      Self::Element(e) => vec![e],
      Self::Array(items) => items.into_iter().filter_map(Self::into_element).collect(),
      _ => Vec::new(),
    }
  }

  /// Short name of the variant, for diagnostics.
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Boolean(_) => "boolean",
      Self::Number(_) => "number",
      Self::String(_) => "string",
      Self::Point(_) => "point",
      Self::Size(_) => "size",
      Self::Bounds(_) => "rect",
      Self::Range(_) => "range",
      Self::Element(_) => "element",
      Self::Array(_) => "array",
    }
  }
}

impl<S: NodeService> Clone for Value<S> {
  fn clone(&self) -> Self {
    match self {
      Self::Null => Self::Null,
      Self::Boolean(b) => Self::Boolean(*b),
      Self::Number(n) => Self::Number(*n),
      Self::String(s) => Self::String(s.clone()),
      Self::Point(p) => Self::Point(*p),
      Self::Size(s) => Self::Size(*s),
      Self::Bounds(r) => Self::Bounds(*r),
      Self::Range(r) => Self::Range(*r),
      Self::Element(e) => Self::Element(e.clone()),
      Self::Array(items) => Self::Array(items.clone()),
    }
  }
}

impl<S: NodeService> PartialEq for Value<S> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Null, Self::Null) => true,
      (Self::Boolean(a), Self::Boolean(b)) => a == b,
      (Self::Number(a), Self::Number(b)) => a == b,
      (Self::String(a), Self::String(b)) => a == b,
      (Self::Point(a), Self::Point(b)) => a == b,
      (Self::Size(a), Self::Size(b)) => a == b,
      (Self::Bounds(a), Self::Bounds(b)) => a == b,
      (Self::Range(a), Self::Range(b)) => a == b,
      (Self::Element(a), Self::Element(b)) => a == b,
      (Self::Array(a), Self::Array(b)) => a == b,
      _ => false,
    }
  }
}

impl<S: NodeService> fmt::Debug for Value<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("Null"),
      Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
      Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
      Self::String(s) => f.debug_tuple("String").field(s).finish(),
      Self::Point(p) => f.debug_tuple("Point").field(p).finish(),
      Self::Size(s) => f.debug_tuple("Size").field(s).finish(),
      Self::Bounds(r) => f.debug_tuple("Bounds").field(r).finish(),
      Self::Range(r) => f.debug_tuple("Range").field(r).finish(),
      Self::Element(e) => f.debug_tuple("Element").field(e).finish(),
      Self::Array(items) => f.debug_list().entries(items).finish(),
    }
  }
}

/// Compact rendering used in filter sets and descriptions.
impl<S: NodeService> fmt::Display for Value<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("nil"),
      Self::Boolean(b) => write!(f, "{b}"),
      Self::Number(n) => write!(f, "{n}"),
      Self::String(s) => write!(f, "{s:?}"),
      Self::Point(p) => write!(f, "({}, {})", p.x, p.y),
      Self::Size(s) => write!(f, "{}x{}", s.width, s.height),
      Self::Bounds(r) => write!(f, "({}, {}, {}x{})", r.x, r.y, r.w, r.h),
      Self::Range(r) => write!(f, "{}..{}", r.location, r.end()),
      Self::Element(e) => write!(f, "{}", e.class()),
      Self::Array(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{item}")?;
        }
        f.write_str("]")
      }
    }
  }
}

impl<S: NodeService> From<bool> for Value<S> {
  fn from(b: bool) -> Self {
    Self::Boolean(b)
  }
}

impl<S: NodeService> From<f64> for Value<S> {
  fn from(n: f64) -> Self {
    Self::Number(n)
  }
}

impl<S: NodeService> From<i32> for Value<S> {
  fn from(n: i32) -> Self {
    Self::Number(f64::from(n))
  }
}

impl<S: NodeService> From<i64> for Value<S> {
  #[allow(clippy::cast_precision_loss)] // Acceptable: attribute values rarely need full i64 precision
  fn from(n: i64) -> Self {
    Self::Number(n as f64)
  }
}

impl<S: NodeService> From<&str> for Value<S> {
  fn from(s: &str) -> Self {
    Self::String(s.to_owned())
  }
}

impl<S: NodeService> From<String> for Value<S> {
  fn from(s: String) -> Self {
    Self::String(s)
  }
}

impl<S: NodeService> From<Point> for Value<S> {
  fn from(p: Point) -> Self {
    Self::Point(p)
  }
}

impl<S: NodeService> From<Size> for Value<S> {
  fn from(s: Size) -> Self {
    Self::Size(s)
  }
}

impl<S: NodeService> From<Bounds> for Value<S> {
  fn from(r: Bounds) -> Self {
    Self::Bounds(r)
  }
}

impl<S: NodeService> From<TextRange> for Value<S> {
  fn from(r: TextRange) -> Self {
    Self::Range(r)
  }
}

impl<S: NodeService> From<Element<S>> for Value<S> {
  fn from(e: Element<S>) -> Self {
    Self::Element(e)
  }
}

impl<S: NodeService> From<Vec<Value<S>>> for Value<S> {
  fn from(items: Vec<Value<S>>) -> Self {
    Self::Array(items)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::memory::{MemHandle, MemoryTree};

  type V = Value<MemoryTree>;

  fn no_handles(h: MemHandle) -> AxResult<Element<MemoryTree>> {
    panic!("unexpected handle {h:?}")
  }

  #[test]
  fn scalars_pass_through() {
    assert_eq!(V::massage(RawValue::Boolean(true), &mut no_handles).ok(), Some(V::Boolean(true)));
    assert_eq!(V::massage(RawValue::Number(2.5), &mut no_handles).ok(), Some(V::Number(2.5)));
    assert_eq!(
      V::massage(RawValue::String("hi".into()), &mut no_handles).ok(),
      Some(V::String("hi".into()))
    );
    assert_eq!(V::massage(RawValue::Null, &mut no_handles).ok(), Some(V::Null));
  }

  #[test]
  fn boxed_geometry_unboxes() {
    let rect = Bounds {
      x: 1.0,
      y: 2.0,
      w: 3.0,
      h: 4.0,
    };
    let v = V::massage(RawValue::Rect(rect), &mut no_handles).ok();
    assert_eq!(v.as_ref().and_then(V::as_bounds), Some(rect));
    let r = V::massage(RawValue::Range(TextRange::new(2, 5)), &mut no_handles).ok();
    assert_eq!(r.as_ref().and_then(V::as_range), Some(TextRange::new(2, 5)));
  }

  #[test]
  fn boxing_is_lossless_for_every_shape() {
    let raw: RawValue<MemHandle> = RawValue::Array(vec![
      RawValue::Point(Point::new(1.0, 2.0)),
      RawValue::Size(Size::new(3.0, 4.0)),
      RawValue::Rect(Bounds {
        x: 5.0,
        y: 6.0,
        w: 7.0,
        h: 8.0,
      }),
      RawValue::Range(TextRange::new(9, 10)),
      RawValue::Boolean(false),
      RawValue::Null,
    ]);
    let massaged = V::massage(raw.clone(), &mut no_handles).ok();
    assert_eq!(massaged.map(|v| v.to_raw()), Some(raw));
  }

  #[test]
  fn accessors_are_variant_exclusive() {
    let v = V::from("text");
    assert_eq!(v.as_str(), Some("text"));
    assert_eq!(v.as_bool(), None);
    assert_eq!(v.as_f64(), None);
    assert!(v.as_element().is_none());
    assert!(!v.is_null());
  }

  #[test]
  fn display_is_compact() {
    assert_eq!(V::from("OK").to_string(), "\"OK\"");
    assert_eq!(V::from(true).to_string(), "true");
    assert_eq!(V::Null.to_string(), "nil");
    assert_eq!(V::from(TextRange::new(1, 2)).to_string(), "1..3");
    assert_eq!(V::from(vec![V::from(1), V::from(2)]).to_string(), "[1, 2]");
  }

  #[test]
  fn into_elements_of_scalars_is_empty() {
    assert!(V::from(3).into_elements().is_empty());
  }
}
