/*! Geometry and range types unboxed from accessibility values. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A 2D point in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Width and height in points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Size {
  pub width: f64,
  pub height: f64,
}

impl Size {
  pub const fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }
}

/// Rectangle bounds in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  pub w: f64,
  pub h: f64,
}

impl Bounds {
  /// Bounds from an origin and a size.
  pub const fn from_parts(origin: Point, size: Size) -> Self {
    Self {
      x: origin.x,
      y: origin.y,
      w: size.width,
      h: size.height,
    }
  }

  pub const fn origin(&self) -> Point {
    Point::new(self.x, self.y)
  }

  pub const fn size(&self) -> Size {
    Size::new(self.w, self.h)
  }

  /// Centre of the rectangle (where a click would land).
  pub fn center(&self) -> Point {
    Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
  }

  /// Check if a point is contained within these bounds.
  pub fn contains(&self, point: Point) -> bool {
    point.x >= self.x
      && point.x <= self.x + self.w
      && point.y >= self.y
      && point.y <= self.y + self.h
  }
}

/// Index range (e.g. a run of characters in a text element).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct TextRange {
  pub location: usize,
  pub length: usize,
}

impl TextRange {
  pub const fn new(location: usize, length: usize) -> Self {
    Self { location, length }
  }

  /// One past the last index.
  pub const fn end(&self) -> usize {
    self.location + self.length
  }

  pub const fn is_empty(&self) -> bool {
    self.length == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod bounds_contains {
    use super::*;

    #[test]
    fn point_inside_bounds() {
      let bounds = Bounds {
        x: 0.0,
        y: 0.0,
        w: 100.0,
        h: 100.0,
      };
      assert!(
        bounds.contains(Point::new(50.0, 50.0)),
        "center point should be contained"
      );
    }

    #[test]
    fn corners_are_contained() {
      let bounds = Bounds {
        x: 10.0,
        y: 20.0,
        w: 100.0,
        h: 50.0,
      };
      assert!(bounds.contains(Point::new(10.0, 20.0)), "top-left corner");
      assert!(bounds.contains(Point::new(110.0, 70.0)), "bottom-right corner");
    }

    #[test]
    fn point_outside_bounds() {
      let bounds = Bounds {
        x: 0.0,
        y: 0.0,
        w: 100.0,
        h: 100.0,
      };
      assert!(!bounds.contains(Point::new(-1.0, 50.0)), "left of bounds");
      assert!(!bounds.contains(Point::new(50.0, 101.0)), "below bounds");
    }
  }

  mod bounds_parts {
    use super::*;

    #[test]
    fn from_parts_keeps_origin_and_size() {
      let b = Bounds::from_parts(Point::new(5.0, 6.0), Size::new(7.0, 8.0));
      assert_eq!(b.origin(), Point::new(5.0, 6.0));
      assert_eq!(b.size(), Size::new(7.0, 8.0));
    }

    #[test]
    fn center_of_offset_rect() {
      let b = Bounds {
        x: 10.0,
        y: 20.0,
        w: 100.0,
        h: 50.0,
      };
      assert_eq!(b.center(), Point::new(60.0, 45.0));
    }
  }

  #[test]
  fn text_range_end() {
    let r = TextRange::new(3, 4);
    assert_eq!(r.end(), 7);
    assert!(!r.is_empty());
    assert!(TextRange::new(9, 0).is_empty());
  }
}
