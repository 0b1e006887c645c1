//! Widget frames.

use cgmath::{Point2, Vector2, Zero};

/// A widget frame in its superview's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top left corner.
    pub origin: Point2<f64>,

    /// Width and height.
    pub size: Vector2<f64>,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point2<f64>, size: Vector2<f64>) -> Rect {
        Rect { origin, size }
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0., 0.),
            size: Vector2::zero(),
        }
    }

    /// Returns a rectangle of the given size at the origin.
    pub fn from_size(width: f64, height: f64) -> Rect {
        Rect {
            origin: Point2::new(0., 0.),
            size: Vector2::new(width, height),
        }
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    /// Returns the same rectangle translated to the origin; i.e. the bounds as seen from inside.
    pub fn bounds(&self) -> Rect {
        Rect::new(Point2::new(0., 0.), self.size)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::zero()
    }
}

#[test]
fn test_bounds_drop_the_origin() {
    let rect = Rect::new(Point2::new(5., 7.), Vector2::new(10., 4.));
    assert_eq!(rect.bounds(), Rect::from_size(10., 4.));
    assert_eq!((rect.width(), rect.height()), (10., 4.));
    assert_eq!(Rect::default(), Rect::zero());
}
