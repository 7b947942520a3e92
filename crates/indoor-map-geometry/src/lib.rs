#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for floor-plan geometry."]
#![doc = ""]
#![doc = "This crate provides world and pixel point types, named beacons, and the"]
#![doc = "affine view transform that maps world meters onto a drawing surface."]

extern crate alloc;

use alloc::string::String;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::TransformError;

/// A point in world coordinates (meters) on the shared floor plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// World-frame x position (m).
    pub x: f64,
    /// World-frame y position (m).
    pub y: f64,
}

impl Point {
    /// Construct a new world point.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2} m, y: {:.2} m)", self.x, self.y)
    }
}

/// A point on the drawing surface, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    /// Horizontal pixel position.
    pub x: f64,
    /// Vertical pixel position (grows downwards).
    pub y: f64,
}

impl PixelPoint {
    /// Construct a new pixel point.
    pub const fn new(x: f64, y: f64) -> Self {
        PixelPoint { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1} px, {:.1} px)", self.x, self.y)
    }
}

/// A named, fixed reference location used by the positioning backend.
///
/// The wire shape is flat: `{"x": .., "y": .., "name": ..}`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beacon {
    /// World-frame x position (m).
    pub x: f64,
    /// World-frame y position (m).
    pub y: f64,
    /// Human readable beacon label.
    pub name: String,
}

impl Beacon {
    /// Construct a new beacon.
    pub fn new(x: f64, y: f64, name: impl Into<String>) -> Self {
        Beacon {
            x,
            y,
            name: name.into(),
        }
    }

    /// The beacon location as a world point.
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Affine world-to-screen mapping without rotation.
///
/// `to_screen(p) = (p.x * scale + offset_x, p.y * scale + offset_y)` and
/// `to_world` is its exact algebraic inverse. Parameters are validated once
/// at construction, so neither direction can fail afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Pixels per meter.
    scale: f64,
    /// Horizontal pixel offset of the world origin.
    offset_x: f64,
    /// Vertical pixel offset of the world origin.
    offset_y: f64,
}

impl ViewTransform {
    /// Construct a new view transform.
    ///
    /// # Arguments
    ///
    /// * `scale`: Pixels per meter. Negative values mirror the axis and are allowed.
    /// * `offset_x`: Pixel x position of the world origin.
    /// * `offset_y`: Pixel y position of the world origin.
    ///
    /// # Errors
    ///
    /// Returns `Err(TransformError::InvalidScale)` if `scale` is zero or not finite.
    /// Returns `Err(TransformError::InvalidOffset)` if either offset is not finite.
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Result<Self, TransformError> {
        if !scale.is_finite() {
            return Err(TransformError::InvalidScale("must be finite"));
        }
        if scale == 0.0 {
            return Err(TransformError::InvalidScale("must be nonzero"));
        }
        if !offset_x.is_finite() || !offset_y.is_finite() {
            return Err(TransformError::InvalidOffset("must be finite"));
        }
        Ok(ViewTransform {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Returns the scale in pixels per meter.
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the pixel offset of the world origin.
    pub const fn offset(&self) -> PixelPoint {
        PixelPoint::new(self.offset_x, self.offset_y)
    }

    /// Project a world point onto the drawing surface.
    pub fn to_screen(&self, p: Point) -> PixelPoint {
        PixelPoint {
            x: p.x * self.scale + self.offset_x,
            y: p.y * self.scale + self.offset_y,
        }
    }

    /// Map a surface pixel back into world coordinates.
    pub fn to_world(&self, px: PixelPoint) -> Point {
        Point {
            x: (px.x - self.offset_x) / self.scale,
            y: (px.y - self.offset_y) / self.scale,
        }
    }
}

impl fmt::Display for ViewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(scale: {:.2} px/m, offset: ({:.1}, {:.1}) px)",
            self.scale, self.offset_x, self.offset_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn test_transform_constructor() {
        let view = ViewTransform::new(15.0, 100.0, 100.0).unwrap();
        assert_eq!(view.scale(), 15.0);
        assert_eq!(view.offset(), PixelPoint::new(100.0, 100.0));
    }

    #[test]
    fn test_constructor_invalid_scale() {
        let result = ViewTransform::new(0.0, 100.0, 100.0);
        assert!(matches!(result, Err(TransformError::InvalidScale("must be nonzero"))));
        let result_nan = ViewTransform::new(f64::NAN, 100.0, 100.0);
        assert!(matches!(result_nan, Err(TransformError::InvalidScale("must be finite"))));
        let result_inf = ViewTransform::new(f64::INFINITY, 0.0, 0.0);
        assert!(matches!(result_inf, Err(TransformError::InvalidScale("must be finite"))));
    }

    #[test]
    fn test_constructor_invalid_offset() {
        let result = ViewTransform::new(15.0, f64::NAN, 0.0);
        assert!(matches!(result, Err(TransformError::InvalidOffset("must be finite"))));
        let result_y = ViewTransform::new(15.0, 0.0, f64::NEG_INFINITY);
        assert!(matches!(result_y, Err(TransformError::InvalidOffset("must be finite"))));
    }

    #[test]
    fn test_beacon_projects_to_expected_pixel() {
        // 1 m * 15 px/m + 100 px = 115 px on both axes
        let view = ViewTransform::new(15.0, 100.0, 100.0).unwrap();
        let beacon = Beacon::new(1.0, 1.0, "A");
        let px = view.to_screen(beacon.position());
        assert!(close(px.x, 115.0));
        assert!(close(px.y, 115.0));
    }

    #[test]
    fn test_offset_pixel_maps_to_world_origin() {
        let view = ViewTransform::new(15.0, 100.0, 100.0).unwrap();
        let world = view.to_world(PixelPoint::new(100.0, 100.0));
        assert_eq!(world, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_round_trip_recovers_world_point() {
        let views = [
            ViewTransform::new(15.0, 100.0, 100.0).unwrap(),
            ViewTransform::new(0.37, -12.5, 640.0).unwrap(),
            ViewTransform::new(-40.0, 0.0, 0.0).unwrap(),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(3.0, -2.4),
            Point::new(-1234.5678, 0.001),
            Point::new(1e6, -1e-6),
        ];
        for view in views {
            for p in points {
                let back = view.to_world(view.to_screen(p));
                assert!(close(back.x, p.x), "x drifted for {} under {}", p, view);
                assert!(close(back.y, p.y), "y drifted for {} under {}", p, view);
            }
        }
    }

    #[test]
    fn test_point_finiteness() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(PixelPoint::new(115.0, 99.96).to_string(), "(115.0 px, 100.0 px)");
        assert_eq!(Point::new(1.0, -2.345).to_string(), "(x: 1.00 m, y: -2.35 m)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_beacon_wire_shape() {
        let json = r#"[{"x": 3.0, "y": -2.4, "name": "beacon_1"}]"#;
        let beacons: Vec<Beacon> = serde_json::from_str(json).unwrap();
        assert_eq!(beacons, vec![Beacon::new(3.0, -2.4, "beacon_1")]);
    }
}
