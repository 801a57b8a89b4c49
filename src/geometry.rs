//! Coordinate transform utilities: percent-space ↔ pixel-space conversion,
//! viewport (zoom/pan) mapping, and ±90° rotation in percent space.
//!
//! Canonical region geometry is stored as percentages of the natural size of
//! the target object, so it survives zoom, container resizes, and reloads
//! against a different render size. Pixel values are derived on demand and
//! never fed back into the canonical representation.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::FULL_TURN_DEG;

/// A point in screen, buffer, or percent space depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box. Used both for percent-space geometry and for the
/// derived pixel-space display cache.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Convert a percent-space value to pixels given the rendered extent.
#[must_use]
pub fn percent_to_pixel(percent: f64, extent: f64) -> f64 {
    percent / 100.0 * extent
}

/// Convert a pixel value to percent of the given extent. Zero extent maps to
/// zero rather than dividing by it.
#[must_use]
pub fn pixel_to_percent(pixel: f64, extent: f64) -> f64 {
    if extent == 0.0 { 0.0 } else { pixel / extent * 100.0 }
}

/// Normalize an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_angle(degrees: f64) -> f64 {
    let r = degrees % FULL_TURN_DEG;
    if r < 0.0 { r + FULL_TURN_DEG } else { r }
}

/// Rotate a percent-space point by ±90° about the image center.
///
/// Percent space is 0..100 on both axes regardless of aspect ratio, so a
/// quarter turn is a pure coordinate swap with one axis reflected.
#[must_use]
pub fn rotate_point(p: Point, clockwise: bool) -> Point {
    if clockwise {
        Point::new(100.0 - p.y, p.x)
    } else {
        Point::new(p.y, 100.0 - p.x)
    }
}

/// Rotate a percent-space box by ±90° about the image center.
#[must_use]
pub fn rotate_bounds(b: Bounds, clockwise: bool) -> Bounds {
    if clockwise {
        Bounds::new(100.0 - b.y - b.height, b.x, b.height, b.width)
    } else {
        Bounds::new(b.y, 100.0 - b.x - b.width, b.height, b.width)
    }
}

/// The active zoom/pan/rotation transform of the rendered object.
///
/// `pan_x` / `pan_y` are in CSS pixels; `zoom` is a scale factor; `rotation`
/// is in degrees. The magic-wand sampler uses this to reproduce the CSS
/// transform onto a plain pixel buffer, since pixel data cannot be read
/// through a CSS transform directly.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub rotation: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0, rotation: 0.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to source-buffer coordinates.
    #[must_use]
    pub fn screen_to_source(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a source-buffer point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn source_to_screen(&self, source: Point) -> Point {
        Point {
            x: source.x * self.zoom + self.pan_x,
            y: source.y * self.zoom + self.pan_y,
        }
    }

    /// Whether any rotation is applied. Rotated viewports cannot be sampled.
    #[must_use]
    pub fn is_rotated(&self) -> bool {
        normalize_angle(self.rotation) != 0.0
    }
}
