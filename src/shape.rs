//! Canonical region geometry and its wire `value` representation.
//!
//! Geometry is stored in percent of the natural size of the target object
//! (time ranges in seconds, text spans in character offsets — neither has a
//! natural pixel size). The wire `value` object is open-ended JSON, read and
//! written through typed helpers; malformed payloads produce a [`DataError`]
//! and never panic.

use serde_json::{Map, Value};

use crate::errors::DataError;
use crate::geometry::{self, Bounds, Point};

/// Canonical percent-space geometry of a region.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box; `rotation` is the region's own angle in degrees.
    Rectangle { x: f64, y: f64, width: f64, height: f64, rotation: f64 },
    /// Center point plus radii.
    Ellipse { x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64 },
    /// Closed polygon; points in percent space.
    Polygon { points: Vec<[f64; 2]> },
    /// Single point; `width` is the marker diameter in percent.
    Keypoint { x: f64, y: f64, width: f64 },
    /// Natural-size binary mask, run-length encoded.
    Mask { rle: Vec<u8>, width: u32, height: u32 },
    /// Start/end in seconds on time-based media.
    Timerange { start: f64, end: f64 },
    /// Character span on a text object.
    Textspan { start: usize, end: usize, text: String },
    /// No geometry: a per-task classification result.
    Global,
}

impl Shape {
    /// Whether this shape carries pixel-space geometry (and therefore
    /// `original_width`/`original_height` on the wire).
    #[must_use]
    pub fn is_pixel_based(&self) -> bool {
        matches!(
            self,
            Self::Rectangle { .. }
                | Self::Ellipse { .. }
                | Self::Polygon { .. }
                | Self::Keypoint { .. }
                | Self::Mask { .. }
        )
    }

    /// Write this shape's fields into a wire `value` object.
    pub fn write_value_fields(&self, out: &mut Map<String, Value>) {
        match self {
            Self::Rectangle { x, y, width, height, rotation } => {
                out.insert("x".into(), json_f64(*x));
                out.insert("y".into(), json_f64(*y));
                out.insert("width".into(), json_f64(*width));
                out.insert("height".into(), json_f64(*height));
                out.insert("rotation".into(), json_f64(*rotation));
            }
            Self::Ellipse { x, y, radius_x, radius_y, rotation } => {
                out.insert("x".into(), json_f64(*x));
                out.insert("y".into(), json_f64(*y));
                out.insert("radius_x".into(), json_f64(*radius_x));
                out.insert("radius_y".into(), json_f64(*radius_y));
                out.insert("rotation".into(), json_f64(*rotation));
            }
            Self::Polygon { points } => {
                let pts: Vec<Value> = points
                    .iter()
                    .map(|p| Value::Array(vec![json_f64(p[0]), json_f64(p[1])]))
                    .collect();
                out.insert("points".into(), Value::Array(pts));
            }
            Self::Keypoint { x, y, width } => {
                out.insert("x".into(), json_f64(*x));
                out.insert("y".into(), json_f64(*y));
                out.insert("width".into(), json_f64(*width));
            }
            Self::Mask { rle, width, height } => {
                let bytes: Vec<Value> = rle.iter().map(|b| Value::from(u64::from(*b))).collect();
                out.insert("rle".into(), Value::Array(bytes));
                out.insert("mask_width".into(), Value::from(u64::from(*width)));
                out.insert("mask_height".into(), Value::from(u64::from(*height)));
            }
            Self::Timerange { start, end } => {
                out.insert("start".into(), json_f64(*start));
                out.insert("end".into(), json_f64(*end));
            }
            Self::Textspan { start, end, text } => {
                out.insert("start".into(), Value::from(*start as u64));
                out.insert("end".into(), Value::from(*end as u64));
                out.insert("text".into(), Value::from(text.clone()));
            }
            Self::Global => {}
        }
    }

    /// Parse a shape of the given wire kind out of a `value` object.
    pub fn from_value(kind: &str, value: &Map<String, Value>, result_id: &str) -> Result<Self, DataError> {
        match kind {
            "rectangle" => Ok(Self::Rectangle {
                x: req_f64(value, "x", result_id)?,
                y: req_f64(value, "y", result_id)?,
                width: req_f64(value, "width", result_id)?,
                height: req_f64(value, "height", result_id)?,
                rotation: opt_f64(value, "rotation", result_id)?,
            }),
            "ellipse" => Ok(Self::Ellipse {
                x: req_f64(value, "x", result_id)?,
                y: req_f64(value, "y", result_id)?,
                radius_x: req_f64(value, "radius_x", result_id)?,
                radius_y: req_f64(value, "radius_y", result_id)?,
                rotation: opt_f64(value, "rotation", result_id)?,
            }),
            "polygon" => Ok(Self::Polygon { points: req_points(value, result_id)? }),
            "keypoint" => Ok(Self::Keypoint {
                x: req_f64(value, "x", result_id)?,
                y: req_f64(value, "y", result_id)?,
                width: req_f64(value, "width", result_id)?,
            }),
            "brush" => Ok(Self::Mask {
                rle: req_bytes(value, "rle", result_id)?,
                width: req_u32(value, "mask_width", result_id)?,
                height: req_u32(value, "mask_height", result_id)?,
            }),
            "timerange" => Ok(Self::Timerange {
                start: req_f64(value, "start", result_id)?,
                end: req_f64(value, "end", result_id)?,
            }),
            "textspan" => Ok(Self::Textspan {
                start: req_usize(value, "start", result_id)?,
                end: req_usize(value, "end", result_id)?,
                text: opt_string(value, "text", result_id)?,
            }),
            other => Err(DataError::UnknownKind { result_id: result_id.to_string(), kind: other.to_string() }),
        }
    }

    /// Pixel-space bounding box for the given rendered size. Shapes without
    /// pixel geometry yield an empty box.
    #[must_use]
    pub fn pixel_bounds(&self, rendered_width: f64, rendered_height: f64) -> Bounds {
        let px = |v: f64| geometry::percent_to_pixel(v, rendered_width);
        let py = |v: f64| geometry::percent_to_pixel(v, rendered_height);
        match self {
            Self::Rectangle { x, y, width, height, .. } => Bounds::new(px(*x), py(*y), px(*width), py(*height)),
            Self::Ellipse { x, y, radius_x, radius_y, .. } => {
                Bounds::new(px(x - radius_x), py(y - radius_y), px(2.0 * radius_x), py(2.0 * radius_y))
            }
            Self::Polygon { points } => {
                let mut min = Point::new(f64::INFINITY, f64::INFINITY);
                let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
                for p in points {
                    min.x = min.x.min(p[0]);
                    min.y = min.y.min(p[1]);
                    max.x = max.x.max(p[0]);
                    max.y = max.y.max(p[1]);
                }
                if points.is_empty() {
                    Bounds::default()
                } else {
                    Bounds::new(px(min.x), py(min.y), px(max.x - min.x), py(max.y - min.y))
                }
            }
            Self::Keypoint { x, y, width } => {
                // Square marker sized on the horizontal extent, centered on
                // the point on both axes.
                let d = px(*width);
                Bounds::new(px(*x) - d / 2.0, py(*y) - d / 2.0, d, d)
            }
            Self::Mask { .. } => Bounds::new(0.0, 0.0, rendered_width, rendered_height),
            Self::Timerange { .. } | Self::Textspan { .. } | Self::Global => Bounds::default(),
        }
    }

    /// Rotate the canonical geometry by a quarter turn about the image center.
    ///
    /// Width/height swap where appropriate; the shape's own rotation angle is
    /// shifted and normalized into `[0, 360)`. Shapes without pixel geometry
    /// are unaffected.
    pub fn rotate90(&mut self, clockwise: bool) {
        let delta = if clockwise { 90.0 } else { -90.0 };
        match self {
            Self::Rectangle { x, y, width, height, rotation } => {
                let b = geometry::rotate_bounds(Bounds::new(*x, *y, *width, *height), clockwise);
                *x = b.x;
                *y = b.y;
                *width = b.width;
                *height = b.height;
                *rotation = geometry::normalize_angle(*rotation + delta);
            }
            Self::Ellipse { x, y, radius_x, radius_y, rotation } => {
                let c = geometry::rotate_point(Point::new(*x, *y), clockwise);
                *x = c.x;
                *y = c.y;
                std::mem::swap(radius_x, radius_y);
                *rotation = geometry::normalize_angle(*rotation + delta);
            }
            Self::Polygon { points } => {
                for p in points {
                    let r = geometry::rotate_point(Point::new(p[0], p[1]), clockwise);
                    p[0] = r.x;
                    p[1] = r.y;
                }
            }
            Self::Keypoint { x, y, .. } => {
                let r = geometry::rotate_point(Point::new(*x, *y), clockwise);
                *x = r.x;
                *y = r.y;
            }
            Self::Mask { width, height, .. } => {
                std::mem::swap(width, height);
            }
            Self::Timerange { .. } | Self::Textspan { .. } | Self::Global => {}
        }
    }
}

fn json_f64(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn req_f64(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<f64, DataError> {
    match map.get(field) {
        None => Err(DataError::MissingField { result_id: result_id.to_string(), field }),
        Some(v) => v
            .as_f64()
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field }),
    }
}

fn opt_f64(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<f64, DataError> {
    match map.get(field) {
        None => Ok(0.0),
        Some(v) => v
            .as_f64()
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field }),
    }
}

fn req_u32(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<u32, DataError> {
    match map.get(field) {
        None => Err(DataError::MissingField { result_id: result_id.to_string(), field }),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).map_or(None, Some))
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field }),
    }
}

fn req_usize(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<usize, DataError> {
    match map.get(field) {
        None => Err(DataError::MissingField { result_id: result_id.to_string(), field }),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).map_or(None, Some))
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field }),
    }
}

fn opt_string(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<String, DataError> {
    match map.get(field) {
        None => Ok(String::new()),
        Some(v) => v
            .as_str()
            .map(ToString::to_string)
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field }),
    }
}

fn req_points(map: &Map<String, Value>, result_id: &str) -> Result<Vec<[f64; 2]>, DataError> {
    let field = "points";
    let Some(raw) = map.get(field) else {
        return Err(DataError::MissingField { result_id: result_id.to_string(), field });
    };
    let Some(arr) = raw.as_array() else {
        return Err(DataError::WrongType { result_id: result_id.to_string(), field });
    };
    let mut points = Vec::with_capacity(arr.len());
    for item in arr {
        let pair = item
            .as_array()
            .filter(|a| a.len() == 2)
            .and_then(|a| Some([a[0].as_f64()?, a[1].as_f64()?]))
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field })?;
        points.push(pair);
    }
    Ok(points)
}

fn req_bytes(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<Vec<u8>, DataError> {
    let Some(raw) = map.get(field) else {
        return Err(DataError::MissingField { result_id: result_id.to_string(), field });
    };
    let Some(arr) = raw.as_array() else {
        return Err(DataError::WrongType { result_id: result_id.to_string(), field });
    };
    let mut bytes = Vec::with_capacity(arr.len());
    for item in arr {
        let b = item
            .as_u64()
            .and_then(|n| u8::try_from(n).map_or(None, Some))
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field })?;
        bytes.push(b);
    }
    Ok(bytes)
}
