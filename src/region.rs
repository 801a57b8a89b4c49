//! Region entity: one labeled annotation unit and its attached results.
//!
//! A region owns canonical percent-space geometry plus an ordered list of
//! result entries, one per contributing control. Pixel-space geometry is a
//! transient display cache recomputed from the canonical values whenever the
//! rendered size changes — it is never a source of truth, so repeated
//! resizes cannot accumulate drift.

#[cfg(test)]
#[path = "region_test.rs"]
mod region_test;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::{ConfigRegistry, ControlNode, ObjectKind};
use crate::errors::ConfigError;
use crate::geometry::{self, Bounds};
use crate::results::{ControlPayload, ResultEntry, ResultOrigin, WireResult};
use crate::shape::Shape;

/// Strip the `#suffix` disambiguator from a region id, if present.
///
/// Ids are suffixed when an annotation is copied so duplicate regions can be
/// told apart; parent references may point at either form.
#[must_use]
pub fn strip_id_suffix(id: &str) -> &str {
    id.split('#').next().unwrap_or(id)
}

/// One labeled annotation unit on a task object.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Generated id, optionally carrying a `#suffix` disambiguator.
    pub id: String,
    /// Id of the parent region for hierarchical region trees.
    pub parent_id: Option<String>,
    /// Name of the object node this region annotates.
    pub object_name: String,
    /// Canonical percent-space geometry.
    pub shape: Shape,
    /// One entry per control that currently targets this region.
    pub entries: Vec<ResultEntry>,
    pub origin: ResultOrigin,
    /// Hidden regions stay in the collection but are not rendered.
    pub hidden: bool,
    /// Image rotation in effect for this region's geometry, `[0, 360)`.
    pub image_rotation: f64,
    /// Transient pixel-space display cache; recomputed on resize.
    pixel: Bounds,
}

impl Region {
    #[must_use]
    pub fn new(id: &str, object_name: &str, shape: Shape) -> Self {
        Self {
            id: id.to_string(),
            parent_id: None,
            object_name: object_name.to_string(),
            shape,
            entries: Vec::new(),
            origin: ResultOrigin::Manual,
            hidden: false,
            image_rotation: 0.0,
            pixel: Bounds::default(),
        }
    }

    /// Generate a fresh region id.
    #[must_use]
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The id without its `#suffix` disambiguator.
    #[must_use]
    pub fn base_id(&self) -> &str {
        strip_id_suffix(&self.id)
    }

    /// The entry contributed by the named control, if any.
    #[must_use]
    pub fn entry(&self, control_name: &str) -> Option<&ResultEntry> {
        self.entries.iter().find(|e| e.control_name == control_name)
    }

    /// All labels attached to this region, paired with the owning control.
    #[must_use]
    pub fn labels(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for entry in &self.entries {
            if let Some(labels) = entry.payload.labels() {
                for label in labels {
                    out.push((entry.control_name.as_str(), label.as_str()));
                }
            }
        }
        out
    }

    /// The current pixel-space display bounds.
    #[must_use]
    pub fn pixel_bounds(&self) -> Bounds {
        self.pixel
    }

    /// Synchronize this region's entry for one control with the control's
    /// currently active state.
    ///
    /// This is the single choke point through which label (re)assignment
    /// flows: the matching entry is updated, created, or — for non-geometric
    /// controls whose state emptied — removed. Returns `true` if anything
    /// changed. After the call the region's entries reflect exactly the
    /// active state of all controls targeting it.
    pub fn set_value(&mut self, control: &ControlNode) -> bool {
        let payload = control.current_payload();
        let existing = self.entries.iter().position(|e| e.control_name == control.name);
        match (existing, payload) {
            (Some(i), Some(payload)) => {
                if self.entries[i].payload == payload {
                    false
                } else {
                    self.entries[i].payload = payload;
                    true
                }
            }
            (Some(i), None) => {
                if control.kind.is_geometric() {
                    // The geometry itself is the state; only the labels clear.
                    let cleared = ControlPayload::Labels(Vec::new());
                    if self.entries[i].payload == cleared {
                        false
                    } else {
                        self.entries[i].payload = cleared;
                        true
                    }
                } else {
                    self.entries.remove(i);
                    true
                }
            }
            (None, Some(payload)) => {
                self.entries.push(ResultEntry::new(&control.name, payload));
                true
            }
            (None, None) => false,
        }
    }

    /// Recompute the pixel-space display cache for a new rendered size.
    ///
    /// Always derived from the canonical percent geometry, never from the
    /// previous pixel values, so the call is idempotent.
    pub fn update_image_size(&mut self, rendered_width: f64, rendered_height: f64) {
        self.pixel = self.shape.pixel_bounds(rendered_width, rendered_height);
    }

    /// Rotate the stored geometry with the image. Only quarter turns change
    /// geometry; the accumulated image rotation is normalized into `[0, 360)`.
    pub fn rotate(&mut self, degrees: f64) {
        let turn = geometry::normalize_angle(degrees);
        if turn % 90.0 == 0.0 {
            let quarter_turns = (turn / 90.0) as u32 % 4;
            for _ in 0..quarter_turns {
                self.shape.rotate90(true);
            }
        }
        self.image_rotation = geometry::normalize_angle(self.image_rotation + degrees);
    }

    /// Serialize this region's entries to wire results.
    ///
    /// Entries whose control/object references do not resolve are skipped and
    /// reported — a dangling result must not be serialized.
    pub fn serialize(&self, registry: &ConfigRegistry) -> (Vec<WireResult>, Vec<ConfigError>) {
        let mut results = Vec::with_capacity(self.entries.len());
        let mut errors = Vec::new();
        for entry in &self.entries {
            let (control, object) = match registry.resolve(&self.id, &entry.control_name, &self.object_name) {
                Ok(pair) => pair,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            let mut value = Map::new();
            self.shape.write_value_fields(&mut value);
            if !entry.payload.is_empty() {
                entry.payload.write_value_field(&mut value);
            }
            let pixel_based = self.shape.is_pixel_based()
                && matches!(object.kind, ObjectKind::Image | ObjectKind::Video);
            results.push(WireResult {
                id: self.id.clone(),
                from_name: entry.control_name.clone(),
                to_name: self.object_name.clone(),
                kind: control.kind.wire_name().to_string(),
                origin: entry.origin,
                value: Value::Object(value),
                score: entry.score,
                parent_id: self.parent_id.clone(),
                original_width: pixel_based.then_some(object.natural_width),
                original_height: pixel_based.then_some(object.natural_height),
                image_rotation: pixel_based.then_some(self.image_rotation),
            });
        }
        (results, errors)
    }
}
