//! Annotation aggregate: the ordered region/result collection for one
//! labeling pass, plus selection state and undo history.
//!
//! All mutations of the region collection flow through this type and are
//! applied synchronously — listeners never observe a half-applied create or
//! delete. Every structural mutation records an undo snapshot; in-progress
//! gestures batch their snapshots with [`History::freeze`]. Non-editable
//! annotations (predictions, history entries) silently refuse mutation.

#[cfg(test)]
#[path = "annotation_test.rs"]
mod annotation_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::{ConfigRegistry, ControlNode};
use crate::errors::{ConfigError, DataError};
use crate::history::History;
use crate::region::{Region, strip_id_suffix};
use crate::results::{ControlPayload, ResultEntry, WireResult};
use crate::shape::Shape;

/// Which role an annotation plays in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// User-authored labeling pass.
    Annotation,
    /// Machine-generated candidate, read-only until accepted.
    Prediction,
    /// Time-travel snapshot from the edit history, read-only.
    History,
}

/// Diagnostics accumulated while hydrating a server payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrateReport {
    pub config_errors: Vec<ConfigError>,
    pub data_errors: Vec<DataError>,
}

impl HydrateReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.config_errors.is_empty() && self.data_errors.is_empty()
    }
}

/// One complete labeling pass over a task.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: String,
    pub kind: AnnotationKind,
    pub created_by: Option<String>,
    pub created_date: Option<String>,
    /// `false` forbids any mutation of the region collection.
    pub editable: bool,
    pub ground_truth: bool,
    pub skipped: bool,
    pub accepted_state: Option<String>,
    /// Model confidence, predictions only.
    pub score: Option<f64>,
    regions: Vec<Region>,
    selected: Option<String>,
    history: History<Vec<Region>>,
}

impl Annotation {
    #[must_use]
    pub fn new(id: &str, kind: AnnotationKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            created_by: None,
            created_date: None,
            editable: kind == AnnotationKind::Annotation,
            ground_truth: false,
            skipped: false,
            accepted_state: None,
            score: None,
            regions: Vec::new(),
            selected: None,
            history: History::new(Vec::new()),
        }
    }

    /// Generate a fresh annotation id.
    #[must_use]
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    // --- Queries ---

    /// The ordered region collection.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Look up a region by id, tolerating a `#suffix` on either side.
    #[must_use]
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.id == id)
            .or_else(|| self.regions.iter().find(|r| r.base_id() == strip_id_suffix(id)))
    }

    fn region_index(&self, id: &str) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| r.id == id)
            .or_else(|| self.regions.iter().position(|r| r.base_id() == strip_id_suffix(id)))
    }

    /// The currently selected (highlighted) region, if any.
    #[must_use]
    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.as_deref().and_then(|id| self.region(id))
    }

    // --- Selection ---

    /// Select a region for highlighting. Selection is exclusive: any
    /// previously selected region is implicitly deselected. Returns `false`
    /// if no such region exists.
    pub fn select_region(&mut self, id: &str) -> bool {
        match self.region(id) {
            Some(r) => {
                self.selected = Some(r.id.clone());
                true
            }
            None => false,
        }
    }

    /// Clear the selection. Safe to call with nothing selected.
    pub fn unselect_all(&mut self) {
        self.selected = None;
    }

    // --- Mutations ---

    /// Create a region with one result in a single atomic step.
    ///
    /// The central creation entry point used by every tag type: generates a
    /// unique id, links `from`/`to`, and inserts into the collection with no
    /// intermediate state observable. Returns the new region's id, or
    /// `Ok(None)` when the annotation is not editable or the control holds
    /// nothing to record.
    pub fn create_result(
        &mut self,
        shape: Shape,
        control: &ControlNode,
        registry: &ConfigRegistry,
    ) -> Result<Option<String>, ConfigError> {
        if !self.editable {
            return Ok(None);
        }
        let id = Region::generate_id();
        registry.resolve(&id, &control.name, &control.to_name)?;
        let payload = match control.current_payload() {
            Some(p) => p,
            None if control.kind.is_geometric() => ControlPayload::Labels(Vec::new()),
            None => return Ok(None),
        };
        let mut region = Region::new(&id, &control.to_name, shape);
        region.entries.push(ResultEntry::new(&control.name, payload));
        self.regions.push(region);
        self.record();
        Ok(Some(id))
    }

    /// Synchronize a region's entry for one control with the control's
    /// current state (see [`Region::set_value`]). Removing the last entry
    /// destroys the region. Returns `true` if anything changed.
    pub fn set_region_value(&mut self, region_id: &str, control: &ControlNode) -> bool {
        if !self.editable {
            return false;
        }
        let Some(i) = self.region_index(region_id) else {
            return false;
        };
        if !self.regions[i].set_value(control) {
            return false;
        }
        if self.regions[i].entries.is_empty() {
            let removed = self.regions.remove(i);
            if self.selected.as_deref() == Some(removed.id.as_str()) {
                self.selected = None;
            }
        }
        self.record();
        true
    }

    /// Replace a region's canonical geometry (drag/resize updates).
    pub fn set_region_shape(&mut self, region_id: &str, shape: Shape) -> bool {
        if !self.editable {
            return false;
        }
        let Some(i) = self.region_index(region_id) else {
            return false;
        };
        self.regions[i].shape = shape;
        self.record();
        true
    }

    /// Delete a region, returning it so tool-specific cleanup (e.g. wand
    /// cache invalidation) can run. Silent no-op when not editable.
    pub fn delete_region(&mut self, region_id: &str) -> Option<Region> {
        if !self.editable {
            return None;
        }
        let i = self.region_index(region_id)?;
        if self.selected.as_deref() == Some(self.regions[i].id.as_str()) {
            self.selected = None;
        }
        let removed = self.regions.remove(i);
        self.record();
        Some(removed)
    }

    /// Recompute pixel display geometry for all regions after a resize/zoom.
    /// Display-only; records no history.
    pub fn update_image_size(&mut self, rendered_width: f64, rendered_height: f64) {
        for region in &mut self.regions {
            region.update_image_size(rendered_width, rendered_height);
        }
    }

    /// Rotate all regions with the image.
    pub fn rotate(&mut self, degrees: f64) -> bool {
        if !self.editable {
            return false;
        }
        for region in &mut self.regions {
            region.rotate(degrees);
        }
        self.record();
        true
    }

    // --- History ---

    fn record(&mut self) {
        self.history.record(self.regions.clone());
    }

    /// Begin batching history under a key (start of a drag gesture).
    pub fn freeze_history(&mut self, key: &str) {
        self.history.freeze(key);
    }

    /// Release a history batch key (end of a drag gesture).
    pub fn unfreeze_history(&mut self, key: &str) {
        self.history.unfreeze(key);
    }

    /// Number of history entries, including the initial state.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Vec<Region>) {
        self.regions = snapshot;
        if let Some(id) = self.selected.clone() {
            if self.region(&id).is_none() {
                self.selected = None;
            }
        }
    }

    // --- Wire format ---

    /// Populate regions from a server payload. Results sharing an id group
    /// into one region. Dangling references and malformed values are
    /// reported and skipped/defaulted; hydration never fails outright.
    pub fn hydrate(&mut self, results: Vec<WireResult>, registry: &ConfigRegistry) -> HydrateReport {
        let mut report = HydrateReport::default();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<WireResult>> = HashMap::new();
        for result in results {
            if !groups.contains_key(&result.id) {
                order.push(result.id.clone());
            }
            groups.entry(result.id.clone()).or_default().push(result);
        }

        for id in order {
            let Some(group) = groups.remove(&id) else {
                continue;
            };
            if let Some(region) = Self::hydrate_region(&id, group, registry, &mut report) {
                self.regions.push(region);
            }
        }
        self.history.reset(self.regions.clone());
        report
    }

    fn hydrate_region(
        id: &str,
        group: Vec<WireResult>,
        registry: &ConfigRegistry,
        report: &mut HydrateReport,
    ) -> Option<Region> {
        let object_name = group.first().map(|r| r.to_name.clone())?;
        let mut region = Region::new(id, &object_name, Shape::Global);
        let mut shape_set = false;
        for wire in group {
            let control = match registry.resolve(&wire.id, &wire.from_name, &wire.to_name) {
                Ok((control, _)) => control,
                Err(e) => {
                    tracing::warn!(result_id = %wire.id, error = %e, "skipping result with dangling reference");
                    report.config_errors.push(e);
                    continue;
                }
            };
            let value = match wire.value_object() {
                Ok(v) => v,
                Err(e) => {
                    report.data_errors.push(e);
                    continue;
                }
            };
            if control.kind.is_geometric() && !shape_set {
                match Shape::from_value(control.kind.wire_name(), value, &wire.id) {
                    Ok(shape) => {
                        region.shape = shape;
                        region.image_rotation = wire.image_rotation.unwrap_or(0.0);
                        shape_set = true;
                    }
                    Err(e) => report.data_errors.push(e),
                }
            }
            let payload = match ControlPayload::from_value(control.kind, value, &wire.id) {
                Ok(p) => p,
                Err(e) => {
                    // Malformed payload defaults to empty rather than failing.
                    report.data_errors.push(e);
                    ControlPayload::Labels(Vec::new())
                }
            };
            if region.parent_id.is_none() {
                region.parent_id = wire.parent_id.clone();
            }
            region.entries.push(ResultEntry {
                control_name: wire.from_name.clone(),
                payload,
                origin: wire.origin,
                score: wire.score,
            });
            region.origin = region.entries[0].origin;
        }
        if region.entries.is_empty() { None } else { Some(region) }
    }

    /// Serialize all regions to wire results, skipping entries with dangling
    /// references and reporting them.
    pub fn serialize(&self, registry: &ConfigRegistry) -> (Vec<WireResult>, Vec<ConfigError>) {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for region in &self.regions {
            let (mut wire, mut errs) = region.serialize(registry);
            results.append(&mut wire);
            errors.append(&mut errs);
        }
        (results, errors)
    }

    /// Deep-copy this annotation's regions into a new annotation of the
    /// given kind. The original is left untouched.
    #[must_use]
    pub fn deep_copy_as(&self, new_id: &str, kind: AnnotationKind) -> Annotation {
        let mut copy = Annotation::new(new_id, kind);
        copy.created_by = self.created_by.clone();
        copy.ground_truth = self.ground_truth;
        copy.score = self.score;
        copy.regions = self.regions.clone();
        copy.history.reset(copy.regions.clone());
        copy
    }
}
