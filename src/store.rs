//! Annotation store: the set of annotations, predictions, and history
//! entries for one task, and which of them is selected for rendering.
//!
//! Exactly one task populates the store at a time; hydrating a new task
//! resets it to defaults first. A time-travel history entry, when set, takes
//! precedence over the current annotation for rendering. In-flight
//! suggestion loads carry a generation token so a stale response can never
//! clobber a newer one (last-write-wins).

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationKind, HydrateReport};
use crate::config::ConfigRegistry;
use crate::errors::{ConfigError, DataError};
use crate::results::{ResultOrigin, WireResult};

/// Hydration input for one annotation or prediction, as provided by the
/// host platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    #[serde(default)]
    pub result: Vec<WireResult>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accepted_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub ground_truth: bool,
    /// Model confidence, predictions only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
}

/// Store of all labeling passes for the currently loaded task.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    predictions: Vec<Annotation>,
    current: Option<String>,
    current_history: Option<Annotation>,
    pub viewing_all_annotations: bool,
    pub viewing_all_predictions: bool,
    /// Non-fatal configuration diagnostics from hydration/serialization.
    pub validation_errors: Vec<ConfigError>,
    /// Non-fatal data-format diagnostics from hydration.
    pub data_errors: Vec<DataError>,
    suggestion_generation: u64,
}

impl AnnotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to defaults. Called before a new task is hydrated.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // --- Queries ---

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn predictions(&self) -> &[Annotation] {
        &self.predictions
    }

    /// The current annotation (or prediction) selected for editing.
    #[must_use]
    pub fn current(&self) -> Option<&Annotation> {
        let id = self.current.as_deref()?;
        self.find(id)
    }

    pub fn current_mut(&mut self) -> Option<&mut Annotation> {
        let id = self.current.clone()?;
        self.find_mut(&id)
    }

    /// The annotation that should be rendered: a time-travel history entry
    /// takes precedence over the current annotation.
    #[must_use]
    pub fn rendered(&self) -> Option<&Annotation> {
        self.current_history.as_ref().or_else(|| self.current())
    }

    fn find(&self, id: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.id == id)
            .or_else(|| self.predictions.iter().find(|a| a.id == id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        if let Some(i) = self.annotations.iter().position(|a| a.id == id) {
            return self.annotations.get_mut(i);
        }
        if let Some(i) = self.predictions.iter().position(|a| a.id == id) {
            return self.predictions.get_mut(i);
        }
        None
    }

    // --- Hydration ---

    /// Populate the store from a task payload. Resets any previous task's
    /// data first and selects the first annotation (creating a blank one if
    /// the task has none).
    pub fn hydrate_task(
        &mut self,
        annotations: Vec<TaskEntry>,
        predictions: Vec<TaskEntry>,
        registry: &ConfigRegistry,
    ) {
        self.reset();
        for entry in annotations {
            let ann = self.build(entry, AnnotationKind::Annotation, registry);
            self.annotations.push(ann);
        }
        for entry in predictions {
            let pred = self.build(entry, AnnotationKind::Prediction, registry);
            self.predictions.push(pred);
        }
        self.current = match self.annotations.first() {
            Some(first) => Some(first.id.clone()),
            None => {
                let blank = Annotation::new(&Annotation::generate_id(), AnnotationKind::Annotation);
                let id = blank.id.clone();
                self.annotations.push(blank);
                Some(id)
            }
        };
    }

    fn build(&mut self, entry: TaskEntry, kind: AnnotationKind, registry: &ConfigRegistry) -> Annotation {
        let mut ann = Annotation::new(&entry.id, kind);
        ann.skipped = entry.skipped;
        ann.accepted_state = entry.accepted_state;
        ann.created_by = entry.created_by;
        ann.created_date = entry.created_date;
        ann.ground_truth = entry.ground_truth;
        ann.score = entry.score;
        let report = ann.hydrate(entry.result, registry);
        self.absorb(report);
        ann
    }

    fn absorb(&mut self, mut report: HydrateReport) {
        self.validation_errors.append(&mut report.config_errors);
        self.data_errors.append(&mut report.data_errors);
    }

    // --- Selection ---

    /// Select an annotation or prediction for editing. Clears any
    /// time-travel view. Returns `false` if no such id exists.
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.current = Some(id.to_string());
        self.current_history = None;
        true
    }

    /// Create a fresh editable annotation and select it.
    pub fn create_annotation(&mut self) -> &Annotation {
        let ann = Annotation::new(&Annotation::generate_id(), AnnotationKind::Annotation);
        self.current = Some(ann.id.clone());
        self.current_history = None;
        self.annotations.push(ann);
        // Just pushed above.
        &self.annotations[self.annotations.len() - 1]
    }

    /// Enter time-travel view on a history snapshot.
    pub fn view_history_entry(&mut self, mut entry: Annotation) {
        entry.kind = AnnotationKind::History;
        entry.editable = false;
        self.current_history = Some(entry);
    }

    /// Leave time-travel view.
    pub fn clear_history_view(&mut self) {
        self.current_history = None;
    }

    // --- Conversions ---

    /// Deep-copy an annotation into the predictions collection. The original
    /// is left untouched. Returns the new prediction's id.
    pub fn annotation_to_prediction(&mut self, id: &str) -> Option<String> {
        let source = self.annotations.iter().find(|a| a.id == id)?;
        let copy = source.deep_copy_as(&Annotation::generate_id(), AnnotationKind::Prediction);
        let new_id = copy.id.clone();
        self.predictions.push(copy);
        Some(new_id)
    }

    /// Deep-copy a prediction into a new editable annotation and select it.
    /// The copied results keep their prediction origin.
    pub fn prediction_to_annotation(&mut self, id: &str) -> Option<String> {
        let source = self.predictions.iter().find(|a| a.id == id)?;
        let copy = source.deep_copy_as(&Annotation::generate_id(), AnnotationKind::Annotation);
        let new_id = copy.id.clone();
        self.annotations.push(copy);
        self.current = Some(new_id.clone());
        self.current_history = None;
        Some(new_id)
    }

    // --- Suggestions ---

    /// Start a suggestion load, superseding any in-flight one. The returned
    /// token must accompany the response.
    pub fn begin_suggestions(&mut self) -> u64 {
        self.suggestion_generation += 1;
        self.suggestion_generation
    }

    /// Apply a suggestion response to the current annotation. A response
    /// carrying a stale token is dropped (last-write-wins). Returns `true`
    /// if the suggestions were applied.
    pub fn apply_suggestions(&mut self, token: u64, results: Vec<WireResult>, registry: &ConfigRegistry) -> bool {
        if token != self.suggestion_generation {
            tracing::warn!(token, newest = self.suggestion_generation, "dropping stale suggestion response");
            return false;
        }
        let Some(current) = self.current_mut() else {
            return false;
        };
        let results = results
            .into_iter()
            .map(|mut r| {
                if r.origin == ResultOrigin::Manual {
                    r.origin = ResultOrigin::Prediction;
                }
                r
            })
            .collect();
        let report = current.hydrate(results, registry);
        self.absorb(report);
        true
    }
}
