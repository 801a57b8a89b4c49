//! Configuration registry: the explicit, passed-down interface to the
//! tag-configuration tree.
//!
//! The tag grammar and its parser are external collaborators. This module
//! holds the part the data model needs: per control node its kind, `to_name`
//! linkage, label definitions and currently-selected state; per object node
//! its kind, natural size, and sync group. The registry is constructed once
//! per editor session and passed down — never a module-level singleton.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::results::ControlPayload;

/// The kind of a control tag: what kind of label/value it assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Axis-aligned rectangle drawn on an image.
    Rectangle,
    /// Ellipse drawn on an image.
    Ellipse,
    /// Closed polygon drawn on an image.
    Polygon,
    /// Single keypoint on an image.
    Keypoint,
    /// Painted pixel mask on an image (magic wand, brush).
    Brush,
    /// Start/end range on time-based media.
    Timerange,
    /// Character span on a text object.
    Textspan,
    /// Labels attached to regions created by another control.
    Labels,
    /// Single- or multi-select classification.
    Choices,
    /// Free-text transcription.
    Textarea,
    /// Numeric rating.
    Number,
}

impl ControlKind {
    /// Whether this control authors geometry (creates regions by drawing).
    #[must_use]
    pub fn is_geometric(self) -> bool {
        matches!(
            self,
            Self::Rectangle
                | Self::Ellipse
                | Self::Polygon
                | Self::Keypoint
                | Self::Brush
                | Self::Timerange
                | Self::Textspan
        )
    }

    /// Whether this control carries a label set.
    #[must_use]
    pub fn supports_labeling(self) -> bool {
        self.is_geometric() || self == Self::Labels
    }

    /// Whether this control can attach its value to an existing region.
    #[must_use]
    pub fn supports_per_region(self) -> bool {
        matches!(self, Self::Labels | Self::Choices | Self::Textarea | Self::Number)
    }

    /// The `type` string used on the wire for results from this control.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
            Self::Keypoint => "keypoint",
            Self::Brush => "brush",
            Self::Timerange => "timerange",
            Self::Textspan => "textspan",
            Self::Labels => "labels",
            Self::Choices => "choices",
            Self::Textarea => "textarea",
            Self::Number => "number",
        }
    }

    /// Parse a wire `type` string back into a kind.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "rectangle" => Some(Self::Rectangle),
            "ellipse" => Some(Self::Ellipse),
            "polygon" => Some(Self::Polygon),
            "keypoint" => Some(Self::Keypoint),
            "brush" => Some(Self::Brush),
            "timerange" => Some(Self::Timerange),
            "textspan" => Some(Self::Textspan),
            "labels" => Some(Self::Labels),
            "choices" => Some(Self::Choices),
            "textarea" => Some(Self::Textarea),
            "number" => Some(Self::Number),
            _ => None,
        }
    }
}

/// The kind of an object tag: the data being labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Image,
    Audio,
    Video,
    Text,
    Timeseries,
    Paragraphs,
}

impl ObjectKind {
    /// Whether this object participates in playback synchronization.
    #[must_use]
    pub fn is_time_based(self) -> bool {
        matches!(self, Self::Audio | Self::Video | Self::Paragraphs)
    }
}

/// One label definition inside a labeling control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    /// Label text; the value stored in results.
    pub value: String,
    /// Keyboard shortcut, if configured.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hotkey: Option<String>,
    /// Display color, if configured.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub background: Option<String>,
}

impl LabelDef {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self { value: value.to_string(), hotkey: None, background: None }
    }
}

/// A control node from the configuration tree, plus its live UI state.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlNode {
    /// Tag name; the `from_name` of results this control produces.
    pub name: String,
    pub kind: ControlKind,
    /// Name of the object node this control targets.
    pub to_name: String,
    /// Configured label/choice definitions.
    pub labels: Vec<LabelDef>,
    /// Labels or choices currently toggled in the UI.
    pub selected: Vec<String>,
    /// Text rows currently entered (textarea controls).
    pub text: Vec<String>,
    /// Number currently entered (number controls).
    pub number: Option<f64>,
    /// Whether the control attaches per-region rather than per-task.
    pub per_region: bool,
}

impl ControlNode {
    #[must_use]
    pub fn new(name: &str, kind: ControlKind, to_name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            to_name: to_name.to_string(),
            labels: Vec::new(),
            selected: Vec::new(),
            text: Vec::new(),
            number: None,
            per_region: kind.supports_per_region(),
        }
    }

    /// The hotkey configured for a label value, if any.
    #[must_use]
    pub fn hotkey_for(&self, value: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.value == value)
            .and_then(|l| l.hotkey.as_deref())
    }

    /// The control's currently active state as a result payload, or `None`
    /// when the control holds no state.
    #[must_use]
    pub fn current_payload(&self) -> Option<ControlPayload> {
        match self.kind {
            ControlKind::Choices => {
                if self.selected.is_empty() {
                    None
                } else {
                    Some(ControlPayload::Choices(self.selected.clone()))
                }
            }
            ControlKind::Textarea => {
                if self.text.is_empty() {
                    None
                } else {
                    Some(ControlPayload::Text(self.text.clone()))
                }
            }
            ControlKind::Number => self.number.map(ControlPayload::Number),
            _ => {
                if self.selected.is_empty() {
                    None
                } else {
                    Some(ControlPayload::Labels(self.selected.clone()))
                }
            }
        }
    }
}

/// An object node from the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    /// Tag name; the `to_name` of results bound to this object.
    pub name: String,
    pub kind: ObjectKind,
    /// Intrinsic pixel width, independent of zoom/container size.
    pub natural_width: u32,
    /// Intrinsic pixel height, independent of zoom/container size.
    pub natural_height: u32,
    /// Playback synchronization group, shared via the `sync` attribute.
    pub sync_group: Option<String>,
}

impl ObjectNode {
    #[must_use]
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            natural_width: 0,
            natural_height: 0,
            sync_group: None,
        }
    }
}

/// The registry of live control and object nodes for one editor session.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    controls: HashMap<String, ControlNode>,
    objects: HashMap<String, ObjectNode>,
}

impl ConfigRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a control node.
    pub fn add_control(&mut self, control: ControlNode) {
        self.controls.insert(control.name.clone(), control);
    }

    /// Insert or replace an object node.
    pub fn add_object(&mut self, object: ObjectNode) {
        self.objects.insert(object.name.clone(), object);
    }

    #[must_use]
    pub fn control(&self, name: &str) -> Option<&ControlNode> {
        self.controls.get(name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut ControlNode> {
        self.controls.get_mut(name)
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectNode> {
        self.objects.get(name)
    }

    /// Resolve a result's `from_name`/`to_name` pair to live nodes.
    ///
    /// A result with a dangling reference is invalid and must not be
    /// serialized; callers skip it and retain the error as a diagnostic.
    pub fn resolve(
        &self,
        result_id: &str,
        from_name: &str,
        to_name: &str,
    ) -> Result<(&ControlNode, &ObjectNode), ConfigError> {
        let control = self.controls.get(from_name).ok_or_else(|| ConfigError::UnknownControl {
            result_id: result_id.to_string(),
            name: from_name.to_string(),
        })?;
        let object = self.objects.get(to_name).ok_or_else(|| ConfigError::UnknownObject {
            result_id: result_id.to_string(),
            name: to_name.to_string(),
        })?;
        if control.to_name != object.name {
            return Err(ConfigError::MismatchedTarget {
                result_id: result_id.to_string(),
                control: control.name.clone(),
                expected: control.to_name.clone(),
                actual: object.name.clone(),
            });
        }
        Ok((control, object))
    }
}
