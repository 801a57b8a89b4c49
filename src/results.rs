//! Result entities: the (from-control, to-object, value) triples serialized
//! to and from the host platform.
//!
//! A region usually owns exactly one result, but owns several when multiple
//! controls target the same object (e.g. a rectangle plus a per-region
//! choice). All wire results of one region share the region's `id`; that
//! shared id is the grouping key on hydration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ControlKind;
use crate::errors::DataError;

/// How a result came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultOrigin {
    /// Authored by the operator.
    #[default]
    Manual,
    /// Produced by a model and untouched since.
    Prediction,
    /// Produced by a model, then edited by the operator.
    PredictionChanged,
}

/// What a single control contributed to a region.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPayload {
    /// Toggled labels from a labeling control.
    Labels(Vec<String>),
    /// Selected choices from a classification control.
    Choices(Vec<String>),
    /// Text rows from a transcription control.
    Text(Vec<String>),
    /// A numeric rating.
    Number(f64),
}

impl ControlPayload {
    /// Whether the payload holds no state. An empty payload on a
    /// non-geometric control means its result should be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Labels(v) | Self::Choices(v) | Self::Text(v) => v.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// The key this payload occupies inside the wire `value` object.
    #[must_use]
    pub fn wire_key(&self) -> &'static str {
        match self {
            Self::Labels(_) => "labels",
            Self::Choices(_) => "choices",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
        }
    }

    /// The label values, when this payload carries labels.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        match self {
            Self::Labels(v) => Some(v),
            _ => None,
        }
    }

    /// Write the payload into a wire `value` object.
    pub fn write_value_field(&self, out: &mut Map<String, Value>) {
        match self {
            Self::Labels(v) | Self::Choices(v) | Self::Text(v) => {
                let items: Vec<Value> = v.iter().map(|s| Value::from(s.clone())).collect();
                out.insert(self.wire_key().into(), Value::Array(items));
            }
            Self::Number(n) => {
                out.insert("number".into(), serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number));
            }
        }
    }

    /// Parse the payload a control of the given kind would have written.
    /// Absent keys default to an empty payload (malformed, not fatal).
    pub fn from_value(kind: ControlKind, value: &Map<String, Value>, result_id: &str) -> Result<Self, DataError> {
        match kind {
            ControlKind::Choices => Ok(Self::Choices(string_list(value, "choices", result_id)?)),
            ControlKind::Textarea => Ok(Self::Text(string_list(value, "text", result_id)?)),
            ControlKind::Number => match value.get("number") {
                None => Err(DataError::MissingField { result_id: result_id.to_string(), field: "number" }),
                Some(v) => v
                    .as_f64()
                    .map(Self::Number)
                    .ok_or(DataError::WrongType { result_id: result_id.to_string(), field: "number" }),
            },
            _ => Ok(Self::Labels(string_list(value, "labels", result_id)?)),
        }
    }
}

fn string_list(map: &Map<String, Value>, field: &'static str, result_id: &str) -> Result<Vec<String>, DataError> {
    let Some(raw) = map.get(field) else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        return Err(DataError::WrongType { result_id: result_id.to_string(), field });
    };
    let mut items = Vec::with_capacity(arr.len());
    for item in arr {
        let s = item
            .as_str()
            .ok_or(DataError::WrongType { result_id: result_id.to_string(), field })?;
        items.push(s.to_string());
    }
    Ok(items)
}

/// One control's contribution attached to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// Name of the contributing control (`from_name` on the wire).
    pub control_name: String,
    pub payload: ControlPayload,
    pub origin: ResultOrigin,
    /// Model confidence, predictions only.
    pub score: Option<f64>,
}

impl ResultEntry {
    #[must_use]
    pub fn new(control_name: &str, payload: ControlPayload) -> Self {
        Self {
            control_name: control_name.to_string(),
            payload,
            origin: ResultOrigin::Manual,
            score: None,
        }
    }
}

/// A result as serialized to and from the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResult {
    /// Region id; shared across all results of one region.
    pub id: String,
    pub from_name: String,
    pub to_name: String,
    /// Result kind discriminator, e.g. `"rectangle"`, `"choices"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub origin: ResultOrigin,
    /// Open-ended value object: shape fields plus the control payload.
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
    /// Parent region id for hierarchical region trees.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
    /// Natural width the geometry was normalized against.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_width: Option<u32>,
    /// Natural height the geometry was normalized against.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_height: Option<u32>,
    /// Image rotation in effect when the geometry was captured.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_rotation: Option<f64>,
}

impl WireResult {
    /// The `value` payload as an object, or an error when it is not one.
    pub fn value_object(&self) -> Result<&Map<String, Value>, DataError> {
        self.value
            .as_object()
            .ok_or(DataError::WrongType { result_id: self.id.clone(), field: "value" })
    }
}
