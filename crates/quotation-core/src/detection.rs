//! Detector boundary
//!
//! Detections arrive as loosely-typed JSON from the vision collaborator.
//! They are validated once, here, into fixed-shape [`Detection`] records.
//! Nothing downstream of this module sees untyped input.
//!
//! Two document shapes are accepted:
//!
//! ```text
//! [ {"class_id": 0, "confidence": 0.91, "bbox": [10, 20, 40, 60]}, ... ]
//! { "plans/floor1.png": [ ... ], "plans/floor2.png": [ ... ] }
//! ```

use crate::error::{QuoteError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One recognized object instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    /// Detector score in `[0, 1]`
    pub confidence: f32,
    /// `(x1, y1, x2, y2)` in image pixels. Not used for pricing.
    pub bbox: [i32; 4],
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bbox: [i32; 4]) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }

    /// Validate a single JSON record. `path` prefixes field names in errors.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let record = value.as_object().ok_or_else(|| ValidationError::UnexpectedShape {
            path: path.to_string(),
            expected: "an object",
        })?;

        Ok(Self {
            class_id: class_id_field(record, path)?,
            confidence: confidence_field(record, path)?,
            bbox: bbox_field(record, path)?,
        })
    }
}

fn required<'a>(record: &'a Map<String, Value>, path: &str, name: &str) -> Result<&'a Value, ValidationError> {
    record
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::MissingField(format!("{}.{}", path, name)))
}

fn class_id_field(record: &Map<String, Value>, path: &str) -> Result<u32, ValidationError> {
    let field = format!("{}.class_id", path);
    required(record, path, "class_id")?
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| ValidationError::invalid(field, "expected a non-negative integer"))
}

fn confidence_field(record: &Map<String, Value>, path: &str) -> Result<f32, ValidationError> {
    let field = format!("{}.confidence", path);
    let confidence = required(record, path, "confidence")?
        .as_f64()
        .ok_or_else(|| ValidationError::invalid(&field, "expected a number"))?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::invalid(field, format!("{} is outside [0, 1]", confidence)));
    }
    Ok(confidence as f32)
}

fn bbox_field(record: &Map<String, Value>, path: &str) -> Result<[i32; 4], ValidationError> {
    let field = format!("{}.bbox", path);
    let coords = required(record, path, "bbox")?
        .as_array()
        .filter(|coords| coords.len() == 4)
        .ok_or_else(|| ValidationError::invalid(&field, "expected four integers"))?;

    let mut bbox = [0i32; 4];
    for (slot, coord) in bbox.iter_mut().zip(coords) {
        *slot = coord
            .as_i64()
            .and_then(|c| i32::try_from(c).ok())
            .ok_or_else(|| ValidationError::invalid(&field, "expected four integers"))?;
    }
    Ok(bbox)
}

/// Validate a JSON array of detection records.
pub fn parse_detections(value: &Value) -> Result<Vec<Detection>, ValidationError> {
    let records = value.as_array().ok_or_else(|| ValidationError::UnexpectedShape {
        path: "detections".to_string(),
        expected: "an array",
    })?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| Detection::from_value(record, &format!("detections[{}]", i)))
        .collect()
}

/// Parse detector output, selecting `image` when the document is keyed by
/// image path. A keyed document with a single entry needs no selector.
pub fn parse_detector_output(json: &str, image: Option<&str>) -> Result<Vec<Detection>, QuoteError> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| QuoteError::Serialize(e.to_string()))?;

    let selected = match &document {
        Value::Object(by_image) => match image {
            Some(key) => by_image
                .get(key)
                .ok_or_else(|| ValidationError::MissingField(key.to_string()))?,
            None => {
                let mut images = by_image.values();
                match (images.next(), images.next()) {
                    (Some(only), None) => only,
                    _ => {
                        return Err(ValidationError::UnexpectedShape {
                            path: "detections".to_string(),
                            expected: "an image selector for multi-image output",
                        }
                        .into())
                    }
                }
            }
        },
        other => other,
    };

    Ok(parse_detections(selected)?)
}

/// Intake filter applied once, between the detector and the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionFilter {
    /// Drop detections scoring below this threshold
    pub min_confidence: Option<f32>,
    /// Keep only these class ids
    pub classes: Option<BTreeSet<u32>>,
}

impl DetectionFilter {
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = Some(threshold);
        self
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = u32>) -> Self {
        self.classes = Some(classes.into_iter().collect());
        self
    }

    /// The threshold must be a number in `[0, 1]`, like detection confidences.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.min_confidence {
            Some(threshold) if !(0.0..=1.0).contains(&threshold) => Err(ValidationError::invalid(
                "detections.min_confidence",
                format!("{} is outside [0, 1]", threshold),
            )),
            _ => Ok(()),
        }
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        let confident = self
            .min_confidence
            .map_or(true, |threshold| detection.confidence >= threshold);
        let allowed = self
            .classes
            .as_ref()
            .map_or(true, |classes| classes.contains(&detection.class_id));
        confident && allowed
    }

    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let before = detections.len();
        let kept: Vec<Detection> = detections.into_iter().filter(|d| self.accepts(d)).collect();
        tracing::debug!(before, after = kept.len(), "filtered detections");
        kept
    }
}
