//! Dataset value objects
//!
//! A [`Dataset`] is an immutable bundle of rows, feature names and label
//! metadata. Rows are never mutated in place; every transformation
//! (splitting, feature selection, preprocessing) produces new rows so the
//! original data stays available for display.

mod splitter;
pub mod synthetic;

pub use splitter::{DataSplit, DatasetSplitter, SplitIndices, SplitOptions};

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

/// Kind of prediction task a dataset describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    Classification,
    Regression,
}

/// Row label: a raw number or a class name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Numeric(f64),
    Categorical(String),
}

/// A single observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub features: Vec<f64>,
    pub label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DataPoint {
    pub fn new(features: Vec<f64>, label: Label) -> Self {
        Self {
            features,
            label,
            id: None,
        }
    }

    /// Copy of this point with a different feature vector
    pub fn with_features(&self, features: Vec<f64>) -> Self {
        Self {
            features,
            label: self.label.clone(),
            id: self.id.clone(),
        }
    }
}

/// In-memory dataset with feature/label metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub data: Vec<DataPoint>,
    pub feature_names: Vec<String>,
    pub label_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    pub problem_type: ProblemType,
}

impl Dataset {
    /// Create a dataset, validating its shape invariants.
    ///
    /// Every row must carry exactly `feature_names.len()` features. For
    /// classification, every label must resolve into the `classes` index
    /// domain.
    pub fn new(
        data: Vec<DataPoint>,
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        classes: Option<Vec<String>>,
        problem_type: ProblemType,
    ) -> Result<Self> {
        let dataset = Self {
            data,
            feature_names,
            label_name: label_name.into(),
            classes,
            problem_type,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<()> {
        let width = self.feature_names.len();
        for (i, point) in self.data.iter().enumerate() {
            if point.features.len() != width {
                return Err(ArenaError::InvalidDataset(format!(
                    "row {} has {} features, expected {}",
                    i,
                    point.features.len(),
                    width
                )));
            }
        }
        if self.problem_type == ProblemType::Classification {
            for (i, point) in self.data.iter().enumerate() {
                self.class_index(&point.label).map_err(|_| {
                    ArenaError::InvalidDataset(format!(
                        "row {} label {:?} is outside the class domain",
                        i, point.label
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolve a label to its numeric form: class index for classification,
    /// raw value for regression.
    pub fn numeric_label(&self, label: &Label) -> Result<f64> {
        match self.problem_type {
            ProblemType::Classification => self.class_index(label).map(|i| i as f64),
            ProblemType::Regression => match label {
                Label::Numeric(v) => Ok(*v),
                Label::Categorical(s) => Err(ArenaError::InvalidDataset(format!(
                    "categorical label {:?} in a regression dataset",
                    s
                ))),
            },
        }
    }

    fn class_index(&self, label: &Label) -> Result<usize> {
        let classes = self
            .classes
            .as_ref()
            .ok_or_else(|| ArenaError::InvalidDataset("classification dataset has no classes".to_string()))?;
        match label {
            Label::Categorical(name) => classes
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| ArenaError::InvalidDataset(format!("unknown class {:?}", name))),
            Label::Numeric(v) => {
                let idx = *v as usize;
                if v.fract() == 0.0 && *v >= 0.0 && idx < classes.len() {
                    Ok(idx)
                } else {
                    Err(ArenaError::InvalidDataset(format!(
                        "numeric label {} is not a valid class index",
                        v
                    )))
                }
            }
        }
    }
}
