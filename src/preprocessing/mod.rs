//! Data preprocessing
//!
//! Every transform follows the same discipline: parameters are fitted on the
//! training partition only and then applied unchanged to train, validation
//! and test. Refitting on validation/test would leak evaluation data into
//! the fitted parameters and corrupt score comparability.

mod encoder;
mod scaler;

pub use encoder::{Encoder, FittedEncoder};
pub use scaler::{FittedScaler, Scaler, ScalerKind};

use serde::{Deserialize, Serialize};

use crate::dataset::{DataPoint, DataSplit};
use crate::error::Result;

/// Preprocessing method applied before training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMethod {
    #[default]
    None,
    Normalize,
    Standardize,
    Encode,
}

/// Preprocessing configuration carried by a submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub method: PreprocessMethod,
    /// Feature columns to label-encode, as positions in the selected
    /// feature space. Only used by [`PreprocessMethod::Encode`].
    #[serde(default)]
    pub encoded_features: Vec<usize>,
}

impl PreprocessConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn normalize() -> Self {
        Self {
            method: PreprocessMethod::Normalize,
            encoded_features: Vec::new(),
        }
    }

    pub fn standardize() -> Self {
        Self {
            method: PreprocessMethod::Standardize,
            encoded_features: Vec::new(),
        }
    }

    pub fn encode(columns: Vec<usize>) -> Self {
        Self {
            method: PreprocessMethod::Encode,
            encoded_features: columns,
        }
    }
}

/// Fit the configured transform on the split's train partition and apply the
/// fitted parameters to all three partitions.
pub fn preprocess_split(split: &DataSplit, config: &PreprocessConfig) -> Result<DataSplit> {
    match config.method {
        PreprocessMethod::None => Ok(split.clone()),
        PreprocessMethod::Normalize => {
            let fitted = Scaler::new(ScalerKind::MinMax).fit(&split.train)?;
            Ok(apply_all(split, |rows| fitted.apply(rows)))
        }
        PreprocessMethod::Standardize => {
            let fitted = Scaler::new(ScalerKind::Standard).fit(&split.train)?;
            Ok(apply_all(split, |rows| fitted.apply(rows)))
        }
        PreprocessMethod::Encode => {
            let fitted = Encoder::new(config.encoded_features.clone()).fit(&split.train)?;
            Ok(apply_all(split, |rows| fitted.apply(rows)))
        }
    }
}

fn apply_all<F>(split: &DataSplit, transform: F) -> DataSplit
where
    F: Fn(&[DataPoint]) -> Vec<DataPoint>,
{
    DataSplit {
        train: transform(&split.train),
        validation: transform(&split.validation),
        test: transform(&split.test),
    }
}
