//! Train/validation/test partitioning
//!
//! Shuffling is driven by an explicit seeded PRNG instance so the same seed
//! and input order always reproduce the same partition. Stratified splitting
//! groups rows by discrete label, shuffles within each group and takes
//! `floor(group_len * ratio)` rows per split per group; flooring remainders
//! land in the test partition.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DataPoint, Label, ProblemType};
use crate::error::{ArenaError, Result};

const RATIO_EPSILON: f64 = 1e-3;

/// Options controlling a three-way split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOptions {
    pub train_ratio: f64,
    pub validation_ratio: f64,
    pub test_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub stratified: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            validation_ratio: 0.15,
            test_ratio: 0.15,
            random_seed: None,
            stratified: false,
        }
    }
}

impl SplitOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn stratified(mut self) -> Self {
        self.stratified = true;
        self
    }

    fn validate(&self) -> Result<()> {
        let sum = self.train_ratio + self.validation_ratio + self.test_ratio;
        if (sum - 1.0).abs() > RATIO_EPSILON {
            return Err(ArenaError::Configuration(format!(
                "split ratios must sum to 1.0, got {:.4} ({}/{}/{})",
                sum, self.train_ratio, self.validation_ratio, self.test_ratio
            )));
        }
        if self.train_ratio < 0.0 || self.validation_ratio < 0.0 || self.test_ratio < 0.0 {
            return Err(ArenaError::Configuration(
                "split ratios must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Row-index partitions of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

/// Materialized partitions
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train: Vec<DataPoint>,
    pub validation: Vec<DataPoint>,
    pub test: Vec<DataPoint>,
}

impl DataSplit {
    /// Project every partition onto the given feature columns.
    pub fn select_features(&self, selected: &[usize]) -> DataSplit {
        let project = |rows: &[DataPoint]| {
            rows.iter()
                .map(|p| p.with_features(selected.iter().map(|&i| p.features[i]).collect()))
                .collect()
        };
        DataSplit {
            train: project(&self.train),
            validation: project(&self.validation),
            test: project(&self.test),
        }
    }
}

/// Three-way dataset splitter
pub struct DatasetSplitter {
    opts: SplitOptions,
}

impl DatasetSplitter {
    pub fn new(opts: SplitOptions) -> Self {
        Self { opts }
    }

    /// Split rows into materialized train/validation/test partitions.
    pub fn split(&self, data: &[DataPoint], problem_type: ProblemType) -> Result<DataSplit> {
        let indices = self.split_indices(data, problem_type)?;
        let gather = |idx: &[usize]| idx.iter().map(|&i| data[i].clone()).collect();
        Ok(DataSplit {
            train: gather(&indices.train),
            validation: gather(&indices.validation),
            test: gather(&indices.test),
        })
    }

    /// Split rows into index partitions. Partitions are disjoint and their
    /// union equals the input row set.
    pub fn split_indices(&self, data: &[DataPoint], problem_type: ProblemType) -> Result<SplitIndices> {
        self.opts.validate()?;

        let mut rng = match self.opts.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        // Stratification needs a discrete label domain. For continuous
        // (regression) labels we fall back to a plain shuffled split.
        if self.opts.stratified {
            if problem_type == ProblemType::Classification {
                return self.stratified_indices(data, &mut rng);
            }
            debug!("stratified split requested for continuous labels, using plain split");
        }

        self.plain_indices(data.len(), &mut rng)
    }

    fn plain_indices(&self, n: usize, rng: &mut ChaCha8Rng) -> Result<SplitIndices> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);

        let n_train = (n as f64 * self.opts.train_ratio).floor() as usize;
        let n_val = (n as f64 * self.opts.validation_ratio).floor() as usize;

        // Remainder rows from flooring go to test.
        let test = indices.split_off((n_train + n_val).min(n));
        let validation = indices.split_off(n_train.min(indices.len()));

        Ok(SplitIndices {
            train: indices,
            validation,
            test,
        })
    }

    fn stratified_indices(&self, data: &[DataPoint], rng: &mut ChaCha8Rng) -> Result<SplitIndices> {
        // Group rows by label; BTreeMap keeps group order deterministic.
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, point) in data.iter().enumerate() {
            groups.entry(label_key(&point.label)).or_default().push(i);
        }

        let mut train = Vec::new();
        let mut validation = Vec::new();
        let mut test = Vec::new();

        for indices in groups.values_mut() {
            indices.shuffle(rng);
            let len = indices.len();
            let n_train = (len as f64 * self.opts.train_ratio).floor() as usize;
            let n_val = (len as f64 * self.opts.validation_ratio).floor() as usize;

            train.extend_from_slice(&indices[..n_train]);
            validation.extend_from_slice(&indices[n_train..n_train + n_val]);
            // Remainder rows from flooring go to test.
            test.extend_from_slice(&indices[n_train + n_val..]);
        }

        Ok(SplitIndices {
            train,
            validation,
            test,
        })
    }
}

fn label_key(label: &Label) -> String {
    match label {
        Label::Numeric(v) => format!("{}", v),
        Label::Categorical(s) => s.clone(),
    }
}
