//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::fmt::Display;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use text_processing::vectorizer::FeatureVector;
use crate::error::ShapeMismatchError;

/// Feature vectors joined with their labels, one row per document in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTable<L> {
    width: usize,
    features: Vec<FeatureVector>,
    labels: Vec<L>,
}

/// A borrowed row of a [FeatureTable].
#[derive(Debug, Copy, Clone)]
pub struct FeatureRow<'a, L> {
    pub features: &'a FeatureVector,
    pub label: &'a L,
}

impl<'a, L> FeatureRow<'a, L> where L: Display {
    /// The counts followed by the label.
    pub fn to_record(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|value| value.to_string())
            .chain(std::iter::once(self.label.to_string()))
            .collect()
    }
}

impl<L> FeatureTable<L> {
    /// The number of feature columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn row(&self, idx: usize) -> Option<FeatureRow<'_, L>> {
        Some(FeatureRow {
            features: self.features.get(idx)?,
            label: self.labels.get(idx)?,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item=FeatureRow<'_, L>> {
        self.features
            .iter()
            .zip_eq(self.labels.iter())
            .map(|(features, label)| FeatureRow { features, label })
    }
}

/// Joins [features] and [labels] row by row into a table with [width] feature columns,
/// the size of the vocabulary that produced the vectors.
pub fn assemble<L>(width: usize, features: Vec<FeatureVector>, labels: Vec<L>) -> Result<FeatureTable<L>, ShapeMismatchError> {
    if features.len() != labels.len() {
        return Err(ShapeMismatchError::Rows { features: features.len(), labels: labels.len() })
    }
    if let Some((row, vector)) = features.iter().find_position(|value| value.len() != width) {
        return Err(ShapeMismatchError::Columns { row, len: vector.len(), width })
    }
    Ok(FeatureTable { width, features, labels })
}
