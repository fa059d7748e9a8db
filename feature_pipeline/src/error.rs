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

use std::time::Duration;
use thiserror::Error;
use text_processing::vectorizer::VectorizerError;
use crate::pipeline::{PipelineStage, PipelineState};

/// The features and labels do not form a table.
#[derive(Debug, Copy, Clone, Error, PartialEq, Eq)]
pub enum ShapeMismatchError {
    #[error("Got {features} feature vectors but {labels} labels.")]
    Rows { features: usize, labels: usize },
    #[error("The feature vector in row {row} has {len} columns but the table has {width}.")]
    Columns { row: usize, len: usize, width: usize },
}

/// An error while reading or writing corpora, tables or artifacts.
#[derive(Debug, Error)]
pub enum CorpusIoError {
    #[error("The required input {resource} is missing.")]
    MissingInput { resource: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CorpusIoError {
    pub fn missing(resource: impl Into<String>) -> Self {
        Self::MissingInput { resource: resource.into() }
    }
}

/// The reason a pipeline stage failed.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Io(#[from] CorpusIoError),
    #[error(transparent)]
    Vectorizer(#[from] VectorizerError),
    #[error(transparent)]
    Shape(#[from] ShapeMismatchError),
    #[error("The output of {produced_by} is not available.")]
    Unavailable { produced_by: PipelineStage },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("The pipeline configuration is invalid: {0}")]
    Configuration(#[source] VectorizerError),
    #[error("The stage {stage} can not run in the state {state}.")]
    OutOfOrder { stage: PipelineStage, state: PipelineState },
    #[error("The stage {stage} failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: StageFailure,
    },
    #[error("The stage {stage} took {elapsed:?} but only {budget:?} were allowed.")]
    BudgetExceeded {
        stage: PipelineStage,
        elapsed: Duration,
        budget: Duration,
    },
}
