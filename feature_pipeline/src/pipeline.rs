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

use std::time::{Duration, Instant};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use text_processing::normalizer::TextNormalizer;
use text_processing::observe::LogHandle;
use text_processing::vectorizer::{CountVectorizer, FeatureVector};
use crate::error::{PipelineError, StageFailure};
use crate::io::{read_corpus, save_vectorizer, write_feature_table, write_normalized_corpus, NormalizedCorpus, RawCorpus};
use crate::table::{assemble, FeatureTable};

/// The progress of a [Pipeline]. Every stage moves it exactly one step forward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PipelineState {
    Created,
    Loaded,
    Normalized,
    VocabularyFit,
    Vectorized,
    Assembled,
    Persisted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Load,
    Normalize,
    FitVocabulary,
    Vectorize,
    Assemble,
    Persist,
}

impl PipelineStage {
    /// The state a pipeline has to be in to run this stage.
    pub const fn requires(self) -> PipelineState {
        match self {
            PipelineStage::Load => PipelineState::Created,
            PipelineStage::Normalize => PipelineState::Loaded,
            PipelineStage::FitVocabulary => PipelineState::Normalized,
            PipelineStage::Vectorize => PipelineState::VocabularyFit,
            PipelineStage::Assemble => PipelineState::Vectorized,
            PipelineStage::Persist => PipelineState::Assembled,
        }
    }

    /// The state after this stage succeeded.
    pub const fn produces(self) -> PipelineState {
        match self {
            PipelineStage::Load => PipelineState::Loaded,
            PipelineStage::Normalize => PipelineState::Normalized,
            PipelineStage::FitVocabulary => PipelineState::VocabularyFit,
            PipelineStage::Vectorize => PipelineState::Vectorized,
            PipelineStage::Assemble => PipelineState::Assembled,
            PipelineStage::Persist => PipelineState::Persisted,
        }
    }
}

/// Where the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinePaths {
    pub raw_train: Utf8PathBuf,
    pub raw_test: Utf8PathBuf,
    pub interim_train: Utf8PathBuf,
    pub interim_test: Utf8PathBuf,
    pub features_train: Utf8PathBuf,
    pub features_test: Utf8PathBuf,
    pub vectorizer: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_features: i64,
    /// The wall clock time a single stage may take.
    pub stage_budget: Option<Duration>,
    pub paths: PipelinePaths,
}

/// A value for the train and the test split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split<T> {
    pub train: T,
    pub test: T,
}

/// Runs load, normalize, fit, vectorize, assemble and persist in this order.
///
/// The vocabulary is fit on the train split only and then used unchanged
/// for both splits.
#[derive(Debug)]
pub struct Pipeline {
    settings: PipelineSettings,
    normalizer: TextNormalizer,
    vectorizer: CountVectorizer,
    state: PipelineState,
    log: LogHandle,
    raw: Option<Split<RawCorpus>>,
    normalized: Option<Split<NormalizedCorpus>>,
    features: Option<Split<Vec<FeatureVector>>>,
    tables: Option<Split<FeatureTable<String>>>,
}

impl Pipeline {
    /// Fails with [PipelineError::Configuration] before anything is read.
    pub fn new(settings: PipelineSettings, normalizer: TextNormalizer, log: LogHandle) -> Result<Self, PipelineError> {
        let vectorizer = CountVectorizer::new(settings.max_features).map_err(PipelineError::Configuration)?;
        Ok(Self {
            settings,
            normalizer,
            vectorizer,
            state: PipelineState::Created,
            log,
            raw: None,
            normalized: None,
            features: None,
            tables: None,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn vectorizer(&self) -> &CountVectorizer {
        &self.vectorizer
    }

    pub fn normalized(&self) -> Option<&Split<NormalizedCorpus>> {
        self.normalized.as_ref()
    }

    pub fn tables(&self) -> Option<&Split<FeatureTable<String>>> {
        self.tables.as_ref()
    }

    fn execute<T>(
        &mut self,
        stage: PipelineStage,
        action: impl FnOnce(&mut Self) -> Result<T, StageFailure>
    ) -> Result<T, PipelineError> {
        if self.state != stage.requires() {
            return Err(PipelineError::OutOfOrder { stage, state: self.state })
        }
        self.log.info(format_args!("Starting {stage}."));
        let started = Instant::now();
        let result = match action(self) {
            Ok(value) => value,
            Err(source) => {
                self.log.error(format_args!("The stage {stage} failed: {source}"));
                return Err(PipelineError::Stage { stage, source })
            }
        };
        let elapsed = started.elapsed();
        if let Some(budget) = self.settings.stage_budget {
            if elapsed >= budget {
                self.log.error(format_args!("The stage {stage} exceeded its budget of {budget:?}."));
                return Err(PipelineError::BudgetExceeded { stage, elapsed, budget })
            }
        }
        self.state = stage.produces();
        self.log.info(format_args!("Finished {stage} in {elapsed:?}."));
        Ok(result)
    }

    pub fn load(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::Load, |pipeline| {
            let paths = &pipeline.settings.paths;
            let train = read_corpus(&paths.raw_train)?;
            let test = read_corpus(&paths.raw_test)?;
            pipeline.log.debug(format_args!("Loaded {} train and {} test documents.", train.len(), test.len()));
            pipeline.raw = Some(Split { train, test });
            Ok(())
        })
    }

    pub fn normalize(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::Normalize, |pipeline| {
            let raw = available(pipeline.raw.as_ref(), PipelineStage::Load)?;
            let normalize = |corpus: &RawCorpus| NormalizedCorpus {
                documents: pipeline.normalizer.normalize_corpus(&corpus.documents),
                labels: corpus.labels.clone(),
            };
            let normalized = Split { train: normalize(&raw.train), test: normalize(&raw.test) };
            let missing = normalized.train.documents.iter().filter(|value| value.is_missing()).count();
            pipeline.log.debug(format_args!("{missing} train documents are missing after normalization."));
            pipeline.normalized = Some(normalized);
            pipeline.raw = None;
            Ok(())
        })
    }

    pub fn fit_vocabulary(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::FitVocabulary, |pipeline| {
            let normalized = available(pipeline.normalized.as_ref(), PipelineStage::Normalize)?;
            let summary = pipeline.vectorizer.fit(&normalized.train.documents)?;
            pipeline.log.info(format_args!("Fitted the vocabulary on {summary}."));
            Ok(())
        })
    }

    pub fn vectorize(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::Vectorize, |pipeline| {
            let normalized = available(pipeline.normalized.as_ref(), PipelineStage::Normalize)?;
            let features = Split {
                train: pipeline.vectorizer.transform(&normalized.train.documents)?,
                test: pipeline.vectorizer.transform(&normalized.test.documents)?,
            };
            pipeline.features = Some(features);
            Ok(())
        })
    }

    pub fn assemble(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::Assemble, |pipeline| {
            let normalized = available(pipeline.normalized.as_ref(), PipelineStage::Normalize)?;
            let width = pipeline.vectorizer.vocabulary().map(|value| value.len())
                .ok_or(StageFailure::Unavailable { produced_by: PipelineStage::FitVocabulary })?;
            let features = available(pipeline.features.as_ref(), PipelineStage::Vectorize)?;
            let tables = Split {
                train: assemble(width, features.train.clone(), normalized.train.labels.clone())?,
                test: assemble(width, features.test.clone(), normalized.test.labels.clone())?,
            };
            pipeline.tables = Some(tables);
            pipeline.features = None;
            Ok(())
        })
    }

    pub fn persist(&mut self) -> Result<(), PipelineError> {
        self.execute(PipelineStage::Persist, |pipeline| {
            let paths = &pipeline.settings.paths;
            let normalized = available(pipeline.normalized.as_ref(), PipelineStage::Normalize)?;
            let tables = available(pipeline.tables.as_ref(), PipelineStage::Assemble)?;
            write_normalized_corpus(&paths.interim_train, &normalized.train)?;
            write_normalized_corpus(&paths.interim_test, &normalized.test)?;
            write_feature_table(&paths.features_train, &tables.train)?;
            write_feature_table(&paths.features_test, &tables.test)?;
            save_vectorizer(&paths.vectorizer, &pipeline.vectorizer)?;
            pipeline.log.info(format_args!("Saved the vectorizer to {}.", paths.vectorizer));
            Ok(())
        })
    }

    /// Runs every remaining stage, stops at the first failure.
    pub fn run(&mut self) -> Result<(), PipelineError> {
        self.load()?;
        self.normalize()?;
        self.fit_vocabulary()?;
        self.vectorize()?;
        self.assemble()?;
        self.persist()
    }
}

/// The output of [produced_by] or [StageFailure::Unavailable].
fn available<T>(value: Option<&T>, produced_by: PipelineStage) -> Result<&T, StageFailure> {
    value.ok_or(StageFailure::Unavailable { produced_by })
}
