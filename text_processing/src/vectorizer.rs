// Copyright 2024 Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::Deref;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::corpus::{CorpusStatisticsCollector, CorpusSummary};
use crate::normalizer::NormalizedDocument;

#[derive(Debug, Copy, Clone, Error, PartialEq, Eq)]
pub enum VectorizerError {
    #[error("max_features has to be greater than 0 but was {max_features}.")]
    InvalidMaxFeatures { max_features: i64 },
    #[error("The vectorizer has no fitted vocabulary.")]
    NotFitted,
}

/// Checks a configured vocabulary size.
pub fn validate_max_features(max_features: i64) -> Result<usize, VectorizerError> {
    if max_features <= 0 {
        return Err(VectorizerError::InvalidMaxFeatures { max_features })
    }
    usize::try_from(max_features).map_err(|_| VectorizerError::InvalidMaxFeatures { max_features })
}

/// Anything that can be counted as a document by the vectorizer.
/// [None] is a document without tokens.
pub trait DocumentText {
    fn text(&self) -> Option<&str>;
}

impl DocumentText for str {
    #[inline]
    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl DocumentText for String {
    #[inline]
    fn text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl DocumentText for NormalizedDocument {
    #[inline]
    fn text(&self) -> Option<&str> {
        self.as_str()
    }
}

impl<T> DocumentText for Option<T> where T: DocumentText {
    #[inline]
    fn text(&self) -> Option<&str> {
        self.as_ref().and_then(DocumentText::text)
    }
}

impl<T> DocumentText for &T where T: DocumentText + ?Sized {
    #[inline]
    fn text(&self) -> Option<&str> {
        (**self).text()
    }
}

fn tokens_of<D: DocumentText + ?Sized>(document: &D) -> impl Iterator<Item=&str> {
    document.text().unwrap_or_default().split_whitespace()
}

/// The frozen token to index mapping. The position in the set is the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(IndexSet<String>);

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Vocabulary {}

impl Vocabulary {
    /// Creates a vocabulary indexing [tokens] in iteration order, duplicates are ignored.
    pub fn from_tokens<I, S>(tokens: I) -> Self where I: IntoIterator<Item=S>, S: Into<String> {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.0.get_index_of(token)
    }

    /// The tokens in index order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    /// Counts the tokens of a single document, unknown tokens are ignored.
    pub fn count<D: DocumentText + ?Sized>(&self, document: &D) -> FeatureVector {
        let mut counts = vec![0u64; self.len()];
        for token in tokens_of(document) {
            if let Some(idx) = self.index_of(token) {
                counts[idx] = counts[idx].saturating_add(1);
            }
        }
        FeatureVector(counts)
    }
}

/// The token counts of a document in vocabulary index order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct FeatureVector(Vec<u64>);

impl FeatureVector {
    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }

    /// The non zero entries as 1-based (index, count) pairs.
    pub fn sparse_features(&self) -> Vec<(u32, u64)> {
        self.iter()
            .enumerate()
            .filter(|(_, count)| **count != 0)
            .map(|(idx, count)| (idx as u32 + 1, *count))
            .collect()
    }
}

impl From<Vec<u64>> for FeatureVector {
    fn from(value: Vec<u64>) -> Self {
        Self(value)
    }
}

impl Deref for FeatureVector {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Fits a vocabulary of at most [max_features] tokens on [corpus].
///
/// Tokens are ranked by their frequency, equal frequencies keep the
/// order of their first occurrence in the corpus.
pub fn fit<D: DocumentText>(corpus: &[D], max_features: usize) -> Result<Vocabulary, VectorizerError> {
    fit_with_statistics(corpus, max_features).map(|(vocabulary, _)| vocabulary)
}

/// Like [fit] but also returns the statistics of the corpus.
pub fn fit_with_statistics<D: DocumentText>(corpus: &[D], max_features: usize) -> Result<(Vocabulary, CorpusSummary), VectorizerError> {
    if max_features == 0 {
        return Err(VectorizerError::InvalidMaxFeatures { max_features: 0 })
    }
    let mut statistics = CorpusStatisticsCollector::default();
    for document in corpus {
        statistics.add(tokens_of(document));
    }
    let vocabulary = Vocabulary::from_tokens(
        statistics.top_k(max_features).into_iter().map(|(token, _)| *token)
    );
    Ok((vocabulary, statistics.summary()))
}

/// Counts every document of [corpus] with [vocabulary]. The output has one vector per document.
pub fn transform<D: DocumentText>(corpus: &[D], vocabulary: &Vocabulary) -> Result<Vec<FeatureVector>, VectorizerError> {
    if vocabulary.is_empty() {
        return Err(VectorizerError::NotFitted)
    }
    Ok(corpus.iter().map(|document| vocabulary.count(document)).collect())
}

/// A bag of words vectorizer. Unfit until [CountVectorizer::fit] was called,
/// a new fit replaces the old vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountVectorizer {
    max_features: usize,
    vocabulary: Option<Vocabulary>,
}

impl CountVectorizer {
    pub fn new(max_features: i64) -> Result<Self, VectorizerError> {
        Ok(Self {
            max_features: validate_max_features(max_features)?,
            vocabulary: None,
        })
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.as_ref().is_some_and(|value| !value.is_empty())
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    fn fitted_vocabulary(&self) -> Result<&Vocabulary, VectorizerError> {
        match &self.vocabulary {
            Some(vocabulary) if !vocabulary.is_empty() => Ok(vocabulary),
            _ => Err(VectorizerError::NotFitted)
        }
    }

    pub fn fit<D: DocumentText>(&mut self, corpus: &[D]) -> Result<CorpusSummary, VectorizerError> {
        let (vocabulary, summary) = fit_with_statistics(corpus, self.max_features)?;
        self.vocabulary = Some(vocabulary);
        Ok(summary)
    }

    pub fn transform<D: DocumentText>(&self, corpus: &[D]) -> Result<Vec<FeatureVector>, VectorizerError> {
        transform(corpus, self.fitted_vocabulary()?)
    }

    pub fn transform_document<D: DocumentText + ?Sized>(&self, document: &D) -> Result<FeatureVector, VectorizerError> {
        Ok(self.fitted_vocabulary()?.count(document))
    }

    pub fn fit_transform<D: DocumentText>(&mut self, corpus: &[D]) -> Result<Vec<FeatureVector>, VectorizerError> {
        self.fit(corpus)?;
        self.transform(corpus)
    }

    /// The tokens of the vocabulary in index order.
    pub fn get_feature_names(&self) -> Result<Vec<&str>, VectorizerError> {
        Ok(self.fitted_vocabulary()?.feature_names())
    }
}

impl From<Vocabulary> for CountVectorizer {
    fn from(value: Vocabulary) -> Self {
        Self {
            max_features: value.len().max(1),
            vocabulary: Some(value),
        }
    }
}
