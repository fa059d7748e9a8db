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
use camino::Utf8PathBuf;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use crate::normalizer::DEFAULT_MIN_TOKENS;
use crate::stopword_registry::StopWordRepository;

/// The config for a stopword registry
#[derive(Debug, Clone, Serialize, Deserialize, Eq, Default)]
#[serde(transparent)]
pub struct StopwordRegistryConfig {
    pub registries: Vec<StopWordRepository>
}

impl PartialEq for StopwordRegistryConfig {
    fn eq(&self, other: &Self) -> bool {
        self.registries.len() == other.registries.len()
            && self.registries.iter().all(|value| other.registries.contains(value))
    }
}

impl Deref for StopwordRegistryConfig {
    type Target = [StopWordRepository];

    fn deref(&self) -> &Self::Target {
        &self.registries
    }
}

/// Selects the lemmatizer of the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LemmatizerConfig {
    /// Noun morphology rules, optionally checked against a lexicon with one word per line.
    Rules {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lexicon: Option<Utf8PathBuf>
    },
    /// A snowball stemmer.
    Stemmer { algorithm: Algorithm },
    /// Keeps every token.
    Identity,
}

impl Default for LemmatizerConfig {
    fn default() -> Self {
        Self::Rules { lexicon: None }
    }
}

/// The config for the text normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Documents with fewer tokens after cleaning are discarded.
    #[serde(default = "_default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default)]
    pub lemmatizer: LemmatizerConfig,
    #[serde(default)]
    pub stopwords: StopwordRegistryConfig,
}

const fn _default_min_tokens() -> usize {
    DEFAULT_MIN_TOKENS
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_tokens: _default_min_tokens(),
            lemmatizer: LemmatizerConfig::default(),
            stopwords: StopwordRegistryConfig::default(),
        }
    }
}
