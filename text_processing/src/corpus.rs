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

use std::fmt::{Display, Formatter};
use std::hash::Hash;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// The statistics over the documents in a corpus
pub trait CorpusDocumentStatistics {
    /// A word in a corpus
    type Word;
    /// The number of documents in the corpus
    fn document_count(&self) -> u64;
    /// The number of words in the corpus
    fn word_count(&self) -> u64;
    /// The number of unique words in the corpus
    fn unique_word_count(&self) -> usize;
    /// The frequency of a [word] in a corpus
    fn word_frequency(&self, word: &Self::Word) -> Option<u64>;

    /// Returns an iterator over the words in the order they were first seen.
    fn iter(&self) -> impl Iterator<Item=(&Self::Word, &u64)>;
}

/// The counters of a [CorpusStatisticsCollector] without the words.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub document_count: u64,
    pub word_count: u64,
    pub unique_word_count: usize,
}

impl Display for CorpusSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} documents, {} words, {} unique words",
            self.document_count,
            self.word_count,
            self.unique_word_count
        )
    }
}

/// Collects the frequencies in a corpus.
/// Words keep the position of their first occurrence.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(serialize = "W: Serialize + Hash + Eq", deserialize = "W: DeserializeOwned + Hash + Eq"))]
pub struct CorpusStatisticsCollector<W> {
    document_count: u64,
    word_count: u64,
    word_counts: IndexMap<W, u64>
}

impl<W> Default for CorpusStatisticsCollector<W> {
    fn default() -> Self {
        Self {
            document_count: 0,
            word_count: 0,
            word_counts: IndexMap::new(),
        }
    }
}

impl<W> CorpusStatisticsCollector<W> {
    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary {
            document_count: self.document_count,
            word_count: self.word_count,
            unique_word_count: self.word_counts.len(),
        }
    }
}

impl<W> CorpusStatisticsCollector<W> where W: Hash + Eq {
    pub fn add<D: IntoIterator<Item=W>>(&mut self, doc: D) {
        self.document_count = self.document_count.saturating_add(1);
        for value in doc {
            self.word_count = self.word_count.saturating_add(1);
            self.word_counts
                .entry(value)
                .and_modify(|value| *value=value.saturating_add(1))
                .or_insert(1);
        }
    }

    /// The [k] most frequent words, equal frequencies keep the order of the first occurrence.
    pub fn top_k(&self, k: usize) -> Vec<(&W, u64)> {
        self.word_counts
            .iter()
            .map(|(word, count)| (word, *count))
            .sorted_by(|(_, a), (_, b)| b.cmp(a))
            .take(k)
            .collect()
    }
}

impl<W> Display for CorpusStatisticsCollector<W> where W: Hash + Eq + Display  {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Document Count: {}", self.document_count)?;
        writeln!(f, "Word Count: {}", self.word_count)?;
        writeln!(f, "Unique Word Count: {}", self.unique_word_count())?;
        write!(f, "Words:")?;
        for (word, count) in &self.word_counts {
            write!(f, "\n  {word}: {count}")?;
        }
        Ok(())
    }
}

impl<W> CorpusDocumentStatistics for CorpusStatisticsCollector<W> where W: Hash + Eq {
    type Word = W;

    #[inline]
    fn document_count(&self) -> u64 {
        self.document_count
    }

    #[inline]
    fn word_count(&self) -> u64 {
        self.word_count
    }

    #[inline]
    fn unique_word_count(&self) -> usize {
        self.word_counts.len()
    }

    fn word_frequency(&self, word: &W) -> Option<u64> {
        self.word_counts.get(word).copied()
    }

    fn iter(&self) -> impl Iterator<Item=(&Self::Word, &u64)> {
        self.word_counts.iter()
    }
}

#[cfg(test)]
mod test {
    use crate::corpus::{CorpusDocumentStatistics, CorpusStatisticsCollector, CorpusSummary};

    #[test]
    fn counts_documents_and_words(){
        let mut collector = CorpusStatisticsCollector::default();
        collector.add("b a b".split_whitespace());
        collector.add("c a".split_whitespace());
        collector.add(std::iter::empty());

        assert_eq!(
            collector.summary(),
            CorpusSummary { document_count: 3, word_count: 5, unique_word_count: 3 }
        );
        assert_eq!(collector.word_frequency(&"b"), Some(2));
        assert_eq!(collector.word_frequency(&"x"), None);
        assert_eq!(collector.iter().map(|(w, _)| *w).collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn top_k_keeps_first_occurrence_on_ties(){
        let mut collector = CorpusStatisticsCollector::default();
        collector.add("z y x y z w".split_whitespace());
        let top: Vec<_> = collector.top_k(3).into_iter().map(|(w, c)| (*w, c)).collect();
        assert_eq!(top, vec![("z", 2), ("y", 2), ("x", 1)]);
        assert_eq!(collector.top_k(10).len(), 4);
    }
}
