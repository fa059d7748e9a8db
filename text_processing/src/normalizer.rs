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

use std::fmt::Debug;
use std::io;
use std::sync::{Arc, LazyLock};
use itertools::Itertools;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;
use crate::configs::NormalizerConfig;
use crate::lemmatizer::{create_lemmatizer, Lemmatizer, RuleLemmatizer};
use crate::observe::LogHandle;
use crate::stopword_registry::{StopWordRegistry};

/// Documents with fewer tokens after cleaning become [NormalizedDocument::Missing].
pub const DEFAULT_MIN_TOKENS: usize = 3;

/// Corpora smaller than this are normalized on the calling thread.
const PARALLEL_THRESHOLD: usize = 256;

/// Replaced by a single space.
const PUNCTUATION: &str = "!\"#$%&'()*+,\u{060C}-./:;<=>\u{061F}?@[\\]^_`{|}~";

/// The arabic semicolon is deleted without a replacement.
const DELETED_PUNCTUATION: char = '\u{061B}';

/// The zeros of the contiguous runs of ten Unicode decimal digits (`Nd`), sorted.
const DECIMAL_DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6,
    0x0C66, 0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0,
    0x1810, 0x1946, 0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620,
    0xA8D0, 0xA900, 0xA9D0, 0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066,
    0x110F0, 0x11136, 0x111D0, 0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0,
    0x11950, 0x11C50, 0x11D50, 0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8,
    0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+|www\.\S+").expect("The url pattern is valid.")
});

/// The result of the normalization of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalizedDocument {
    /// Space joined tokens.
    Kept(String),
    /// The input was null or too short after cleaning.
    Missing,
}

impl NormalizedDocument {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedDocument::Kept(value) => Some(value.as_str()),
            NormalizedDocument::Missing => None
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, NormalizedDocument::Missing)
    }
}

impl From<Option<String>> for NormalizedDocument {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.is_empty() => NormalizedDocument::Kept(value),
            _ => NormalizedDocument::Missing
        }
    }
}

/// The stages of the normalization, in order of execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Lowercase,
    StopwordRemoval,
    DigitRemoval,
    PunctuationRemoval,
    UrlRemoval,
    Lemmatization,
    ShortDocumentFilter,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("The stage {stage} failed: {message}")]
pub struct StageError {
    pub stage: StageKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self { stage, message: message.into() }
    }
}

/// A single transformation of the normalization chain.
pub trait Stage: Send + Sync + Debug {
    fn kind(&self) -> StageKind;

    fn apply(&self, text: &str) -> Result<String, StageError>;
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Lowercase;

impl Stage for Lowercase {
    fn kind(&self) -> StageKind {
        StageKind::Lowercase
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        Ok(text.split_whitespace().map(str::to_lowercase).join(" "))
    }
}

/// Drops whole tokens found in the stopword list.
#[derive(Debug, Clone)]
pub struct StopwordRemoval {
    registry: StopWordRegistry,
}

impl StopwordRemoval {
    pub fn new(registry: StopWordRegistry) -> Self {
        Self { registry }
    }
}

impl Stage for StopwordRemoval {
    fn kind(&self) -> StageKind {
        StageKind::StopwordRemoval
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let stop_words = self.registry.get_or_load();
        Ok(
            text.split_whitespace()
                .filter(|token| !stop_words.contains_token(token))
                .join(" ")
        )
    }
}

/// True for decimal digits of any script. Fractions, roman numerals
/// and superscripts are numeric but no decimal digits.
pub fn is_decimal_digit(c: char) -> bool {
    if c.is_ascii_digit() {
        return true
    }
    if !c.is_numeric() {
        return false
    }
    let code = c as u32;
    match DECIMAL_DIGIT_ZEROS.binary_search(&code) {
        Ok(_) => true,
        Err(0) => false,
        Err(idx) => code - DECIMAL_DIGIT_ZEROS[idx - 1] < 10,
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct DigitRemoval;

impl Stage for DigitRemoval {
    fn kind(&self) -> StageKind {
        StageKind::DigitRemoval
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        Ok(text.chars().filter(|c| !is_decimal_digit(*c)).collect())
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct PunctuationRemoval;

impl Stage for PunctuationRemoval {
    fn kind(&self) -> StageKind {
        StageKind::PunctuationRemoval
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let replaced: String = text
            .chars()
            .filter(|c| *c != DELETED_PUNCTUATION)
            .map(|c| if PUNCTUATION.contains(c) { ' ' } else { c })
            .collect();
        Ok(replaced.split_whitespace().join(" "))
    }
}

/// Removes urls, the surrounding whitespace is kept as is.
#[derive(Debug, Copy, Clone, Default)]
pub struct UrlRemoval;

impl Stage for UrlRemoval {
    fn kind(&self) -> StageKind {
        StageKind::UrlRemoval
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        Ok(URL_PATTERN.replace_all(text, "").into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct Lemmatization {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Lemmatization {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }
}

impl Stage for Lemmatization {
    fn kind(&self) -> StageKind {
        StageKind::Lemmatization
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let lemmas = text
            .split_whitespace()
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StageError::new(StageKind::Lemmatization, err.to_string()))?;
        Ok(lemmas.iter().join(" "))
    }
}

/// The last step of the chain, marks documents with too few tokens.
#[derive(Debug, Copy, Clone)]
pub struct ShortDocumentFilter {
    pub min_tokens: usize,
}

impl Default for ShortDocumentFilter {
    fn default() -> Self {
        Self { min_tokens: DEFAULT_MIN_TOKENS }
    }
}

impl ShortDocumentFilter {
    pub fn check(&self, text: String) -> NormalizedDocument {
        if text.split_whitespace().count() < self.min_tokens {
            NormalizedDocument::Missing
        } else {
            NormalizedDocument::Kept(text)
        }
    }
}

#[derive(Debug, Error)]
pub enum NormalizerConfigError {
    #[error("Failed to load the lemmatizer lexicon: {0}")]
    Lexicon(#[from] io::Error),
}

/// Applies the cleaning stages to documents.
///
/// Every document is a pure function of its text, so a normalizer can be
/// shared between threads.
#[derive(Debug)]
pub struct TextNormalizer {
    stages: Vec<Box<dyn Stage>>,
    filter: ShortDocumentFilter,
    log: LogHandle,
}

impl TextNormalizer {
    pub fn new(stages: Vec<Box<dyn Stage>>, filter: ShortDocumentFilter, log: LogHandle) -> Self {
        Self { stages, filter, log }
    }

    /// The chain with the builtin english stopwords and the rule lemmatizer.
    pub fn english(log: LogHandle) -> Self {
        let registry = StopWordRegistry::initialize(&Default::default(), log.clone());
        Self::with_components(registry, Arc::new(RuleLemmatizer::new()), ShortDocumentFilter::default(), log)
    }

    pub fn from_config(cfg: &NormalizerConfig, log: LogHandle) -> Result<Self, NormalizerConfigError> {
        let registry = StopWordRegistry::initialize(&cfg.stopwords, log.clone());
        let lemmatizer = create_lemmatizer(&cfg.lemmatizer)?;
        Ok(Self::with_components(
            registry,
            lemmatizer,
            ShortDocumentFilter { min_tokens: cfg.min_tokens },
            log
        ))
    }

    pub fn with_components(
        registry: StopWordRegistry,
        lemmatizer: Arc<dyn Lemmatizer>,
        filter: ShortDocumentFilter,
        log: LogHandle,
    ) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Lowercase),
            Box::new(StopwordRemoval::new(registry)),
            Box::new(DigitRemoval),
            Box::new(PunctuationRemoval),
            Box::new(UrlRemoval),
            Box::new(Lemmatization::new(lemmatizer)),
        ];
        Self::new(stages, filter, log)
    }

    pub fn stages(&self) -> impl Iterator<Item=StageKind> + '_ {
        self.stages.iter().map(|stage| stage.kind()).chain(std::iter::once(StageKind::ShortDocumentFilter))
    }

    /// Normalizes [text]. A failing stage is logged and skipped.
    pub fn normalize(&self, text: &str) -> NormalizedDocument {
        let mut current = text.to_string();
        for stage in self.stages.iter() {
            match stage.apply(&current) {
                Ok(value) => current = value,
                Err(err) => {
                    self.log.warn(format_args!("Skipping the stage {}: {}", stage.kind(), err.message));
                }
            }
        }
        self.filter.check(current)
    }

    /// Like [normalize] but returns the first stage failure.
    pub fn normalize_strict(&self, text: &str) -> Result<NormalizedDocument, StageError> {
        let mut current = text.to_string();
        for stage in self.stages.iter() {
            current = stage.apply(&current)?;
        }
        Ok(self.filter.check(current))
    }

    /// A null cell is [NormalizedDocument::Missing] without running the chain.
    pub fn normalize_nullable(&self, text: Option<&str>) -> NormalizedDocument {
        match text {
            None => NormalizedDocument::Missing,
            Some(value) => self.normalize(value)
        }
    }

    /// Normalizes every document, the order of [documents] is kept.
    pub fn normalize_corpus<S>(&self, documents: &[Option<S>]) -> Vec<NormalizedDocument>
    where
        S: AsRef<str> + Sync
    {
        if documents.len() < PARALLEL_THRESHOLD {
            documents
                .iter()
                .map(|value| self.normalize_nullable(value.as_ref().map(AsRef::as_ref)))
                .collect()
        } else {
            self.log.debug(format_args!("Normalizing {} documents in parallel.", documents.len()));
            documents
                .par_iter()
                .map(|value| self.normalize_nullable(value.as_ref().map(AsRef::as_ref)))
                .collect()
        }
    }
}

#[cfg(test)]
mod test {
    use std::borrow::Cow;
    use std::sync::Arc;
    use log::Level;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use strum::IntoEnumIterator;
    use crate::lemmatizer::{Lemmatizer, LemmatizerError};
    use crate::normalizer::{is_decimal_digit, DigitRemoval, Lowercase, NormalizedDocument, PunctuationRemoval, ShortDocumentFilter, Stage, StageKind, StopwordRemoval, TextNormalizer, UrlRemoval};
    use crate::observe::{LogHandle, MemoryLog};
    use crate::stopword_registry::StopWordRegistry;

    #[derive(Debug)]
    struct FailingLemmatizer;

    impl Lemmatizer for FailingLemmatizer {
        fn lemmatize<'a>(&self, token: &'a str) -> Result<Cow<'a, str>, LemmatizerError> {
            Err(LemmatizerError { token: token.to_string(), reason: "no dictionary".to_string() })
        }
    }

    fn normalizer() -> TextNormalizer {
        TextNormalizer::english(LogHandle::process("normalizer"))
    }

    #[test]
    fn stage_order(){
        let found: Vec<_> = normalizer().stages().collect();
        let expected: Vec<_> = StageKind::iter().collect();
        assert_eq!(found, expected);
        assert_eq!(StageKind::UrlRemoval.to_string(), "url_removal");
    }

    #[test]
    fn cleans_a_tweet(){
        // The url is split by the punctuation removal before the url stage runs.
        assert_eq!(
            normalizer().normalize("I LOVE this!!! http://x.co 123"),
            NormalizedDocument::Kept("love this http x co".to_string())
        );
    }

    #[test]
    fn short_documents_are_missing(){
        let normalizer = normalizer();
        assert_eq!(normalizer.normalize("Hello World"), NormalizedDocument::Missing);
        assert_eq!(normalizer.normalize("I am here!!! 42"), NormalizedDocument::Missing);
        assert_eq!(normalizer.normalize(""), NormalizedDocument::Missing);
        assert_eq!(normalizer.normalize_nullable(None), NormalizedDocument::Missing);
    }

    #[test]
    fn lemmatizes_tokens(){
        assert_eq!(
            normalizer().normalize("The cats chased the mice across many boxes"),
            NormalizedDocument::Kept("cat chased mouse across many box".to_string())
        );
    }

    #[test]
    fn urls_with_intact_scheme_are_removed(){
        assert_eq!(UrlRemoval.apply("see https://example.org/x now").unwrap(), "see  now");
        assert_eq!(UrlRemoval.apply("visit www.example.org").unwrap(), "visit ");
        assert_eq!(UrlRemoval.apply("no links here").unwrap(), "no links here");
    }

    #[test]
    fn digits_are_removed_per_character(){
        assert_eq!(DigitRemoval.apply("co2 levels 2024").unwrap(), "co levels ");
        assert_eq!(DigitRemoval.apply("\u{0663}x").unwrap(), "x");
    }

    #[test]
    fn other_numerics_are_kept(){
        assert_eq!(DigitRemoval.apply("½cup Ⅻth").unwrap(), "½cup Ⅻth");
        assert_eq!(DigitRemoval.apply("x² \u{0F2A}").unwrap(), "x² \u{0F2A}");
        assert_eq!(DigitRemoval.apply("\u{FF17}\u{1D7D9}\u{0969}ok").unwrap(), "ok");
        assert!(is_decimal_digit('\u{1E959}'));
        assert!(!is_decimal_digit('\u{1E95A}'));
    }

    #[test]
    fn punctuation_includes_arabic_marks(){
        assert_eq!(PunctuationRemoval.apply("a\u{060C}b\u{061F}c\u{061B}d").unwrap(), "a b cd");
        assert_eq!(PunctuationRemoval.apply("  well...  (maybe)  ").unwrap(), "well maybe");
        assert_eq!(PunctuationRemoval.apply("don't").unwrap(), "don t");
    }

    #[test]
    fn stopwords_match_whole_tokens(){
        let stage = StopwordRemoval::new(
            StopWordRegistry::initialize(&Default::default(), LogHandle::process("stopwords"))
        );
        assert_eq!(stage.apply("i don't know what this is").unwrap(), "know");
        assert_eq!(stage.apply("this! is").unwrap(), "this!");
    }

    #[test]
    fn idempotent_stages(){
        let inputs = [
            "Hello   WORLD 123!!",
            "co2, \u{060C} , www.x.org",
            "  ",
            "Ünïcödé ÀND 42\u{0663}",
        ];
        let stages: [&dyn Stage; 3] = [&Lowercase, &PunctuationRemoval, &DigitRemoval];
        for stage in stages {
            for input in inputs {
                let once = stage.apply(input).unwrap();
                let twice = stage.apply(&once).unwrap();
                assert_eq!(once, twice, "{} is not idempotent for {input:?}", stage.kind());
            }
        }
    }

    #[test]
    fn normalization_is_deterministic(){
        let mut rng = StdRng::seed_from_u64(42);
        let normalizer = normalizer();
        for _ in 0..20 {
            let text = lipsum::lipsum_words_with_rng(&mut rng, 40);
            assert_eq!(normalizer.normalize(&text), normalizer.normalize(&text));
        }
    }

    #[test]
    fn failing_stage_is_skipped_and_logged(){
        let sink = Arc::new(MemoryLog::default());
        let log = LogHandle::new("normalizer", sink.clone());
        let normalizer = TextNormalizer::with_components(
            StopWordRegistry::initialize(&Default::default(), log.clone()),
            Arc::new(FailingLemmatizer),
            ShortDocumentFilter::default(),
            log
        );

        assert_eq!(
            normalizer.normalize("Dogs were running home"),
            NormalizedDocument::Kept("dogs running home".to_string())
        );
        let warnings = sink.messages_at(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("lemmatization"), "{}", warnings[0]);

        let err = normalizer.normalize_strict("Dogs were running home").unwrap_err();
        assert_eq!(err.stage, StageKind::Lemmatization);
    }

    #[test]
    fn corpus_keeps_order_in_parallel(){
        let normalizer = normalizer();
        let mut rng = StdRng::seed_from_u64(7);
        let documents: Vec<Option<String>> = (0..600)
            .map(|i| if i % 17 == 0 { None } else { Some(lipsum::lipsum_words_with_rng(&mut rng, i % 9)) })
            .collect();
        let normalized = normalizer.normalize_corpus(&documents);
        assert_eq!(normalized.len(), documents.len());
        for (document, result) in documents.iter().zip(normalized.iter()) {
            assert_eq!(&normalizer.normalize_nullable(document.as_deref()), result);
        }
        assert!(normalized[0].is_missing());
    }
}
