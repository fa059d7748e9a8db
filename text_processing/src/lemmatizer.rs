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

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use camino::Utf8Path;
use compact_str::CompactString;
use rust_stemmers::{Algorithm, Stemmer};
use thiserror::Error;
use crate::configs::LemmatizerConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to lemmatize {token:?}: {reason}")]
pub struct LemmatizerError {
    pub token: String,
    pub reason: String,
}

/// Reduces a token to its dictionary base form.
/// Tokens the lemmatizer does not know are returned unchanged.
pub trait Lemmatizer: Send + Sync + Debug {
    fn lemmatize<'a>(&self, token: &'a str) -> Result<Cow<'a, str>, LemmatizerError>;
}

/// Creates the lemmatizer selected by [cfg].
pub fn create_lemmatizer(cfg: &LemmatizerConfig) -> io::Result<Arc<dyn Lemmatizer>> {
    Ok(match cfg {
        LemmatizerConfig::Rules { lexicon: None } => Arc::new(RuleLemmatizer::new()),
        LemmatizerConfig::Rules { lexicon: Some(path) } => Arc::new(RuleLemmatizer::with_lexicon_file(path)?),
        LemmatizerConfig::Stemmer { algorithm } => Arc::new(StemmingLemmatizer::new(*algorithm)),
        LemmatizerConfig::Identity => Arc::new(IdentityLemmatizer),
    })
}

/// Irregular plurals, checked before any rule.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"), ("feet", "foot"), ("geese", "goose"), ("teeth", "tooth"),
    ("mice", "mouse"), ("lice", "louse"), ("oxen", "ox"), ("people", "person"),
    ("knives", "knife"), ("wives", "wife"), ("lives", "life"), ("leaves", "leaf"),
    ("wolves", "wolf"), ("halves", "half"), ("selves", "self"), ("shelves", "shelf"),
    ("thieves", "thief"), ("loaves", "loaf"), ("calves", "calf"), ("elves", "elf"),
    ("criteria", "criterion"), ("phenomena", "phenomenon"), ("cacti", "cactus"),
    ("fungi", "fungus"), ("nuclei", "nucleus"), ("analyses", "analysis"),
    ("crises", "crisis"), ("theses", "thesis"), ("indices", "index"),
    ("matrices", "matrix"), ("vertices", "vertex"), ("buses", "bus"),
    ("viruses", "virus"), ("quizzes", "quiz"), ("movies", "movie"),
    ("cookies", "cookie"), ("zombies", "zombie"), ("selfies", "selfie"),
    ("calories", "calorie"), ("brownies", "brownie"), ("rookies", "rookie"),
    ("hoodies", "hoodie"), ("goodies", "goodie"), ("aunties", "auntie"),
    ("headaches", "headache"), ("aches", "ache"), ("niches", "niche"),
    ("avalanches", "avalanche"), ("moustaches", "moustache"),
];

/// Words ending like a plural that are already base forms.
const INVARIANTS: &[&str] = &[
    "always", "perhaps", "thanks", "news", "series", "species", "physics", "mathematics",
    "politics", "ethics", "economics", "lens", "yes", "whereas", "christmas", "sometimes",
    "afterwards", "towards", "besides", "specimen", "abdomen", "regimen", "stamen",
];

/// (suffix, replacement), longest suffix first.
const DETACHMENTS: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("zzes", "zz"),
    ("xes", "x"),
    ("ies", "y"),
    ("men", "man"),
    ("s", ""),
];

/// The noun rules of WordNet, used to create candidates for the lexicon lookup.
const LEXICON_DETACHMENTS: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Endings that never lose their final `s`.
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is", "as"];

const MIN_LEMMA_LENGTH: usize = 3;

/// A lemmatizer for nouns based on the morphology rules of WordNet.
///
/// Without a lexicon the rules are guarded heuristically. With a lexicon
/// the shortest candidate found in the lexicon wins and tokens without a
/// known candidate stay unchanged.
#[derive(Debug, Clone)]
pub struct RuleLemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
    invariants: HashSet<&'static str>,
    lexicon: Option<HashSet<CompactString>>,
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLemmatizer {
    pub fn new() -> Self {
        Self {
            exceptions: EXCEPTIONS.iter().copied().collect(),
            invariants: INVARIANTS.iter().copied().collect(),
            lexicon: None,
        }
    }

    pub fn with_lexicon<I, S>(words: I) -> Self where I: IntoIterator<Item=S>, S: AsRef<str> {
        let mut new = Self::new();
        new.lexicon = Some(
            words.into_iter()
                .map(|value| CompactString::from(value.as_ref().trim()))
                .filter(|value| !value.is_empty())
                .collect()
        );
        new
    }

    /// Reads a lexicon file with one word per line.
    pub fn with_lexicon_file<P: AsRef<Utf8Path>>(path: P) -> io::Result<Self> {
        let lines = BufReader::new(File::open(path.as_ref())?)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_lexicon(lines))
    }

    fn apply_rules(&self, token: &str) -> Option<String> {
        if self.invariants.contains(token) || PROTECTED_ENDINGS.iter().any(|ending| token.ends_with(ending)) {
            return None
        }
        let (stem, replacement) = DETACHMENTS.iter().find_map(|(suffix, replacement)| {
            token.strip_suffix(suffix).map(|stem| (stem, *replacement))
        })?;
        let lemma = format!("{stem}{replacement}");
        (lemma.chars().count() >= MIN_LEMMA_LENGTH).then_some(lemma)
    }

    fn lookup<'a>(&self, lexicon: &HashSet<CompactString>, token: &'a str) -> Cow<'a, str> {
        let mut candidates: Vec<Cow<'a, str>> = vec![Cow::Borrowed(token)];
        if let Some(found) = self.exceptions.get(token) {
            candidates.push(Cow::Borrowed(*found));
        }
        for (suffix, replacement) in LEXICON_DETACHMENTS {
            if let Some(stem) = token.strip_suffix(suffix) {
                if !stem.is_empty() {
                    candidates.push(Cow::Owned(format!("{stem}{replacement}")))
                }
            }
        }
        candidates
            .into_iter()
            .filter(|candidate| lexicon.contains(&**candidate))
            .min_by_key(|candidate| candidate.len())
            .unwrap_or(Cow::Borrowed(token))
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize<'a>(&self, token: &'a str) -> Result<Cow<'a, str>, LemmatizerError> {
        if !token.chars().all(char::is_alphabetic) {
            return Ok(Cow::Borrowed(token))
        }
        if let Some(lexicon) = &self.lexicon {
            return Ok(self.lookup(lexicon, token))
        }
        if let Some(found) = self.exceptions.get(token) {
            return Ok(Cow::Borrowed(*found))
        }
        Ok(match self.apply_rules(token) {
            Some(lemma) => Cow::Owned(lemma),
            None => Cow::Borrowed(token)
        })
    }
}

/// Uses a snowball stemmer instead of real lemmatization.
#[derive(Clone)]
pub struct StemmingLemmatizer {
    algorithm: Algorithm,
    stemmer: Arc<Stemmer>,
}

impl StemmingLemmatizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            stemmer: Arc::new(Stemmer::create(algorithm)),
        }
    }
}

impl Debug for StemmingLemmatizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemmingLemmatizer")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl Lemmatizer for StemmingLemmatizer {
    fn lemmatize<'a>(&self, token: &'a str) -> Result<Cow<'a, str>, LemmatizerError> {
        Ok(self.stemmer.stem(token))
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize<'a>(&self, token: &'a str) -> Result<Cow<'a, str>, LemmatizerError> {
        Ok(Cow::Borrowed(token))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use camino_tempfile::NamedUtf8TempFile;
    use rust_stemmers::Algorithm;
    use crate::lemmatizer::{IdentityLemmatizer, Lemmatizer, RuleLemmatizer, StemmingLemmatizer};

    fn lemma(lemmatizer: &impl Lemmatizer, token: &str) -> String {
        lemmatizer.lemmatize(token).unwrap().into_owned()
    }

    #[test]
    fn rules_reduce_regular_plurals(){
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(lemma(&lemmatizer, "cats"), "cat");
        assert_eq!(lemma(&lemmatizer, "loves"), "love");
        assert_eq!(lemma(&lemmatizer, "boxes"), "box");
        assert_eq!(lemma(&lemmatizer, "churches"), "church");
        assert_eq!(lemma(&lemmatizer, "wishes"), "wish");
        assert_eq!(lemma(&lemmatizer, "stories"), "story");
        assert_eq!(lemma(&lemmatizer, "glasses"), "glass");
        assert_eq!(lemma(&lemmatizer, "women"), "woman");
    }

    #[test]
    fn rules_keep_base_forms(){
        let lemmatizer = RuleLemmatizer::new();
        for token in ["love", "class", "bus", "analysis", "bias", "gas", "always", "news", "happy", "co"] {
            assert_eq!(lemma(&lemmatizer, token), token, "{token} should stay unchanged");
        }
    }

    #[test]
    fn exceptions_win(){
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(lemma(&lemmatizer, "children"), "child");
        assert_eq!(lemma(&lemmatizer, "movies"), "movie");
        assert_eq!(lemma(&lemmatizer, "wolves"), "wolf");
    }

    #[test]
    fn non_alphabetic_tokens_pass(){
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(lemma(&lemmatizer, "don't"), "don't");
        assert_eq!(lemma(&lemmatizer, "x2s"), "x2s");
    }

    #[test]
    fn lexicon_selects_shortest_known_candidate(){
        let lemmatizer = RuleLemmatizer::with_lexicon(["glass", "glasses", "house", "bus", "knife"]);
        assert_eq!(lemma(&lemmatizer, "glasses"), "glass");
        assert_eq!(lemma(&lemmatizer, "houses"), "house");
        assert_eq!(lemma(&lemmatizer, "bus"), "bus");
        assert_eq!(lemma(&lemmatizer, "knives"), "knife");
        assert_eq!(lemma(&lemmatizer, "wolves"), "wolves");
        assert_eq!(lemma(&lemmatizer, "unknownwords"), "unknownwords");
    }

    #[test]
    fn lexicon_can_be_read_from_file(){
        let mut file = NamedUtf8TempFile::new().unwrap();
        writeln!(file, "cat").unwrap();
        writeln!(file, "dog").unwrap();
        file.flush().unwrap();
        let lemmatizer = RuleLemmatizer::with_lexicon_file(file.path()).unwrap();
        assert_eq!(lemma(&lemmatizer, "cats"), "cat");
        assert_eq!(lemma(&lemmatizer, "birds"), "birds");
    }

    #[test]
    fn stemmer_and_identity(){
        let stemmer = StemmingLemmatizer::new(Algorithm::English);
        assert_eq!(lemma(&stemmer, "running"), "run");
        assert_eq!(lemma(&IdentityLemmatizer, "running"), "running");
    }
}
