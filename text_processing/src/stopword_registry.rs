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

use std::borrow::Borrow;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt::Debug;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufRead, BufReader};
use std::sync::{Arc, OnceLock};
use camino::{Utf8Path, Utf8PathBuf};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use crate::configs::StopwordRegistryConfig;
use crate::observe::LogHandle;

/// The english stopword list every normalizer starts from.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// The file names a directory repository looks for, in this order.
const LIST_FILE_NAMES: &[&str] = &["en.txt", "eng.txt", "english.txt"];

/// A registry for stopwords.
/// The list is the union of everything the registered repositories provide.
/// It is loaded on first use and shared afterwards.
#[derive(Debug, Clone)]
pub struct StopWordRegistry {
    cached_stop_words: Arc<OnceLock<Arc<StopWordList>>>,
    repositories: Arc<[StopWordRepository]>,
    log: LogHandle,
}

impl StopWordRegistry {
    pub fn initialize(cfg: &StopwordRegistryConfig, log: LogHandle) -> Self {
        let repositories = if cfg.is_empty() {
            vec![StopWordRepository::Default]
        } else {
            cfg.to_vec()
        };
        Self {
            cached_stop_words: Arc::new(OnceLock::new()),
            repositories: repositories.into(),
            log,
        }
    }

    fn load_stop_words(&self) -> Vec<String> {
        let mut collection = Vec::new();
        for repo in self.repositories.iter() {
            match repo.load_raw_stop_words() {
                Ok(found) => collection.extend(found),
                Err(err) => {
                    self.log.warn(format_args!("Skipping stopword repository {repo:?}: {err}"));
                    if repo.with_default() {
                        collection.extend(ENGLISH_STOPWORDS.iter().map(|value| value.to_string()))
                    }
                }
            }
        }
        if collection.is_empty() {
            self.log.warn(format_args!("No stopwords were loaded, stopword removal keeps every token."));
        }
        collection
    }

    pub fn get_or_load(&self) -> Arc<StopWordList> {
        self.cached_stop_words
            .get_or_init(|| {
                let list = StopWordList::from_raw(
                    self.load_stop_words()
                        .into_iter()
                        .map(CompactString::from)
                        .collect()
                );
                self.log.debug(format_args!("Loaded {} stopwords.", list.len()));
                Arc::new(list)
            })
            .clone()
    }
}

/// The loaded stopwords, as listed and in NFC form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopWordList {
    raw: HashSet<CompactString>,
    normalized: HashSet<CompactString>
}

impl StopWordList {

    pub fn new(mut raw: HashSet<CompactString>, mut normalized: HashSet<CompactString>) -> Self {
        raw.shrink_to_fit();
        normalized.shrink_to_fit();
        Self { raw, normalized }
    }

    pub fn from_raw(raw: HashSet<CompactString>) -> Self {
        let normalized = raw
            .iter()
            .map(|value| value.nfc().collect::<CompactString>())
            .collect::<HashSet<_>>();
        Self::new(raw, normalized)
    }

    /// The builtin english list.
    pub fn english() -> Self {
        Self::from_raw(ENGLISH_STOPWORDS.iter().map(|value| CompactString::from(*value)).collect())
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn contains_raw<Q: ?Sized>(&self, value: &Q) -> bool
    where
        CompactString: Borrow<Q>,
        Q: Hash + Eq, {
        self.raw.contains(value)
    }

    /// Checks [token] as is and, if it is not in NFC form, its composed form.
    pub fn contains_token(&self, token: &str) -> bool {
        if self.contains_raw(token) {
            return true
        }
        match unicode_normalization::is_nfc_quick(token.chars()) {
            unicode_normalization::IsNormalized::Yes => self.normalized.contains(token),
            _ => self.normalized.contains(token.nfc().collect::<CompactString>().as_str()),
        }
    }
}


/// A source of stopwords.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(try_from = "StopWordRepositoryDev", into = "StopWordRepositoryDev")]
pub enum StopWordRepository {
    /// The builtin [ENGLISH_STOPWORDS].
    Default,
    /// A directory containing one of `en.txt`, `eng.txt` or `english.txt`.
    DirRepo { with_default: bool, dir: Utf8PathBuf },
    /// A file with one stopword per line.
    File { with_default: bool, file: Utf8PathBuf },
}

#[derive(Debug, Error)]
#[error("Was not able to properly convert the definition to a recognized StopWordRepository definition: {0:?}")]
#[repr(transparent)]
pub struct StopWordRepositoryConversionError(StopWordRepositoryDev);

impl TryFrom<StopWordRepositoryDev> for StopWordRepository {
    type Error = StopWordRepositoryConversionError;

    fn try_from(value: StopWordRepositoryDev) -> Result<Self, Self::Error> {
        match value {
            StopWordRepositoryDev { with_default, dir: Some(dir), file: None } => {
                Ok(Self::DirRepo {with_default, dir})
            }
            StopWordRepositoryDev { with_default, dir: None, file: Some(file) } => {
                Ok(Self::File {with_default, file})
            }
            StopWordRepositoryDev { with_default: true, dir: None, file: None } => {
                Ok(Self::Default)
            }
            err => Err(StopWordRepositoryConversionError(err))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
struct StopWordRepositoryDev {
    #[serde(skip_serializing_if = "std::ops::Not::not", rename = "default")]
    with_default: bool,
    #[serde(skip_serializing_if = "Option::is_none", alias = "directory")]
    dir: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<Utf8PathBuf>,
}

impl From<StopWordRepository> for StopWordRepositoryDev {
    fn from(value: StopWordRepository) -> Self {
        match value {
            StopWordRepository::Default => {
                StopWordRepositoryDev {
                    with_default: true,
                    ..Default::default()
                }
            }
            StopWordRepository::DirRepo { dir, with_default } => {
                StopWordRepositoryDev {
                    dir: Some(dir),
                    with_default,
                    ..Default::default()
                }
            }
            StopWordRepository::File { file, with_default } => {
                StopWordRepositoryDev {
                    file: Some(file),
                    with_default,
                    ..Default::default()
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StopWordLoadError {
    #[error("The stopword directory {0} does not exist!")]
    MissingDirectory(Utf8PathBuf),
    #[error("The directory {0} contains none of en.txt, eng.txt or english.txt!")]
    NoListInDirectory(Utf8PathBuf),
    #[error("Failed to read the stopword file {file}: {source}")]
    Io { file: Utf8PathBuf, source: std::io::Error },
}

impl StopWordRepository {
    fn with_default(&self) -> bool {
        match self {
            StopWordRepository::Default => true,
            StopWordRepository::DirRepo { with_default, .. } => *with_default,
            StopWordRepository::File { with_default, .. } => *with_default,
        }
    }

    /// Loads the raw words of the repository.
    /// Empty lines and lines starting with `#` are skipped.
    pub fn load_raw_stop_words(&self) -> Result<Vec<String>, StopWordLoadError> {
        fn load_file(file: &Utf8Path, with_default: bool) -> Result<Vec<String>, StopWordLoadError> {
            let reader = File::open(file)
                .map(BufReader::new)
                .map_err(|source| StopWordLoadError::Io { file: file.to_path_buf(), source })?;
            let mut result = Vec::new();
            for line in reader.lines() {
                let line = line.map_err(|source| StopWordLoadError::Io { file: file.to_path_buf(), source })?;
                let word = line.trim();
                if word.is_empty() || word.starts_with('#') {
                    continue;
                }
                result.push(word.to_string());
            }
            if with_default {
                result.extend(ENGLISH_STOPWORDS.iter().map(|value| value.to_string()))
            }
            Ok(result)
        }

        match self {
            StopWordRepository::Default => {
                Ok(ENGLISH_STOPWORDS.iter().map(|value| value.to_string()).collect())
            }
            StopWordRepository::DirRepo { dir, with_default } => {
                if !dir.is_dir() {
                    return Err(StopWordLoadError::MissingDirectory(dir.clone()));
                }
                match LIST_FILE_NAMES.iter().map(|name| dir.join(name)).find(|file| file.exists()) {
                    Some(file) => load_file(&file, *with_default),
                    None => Err(StopWordLoadError::NoListInDirectory(dir.clone()))
                }
            }
            StopWordRepository::File { file, with_default } => {
                load_file(file, *with_default)
            }
        }
    }
}


#[cfg(test)]
mod test {
    use std::io::Write;
    use std::sync::Arc;
    use camino_tempfile::tempdir;
    use crate::configs::StopwordRegistryConfig;
    use crate::observe::{LogHandle, MemoryLog};
    use crate::stopword_registry::{StopWordList, StopWordRegistry, StopWordRepository, ENGLISH_STOPWORDS};

    #[test]
    fn english_list_is_complete(){
        let list = StopWordList::english();
        assert_eq!(ENGLISH_STOPWORDS.len(), 179);
        assert_eq!(list.len(), 179);
        assert!(list.contains_token("the"));
        assert!(list.contains_token("don't"));
        assert!(!list.contains_token("The"));
        assert!(!list.contains_token("love"));
    }

    #[test]
    fn empty_config_falls_back_to_default(){
        let registry = StopWordRegistry::initialize(&StopwordRegistryConfig::default(), LogHandle::process("test"));
        assert_eq!(registry.get_or_load().len(), 179);
    }

    #[test]
    fn loads_and_merges_directory_lists(){
        let dir = tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("eng.txt")).unwrap();
        writeln!(file, "# custom words").unwrap();
        writeln!(file, "movie").unwrap();
        writeln!(file, "").unwrap();
        writeln!(file, "film").unwrap();
        drop(file);

        let cfg = StopwordRegistryConfig {
            registries: vec![StopWordRepository::DirRepo { with_default: true, dir: dir.path().to_path_buf() }]
        };
        let list = StopWordRegistry::initialize(&cfg, LogHandle::process("test")).get_or_load();
        assert_eq!(list.len(), 181);
        assert!(list.contains_raw("movie"));
        assert!(list.contains_raw("film"));
        assert!(!list.contains_raw("# custom words"));
    }

    #[test]
    fn decomposed_tokens_match_composed_words(){
        let list = StopWordList::from_raw(["caf\u{e9}".into(), "re\u{301}sume\u{301}".into()].into_iter().collect());
        assert!(list.contains_token("cafe\u{301}"));
        assert!(list.contains_token("r\u{e9}sum\u{e9}"));
        assert!(list.contains_token("re\u{301}sume\u{301}"));
        assert!(!list.contains_token("cafe"));
    }

    #[test]
    fn missing_file_is_reported_and_skipped(){
        let sink = Arc::new(MemoryLog::default());
        let cfg = StopwordRegistryConfig {
            registries: vec![StopWordRepository::File { with_default: false, file: "does/not/exist.txt".into() }]
        };
        let list = StopWordRegistry::initialize(&cfg, LogHandle::new("test", sink.clone())).get_or_load();
        assert!(list.is_empty());
        assert_eq!(sink.messages_at(log::Level::Warn).len(), 2);
    }

    #[test]
    fn repository_definitions_deserialize(){
        let parsed: Vec<StopWordRepository> = serde_json::from_str(
            r#"[{"default": true}, {"dir": "lists"}, {"file": "stop.txt", "default": true}]"#
        ).unwrap();
        assert_eq!(parsed, vec![
            StopWordRepository::Default,
            StopWordRepository::DirRepo { with_default: false, dir: "lists".into() },
            StopWordRepository::File { with_default: true, file: "stop.txt".into() },
        ]);
        assert!(serde_json::from_str::<StopWordRepository>(r#"{"dir": "a", "file": "b"}"#).is_err());
    }
}
