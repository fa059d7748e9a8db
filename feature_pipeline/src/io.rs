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
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use camino::Utf8Path;
use csv::{Reader, Writer};
use text_processing::normalizer::NormalizedDocument;
use text_processing::vectorizer::CountVectorizer;
use crate::csv2::{CorpusRecord, CsvProvider};
use crate::error::CorpusIoError;
use crate::table::FeatureTable;

pub const CONTENT_COLUMN: &str = "content";
pub const LABEL_COLUMN: &str = "label";
pub const LABEL_COLUMN_ALIAS: &str = "sentiment";

/// Raw documents with their labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledCorpus<D> {
    pub documents: Vec<D>,
    pub labels: Vec<String>,
}

pub type RawCorpus = LabeledCorpus<Option<String>>;
pub type NormalizedCorpus = LabeledCorpus<NormalizedDocument>;

impl<D> LabeledCorpus<D> {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The format of a persisted vectorizer, selected by the file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArtifactFormat {
    Bincode,
    Json,
}

impl ArtifactFormat {
    pub fn of(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Bincode
        }
    }
}

fn open_reader(path: &Utf8Path) -> Result<Reader<File>, CorpusIoError> {
    if !path.exists() {
        return Err(CorpusIoError::missing(path.as_str()))
    }
    Ok(Reader::from_path(path)?)
}

fn create_writer(path: &Utf8Path) -> Result<Writer<File>, CorpusIoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Writer::from_path(path)?)
}

/// Reads a corpus with a `content` and a `label` (or `sentiment`) column.
pub fn read_corpus(path: &Utf8Path) -> Result<RawCorpus, CorpusIoError> {
    let provider: CsvProvider<CorpusRecord, _> = CsvProvider::new(open_reader(path)?)?;
    if !provider.has_column(CONTENT_COLUMN) {
        return Err(CorpusIoError::missing(format!("column {CONTENT_COLUMN} in {path}")))
    }
    if !provider.has_column(LABEL_COLUMN) && !provider.has_column(LABEL_COLUMN_ALIAS) {
        return Err(CorpusIoError::missing(format!("column {LABEL_COLUMN} in {path}")))
    }
    let mut corpus = RawCorpus::default();
    for record in provider {
        let record = record?;
        corpus.documents.push(record.content.filter(|value| !value.is_empty()));
        corpus.labels.push(record.label);
    }
    Ok(corpus)
}

/// Reads a corpus written by [write_normalized_corpus].
pub fn read_normalized_corpus(path: &Utf8Path) -> Result<NormalizedCorpus, CorpusIoError> {
    let raw = read_corpus(path)?;
    Ok(NormalizedCorpus {
        documents: raw.documents.into_iter().map(NormalizedDocument::from).collect(),
        labels: raw.labels,
    })
}

/// Writes the normalized documents, [NormalizedDocument::Missing] becomes an empty cell.
pub fn write_normalized_corpus(path: &Utf8Path, corpus: &NormalizedCorpus) -> Result<(), CorpusIoError> {
    let mut writer = create_writer(path)?;
    writer.write_record([CONTENT_COLUMN, LABEL_COLUMN])?;
    for (document, label) in corpus.documents.iter().zip(corpus.labels.iter()) {
        writer.write_record([document.as_str().unwrap_or_default(), label.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a table with the columns `0..width` followed by `label`.
pub fn write_feature_table<L: Display>(path: &Utf8Path, table: &FeatureTable<L>) -> Result<(), CorpusIoError> {
    let mut writer = create_writer(path)?;
    writer.write_record(
        (0..table.width())
            .map(|idx| idx.to_string())
            .chain(std::iter::once(LABEL_COLUMN.to_string()))
    )?;
    for row in table.rows() {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_vectorizer(path: &Utf8Path, vectorizer: &CountVectorizer) -> Result<(), CorpusIoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    match ArtifactFormat::of(path) {
        ArtifactFormat::Bincode => bincode::serialize_into(&mut writer, vectorizer)?,
        ArtifactFormat::Json => serde_json::to_writer_pretty(&mut writer, vectorizer)?,
    }
    writer.flush()?;
    Ok(())
}

pub fn load_vectorizer(path: &Utf8Path) -> Result<CountVectorizer, CorpusIoError> {
    if !path.exists() {
        return Err(CorpusIoError::missing(path.as_str()))
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(match ArtifactFormat::of(path) {
        ArtifactFormat::Bincode => bincode::deserialize_from(reader)?,
        ArtifactFormat::Json => serde_json::from_reader(reader)?,
    })
}
