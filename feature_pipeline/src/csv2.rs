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

use std::io;
use std::marker::PhantomData;
use csv::{Reader, StringRecord, StringRecordsIntoIter};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A row of a labeled corpus csv.
/// An empty content cell is a null document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CorpusRecord {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(alias = "sentiment")]
    pub label: String,
}

/// Deserializes the rows of a csv with the help of its header.
pub struct CsvProvider<T, R> {
    header: StringRecord,
    string_records_iter: StringRecordsIntoIter<R>,
    _produces: PhantomData<T>
}

impl<T, R> CsvProvider<T, R> where R: io::Read {
    pub fn new(mut reader: Reader<R>) -> csv::Result<Self> {
        let header = reader.headers()?.clone();
        Ok(
            Self {
                header,
                string_records_iter: reader.into_records(),
                _produces: PhantomData
            }
        )
    }

    pub fn header(&self) -> &StringRecord {
        &self.header
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|value| value == name)
    }
}

impl<T, R> Iterator for CsvProvider<T, R> where T: DeserializeOwned, R: io::Read {
    type Item = csv::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.string_records_iter.next()? {
            Ok(value) => value,
            Err(err) => return Some(Err(err))
        };
        Some(next.deserialize(Some(&self.header)))
    }
}

#[cfg(test)]
mod test {
    use crate::csv2::{CorpusRecord, CsvProvider};

    #[test]
    fn reads_records_by_header(){
        let data = ",content,sentiment\n0,hello there,happy\n1,,sad\n";
        let reader = csv::Reader::from_reader(data.as_bytes());
        let provider: CsvProvider<CorpusRecord, _> = CsvProvider::new(reader).unwrap();
        assert!(provider.has_column("content"));
        assert!(!provider.has_column("label"));
        let records = provider.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(
            records,
            vec![
                CorpusRecord { content: Some("hello there".to_string()), label: "happy".to_string() },
                CorpusRecord { content: None, label: "sad".to_string() },
            ]
        );
    }

    #[test]
    fn broken_rows_are_reported(){
        let data = "content,label\na,b\nc\n";
        let reader = csv::Reader::from_reader(data.as_bytes());
        let mut provider: CsvProvider<CorpusRecord, _> = CsvProvider::new(reader).unwrap();
        assert!(provider.next().unwrap().is_ok());
        assert!(provider.next().unwrap().is_err());
        assert!(provider.next().is_none());
    }
}
