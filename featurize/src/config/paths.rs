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

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use feature_pipeline::pipeline::PipelinePaths;

/// Config of the paths read and written by the pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename(serialize = "Paths"))]
pub struct PathsConfig {
    /// The root path where the application runs
    #[serde(default = "_default_root_folder")]
    pub root: Utf8PathBuf,
    #[serde(default)]
    pub directories: Directories,
    #[serde(default)]
    pub files: Files,
}

fn _default_root_folder() -> Utf8PathBuf { Utf8PathBuf::from(".") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: _default_root_folder(),
            files: Files::default(),
            directories: Directories::default()
        }
    }
}

macro_rules! path_constructors {
    ($self: ident.($($name: ident = $dir: ident / $file: ident;)+)) => {
        $(
            paste::paste! {
                pub fn [<file_ $name>](&$self) -> Utf8PathBuf {
                    $self.root.join(&$self.directories.$dir).join(&$self.files.$file)
                }
            }
        )+
    };
}

impl PathsConfig {

    pub fn root_path(&self) -> &Utf8Path  {
        self.root.as_path()
    }

    path_constructors! {
        self.(
            raw_train = raw / train;
            raw_test = raw / test;
            interim_train = interim / train_processed;
            interim_test = interim / test_processed;
            features_train = features / train_features;
            features_test = features / test_features;
            vectorizer = models / vectorizer;
        )
    }

    pub fn pipeline_paths(&self) -> PipelinePaths {
        PipelinePaths {
            raw_train: self.file_raw_train(),
            raw_test: self.file_raw_test(),
            interim_train: self.file_interim_train(),
            interim_test: self.file_interim_test(),
            features_train: self.file_features_train(),
            features_test: self.file_features_test(),
            vectorizer: self.file_vectorizer(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Directories {
    /// The raw train and test corpora
    #[serde(default = "_default_raw_dir")]
    pub raw: Utf8PathBuf,
    /// The normalized corpora
    #[serde(default = "_default_interim_dir")]
    pub interim: Utf8PathBuf,
    /// The feature tables
    #[serde(default = "_default_features_dir")]
    pub features: Utf8PathBuf,
    /// The vectorizer artifact
    #[serde(default = "_default_models_dir")]
    pub models: Utf8PathBuf,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            raw: _default_raw_dir(),
            interim: _default_interim_dir(),
            features: _default_features_dir(),
            models: _default_models_dir(),
        }
    }
}

fn _default_raw_dir() -> Utf8PathBuf { Utf8PathBuf::from("data/raw") }
fn _default_interim_dir() -> Utf8PathBuf { Utf8PathBuf::from("data/interim") }
fn _default_features_dir() -> Utf8PathBuf { Utf8PathBuf::from("data/features") }
fn _default_models_dir() -> Utf8PathBuf { Utf8PathBuf::from("models") }

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Files {
    #[serde(default = "_default_train_file")]
    pub train: Utf8PathBuf,
    #[serde(default = "_default_test_file")]
    pub test: Utf8PathBuf,
    #[serde(default = "_default_train_processed_file")]
    pub train_processed: Utf8PathBuf,
    #[serde(default = "_default_test_processed_file")]
    pub test_processed: Utf8PathBuf,
    #[serde(default = "_default_train_features_file")]
    pub train_features: Utf8PathBuf,
    #[serde(default = "_default_test_features_file")]
    pub test_features: Utf8PathBuf,
    /// A `.json` extension selects json, everything else bincode
    #[serde(default = "_default_vectorizer_file")]
    pub vectorizer: Utf8PathBuf,
}

impl Default for Files {
    fn default() -> Self {
        Self {
            train: _default_train_file(),
            test: _default_test_file(),
            train_processed: _default_train_processed_file(),
            test_processed: _default_test_processed_file(),
            train_features: _default_train_features_file(),
            test_features: _default_test_features_file(),
            vectorizer: _default_vectorizer_file(),
        }
    }
}

fn _default_train_file() -> Utf8PathBuf { Utf8PathBuf::from("train.csv") }
fn _default_test_file() -> Utf8PathBuf { Utf8PathBuf::from("test.csv") }
fn _default_train_processed_file() -> Utf8PathBuf { Utf8PathBuf::from("train_processed.csv") }
fn _default_test_processed_file() -> Utf8PathBuf { Utf8PathBuf::from("test_processed.csv") }
fn _default_train_features_file() -> Utf8PathBuf { Utf8PathBuf::from("train_bow.csv") }
fn _default_test_features_file() -> Utf8PathBuf { Utf8PathBuf::from("test_bow.csv") }
fn _default_vectorizer_file() -> Utf8PathBuf { Utf8PathBuf::from("vectorizer.bin") }
