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

use camino::Utf8Path;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use feature_pipeline::pipeline::PipelineSettings;
use text_processing::vectorizer::validate_max_features;
use text_processing::configs::{NormalizerConfig, StopwordRegistryConfig};
use text_processing::stopword_registry::StopWordRepository;
use crate::config::{FeatureEngineeringConfig, PathsConfig, SystemConfig};

pub const ENV_PREFIX: &str = "FEATURIZE";

/// Loads the files of the working directory and [folder], overridden by [environment].
/// Absent files are skipped, unreadable ones are an error.
fn load_layered<T: DeserializeOwned>(folder: Option<&Utf8Path>, environment: Environment) -> Result<T, ConfigError> {
    let builder = Config::builder()
        .add_source(config::File::with_name("./featurize").required(false))
        .add_source(config::File::with_name("./params").required(false));
    let builder: ConfigBuilder<DefaultState> = match folder {
        None => builder,
        Some(folder) => builder
            .add_source(config::File::with_name(folder.join("featurize").as_str()).required(false))
            .add_source(config::File::with_name(folder.join("params").as_str()).required(false))
    };
    builder
        .add_source(environment)
        .build()?
        .try_deserialize()
}

/// Variables like `FEATURIZE.SYSTEM.LOG_LEVEL`.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator(".")
}

/// A collection of all config used by a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename(serialize = "Config"))]
pub struct Configs {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    pub feature_engineering: FeatureEngineeringConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

impl Configs {
    pub fn new(max_features: i64) -> Self {
        Self {
            system: Default::default(),
            paths: Default::default(),
            feature_engineering: FeatureEngineeringConfig { max_features },
            normalizer: Default::default(),
        }
    }

    pub fn load_with(folder: Option<&Utf8Path>, environment: Environment) -> Result<Self, ConfigError> {
        load_layered(folder, environment)
    }

    pub fn load_from<P: AsRef<Utf8Path>>(folder: P) -> Result<Self, ConfigError> {
        Self::load_with(Some(folder.as_ref()), environment())
    }

    pub fn discover() -> Result<Self, ConfigError> {
        Self::load_with(None, environment())
    }

    /// Validates the settings without touching the file system.
    pub fn pipeline_settings(&self) -> Result<PipelineSettings, ConfigError> {
        let max_features = self.feature_engineering.max_features;
        validate_max_features(max_features)
            .map_err(|err| ConfigError::Message(format!("feature_engineering.max_features: {err}")))?;
        Ok(PipelineSettings {
            max_features,
            stage_budget: self.system.stage_budget()?,
            paths: self.paths.pipeline_paths(),
        })
    }

    /// The config written by `--generate-example-config`.
    pub fn example() -> Self {
        let mut example = Self::new(50);
        example.normalizer.stopwords = StopwordRegistryConfig {
            registries: vec![
                StopWordRepository::Default,
                StopWordRepository::DirRepo {
                    with_default: false,
                    dir: "./stopwords".into(),
                },
            ]
        };
        example
    }
}

/// The part of the config needed to serve a persisted vectorizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServingConfigs {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

impl ServingConfigs {
    pub fn load_with(folder: Option<&Utf8Path>, environment: Environment) -> Result<Self, ConfigError> {
        load_layered(folder, environment)
    }

    pub fn load_from<P: AsRef<Utf8Path>>(folder: P) -> Result<Self, ConfigError> {
        Self::load_with(Some(folder.as_ref()), environment())
    }

    pub fn discover() -> Result<Self, ConfigError> {
        Self::load_with(None, environment())
    }
}

#[cfg(test)]
mod test {
    use camino_tempfile::tempdir;
    use config::{Config, Environment, FileFormat, Map};
    use config::ConfigError;
    use crate::config::configs::{Configs, ServingConfigs, ENV_PREFIX};
    use text_processing::configs::LemmatizerConfig;

    fn environment(values: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).separator(".").source(Some(map))
    }

    #[test]
    fn params_and_config_are_layered(){
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("params.yaml"), "feature_engineering:\n  max_features: 50\n").unwrap();
        std::fs::write(
            dir.path().join("featurize.yaml"),
            "system:\n  log_level: debug\n  stage_budget_secs: 2.5\nnormalizer:\n  min_tokens: 2\n"
        ).unwrap();

        let configs = Configs::load_with(Some(dir.path()), environment(&[])).unwrap();
        assert_eq!(configs.feature_engineering.max_features, 50);
        assert_eq!(configs.system.log_level, log::LevelFilter::Debug);
        assert_eq!(configs.normalizer.min_tokens, 2);
        let settings = configs.pipeline_settings().unwrap();
        assert_eq!(settings.stage_budget, Some(std::time::Duration::from_millis(2500)));
        assert_eq!(settings.paths.raw_train, "./data/raw/train.csv");
    }

    #[test]
    fn environment_overrides_files(){
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("params.yaml"), "feature_engineering:\n  max_features: 50\n").unwrap();
        let configs = Configs::load_with(
            Some(dir.path()),
            environment(&[
                ("FEATURIZE.FEATURE_ENGINEERING.MAX_FEATURES", "7"),
                ("FEATURIZE.SYSTEM.LOG_TO_FILE", "true"),
            ])
        ).unwrap();
        assert_eq!(configs.feature_engineering.max_features, 7);
        assert!(configs.system.log_to_file);
    }

    #[test]
    fn max_features_is_required(){
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("featurize.json"), r#"{"system": {"log_to_file": true}}"#).unwrap();
        let err = Configs::load_with(Some(dir.path()), environment(&[])).unwrap_err();
        assert!(err.to_string().contains("feature_engineering"), "{err}");
    }

    #[test]
    fn invalid_settings_are_rejected(){
        let mut configs = Configs::new(0);
        let err = configs.pipeline_settings().unwrap_err();
        assert!(err.to_string().contains("max_features"), "{err}");
        configs.feature_engineering.max_features = 5;
        configs.system.stage_budget_secs = Some(-2.0);
        assert!(matches!(configs.pipeline_settings(), Err(ConfigError::Message(_))));
    }

    #[test]
    fn serving_reads_the_normalizer_without_feature_engineering(){
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("featurize.yaml"),
            "normalizer:\n  min_tokens: 1\n  lemmatizer:\n    kind: identity\npaths:\n  root: /srv\n"
        ).unwrap();
        let configs = ServingConfigs::load_with(Some(dir.path()), environment(&[])).unwrap();
        assert_eq!(configs.normalizer.min_tokens, 1);
        assert!(matches!(configs.normalizer.lemmatizer, LemmatizerConfig::Identity));
        assert_eq!(configs.paths.file_vectorizer(), "/srv/models/vectorizer.bin");
    }

    #[test]
    fn serving_tolerates_absent_files_only(){
        let dir = tempdir().unwrap();
        let configs = ServingConfigs::load_with(Some(dir.path()), environment(&[])).unwrap();
        assert_eq!(configs.normalizer.min_tokens, 3);

        std::fs::write(dir.path().join("featurize.yaml"), "normalizer:\n  min_tokens: many\n").unwrap();
        assert!(ServingConfigs::load_with(Some(dir.path()), environment(&[])).is_err());
    }

    #[test]
    fn example_can_be_read_back(){
        let yaml = serde_yaml::to_string(&Configs::example()).unwrap();
        let configs: Configs = Config::builder()
            .add_source(config::File::from_str(&yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(configs.feature_engineering.max_features, 50);
        assert_eq!(configs.normalizer.stopwords, Configs::example().normalizer.stopwords);
        assert_eq!(configs.paths, Configs::example().paths);
    }
}
