// Copyright 2024. Felix Engl
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

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use text_processing::configs::NormalizerConfig;
use crate::config::{Configs, ServingConfigs};

pub const EXAMPLE_CONFIG_NAME: &str = "featurize_example.yaml";

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
/// Normalizes labeled text corpora and turns them into bag of words features.
pub struct FeaturizeArgs {
    /// A command to initialize an exemplary config
    #[arg(long)]
    pub generate_example_config: bool,

    /// The mode of featurize
    #[command(subcommand)]
    pub mode: Option<RunMode>,
}

#[derive(Subcommand, Debug)]
pub enum RunMode {
    /// Runs load, normalize, fit, vectorize, assemble and persist.
    RUN {
        /// The folder containing the required configs.
        #[arg(short, long)]
        config: Option<Utf8PathBuf>,
        /// overrides the log level from the config.
        #[arg(long)]
        override_log_level: Option<log::LevelFilter>,
        /// Log to file
        #[arg(long)]
        log_to_file: bool,
    },
    /// Prints the feature vector of a single document.
    VECTORIZE {
        /// The persisted vectorizer, defaults to the one in the config.
        #[arg(short, long)]
        vectorizer: Option<Utf8PathBuf>,
        /// The folder containing the configs.
        #[arg(short, long)]
        config: Option<Utf8PathBuf>,
        /// Print 1-based `[index, count]` pairs of the non zero counts.
        #[arg(long)]
        sparse: bool,
        /// The raw document.
        text: String,
    },
}

/// The kind of instruction provided by the args.
#[derive(Debug)]
pub enum Instruction {
    Run(Configs),
    Vectorize {
        normalizer: NormalizerConfig,
        vectorizer: Utf8PathBuf,
        sparse: bool,
        text: String,
    },
    Nothing,
}

/// Consumes the args and returns everything necessary to execute featurize
pub(crate) fn consume_args(args: FeaturizeArgs) -> anyhow::Result<Instruction> {
    match args.mode {
        Some(RunMode::RUN { config, override_log_level, log_to_file }) => {
            let mut configs = match config {
                None => Configs::discover(),
                Some(path) => Configs::load_from(path),
            }?;
            if let Some(log_level) = override_log_level {
                configs.system.log_level = log_level;
            }
            configs.system.log_to_file |= log_to_file;
            Ok(Instruction::Run(configs))
        }
        Some(RunMode::VECTORIZE { vectorizer, config, sparse, text }) => {
            // The vectorizer does not need the feature engineering settings.
            let configs = match config {
                None => ServingConfigs::discover(),
                Some(path) => ServingConfigs::load_from(path),
            }?;
            Ok(Instruction::Vectorize {
                vectorizer: vectorizer.unwrap_or_else(|| configs.paths.file_vectorizer()),
                normalizer: configs.normalizer,
                sparse,
                text,
            })
        }
        None => {
            if args.generate_example_config {
                let path = write_example_config(Utf8Path::new("."))?;
                println!("Created the example config at {path}.");
            }
            Ok(Instruction::Nothing)
        }
    }
}

/// Writes [Configs::example] as yaml to [dir].
pub fn write_example_config(dir: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXAMPLE_CONFIG_NAME);
    let mut writer = BufWriter::new(File::options().create(true).write(true).truncate(true).open(&path)?);
    serde_yaml::to_writer(&mut writer, &Configs::example())?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use camino_tempfile::tempdir;
    use clap::Parser;
    use crate::app::args::{consume_args, write_example_config, FeaturizeArgs, Instruction, RunMode};
    use crate::config::Configs;
    use text_processing::configs::LemmatizerConfig;

    #[test]
    fn parses_the_run_command(){
        let args = FeaturizeArgs::try_parse_from(
            ["featurize", "run", "-c", "./cfg", "--override-log-level", "debug", "--log-to-file"]
        ).unwrap();
        match args.mode {
            Some(RunMode::RUN { config, override_log_level, log_to_file }) => {
                assert_eq!(config.unwrap(), "./cfg");
                assert_eq!(override_log_level, Some(log::LevelFilter::Debug));
                assert!(log_to_file);
            }
            other => panic!("Unexpected mode {other:?}"),
        }
    }

    #[test]
    fn parses_the_vectorize_command(){
        let args = FeaturizeArgs::try_parse_from(
            ["featurize", "vectorize", "--vectorizer", "models/v.bin", "I love it"]
        ).unwrap();
        assert!(matches!(
            args.mode,
            Some(RunMode::VECTORIZE { vectorizer: Some(_), config: None, sparse: false, ref text }) if text == "I love it"
        ));
    }

    #[test]
    fn run_applies_the_overrides(){
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("params.yaml"), "feature_engineering:\n  max_features: 12\n").unwrap();
        let args = FeaturizeArgs {
            generate_example_config: false,
            mode: Some(RunMode::RUN {
                config: Some(dir.path().to_path_buf()),
                override_log_level: Some(log::LevelFilter::Trace),
                log_to_file: true,
            }),
        };
        match consume_args(args).unwrap() {
            Instruction::Run(configs) => {
                assert_eq!(configs.feature_engineering.max_features, 12);
                assert_eq!(configs.system.log_level, log::LevelFilter::Trace);
                assert!(configs.system.log_to_file);
            }
            other => panic!("Unexpected instruction {other:?}"),
        }
    }

    #[test]
    fn vectorize_uses_the_configured_normalizer(){
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("featurize.yaml"),
            "normalizer:\n  min_tokens: 1\n  lemmatizer:\n    kind: identity\n"
        ).unwrap();
        let args = FeaturizeArgs::try_parse_from(
            ["featurize", "vectorize", "-c", dir.path().as_str(), "--sparse", "great movie"]
        ).unwrap();
        match consume_args(args).unwrap() {
            Instruction::Vectorize { normalizer, vectorizer, sparse, text } => {
                assert_eq!(normalizer.min_tokens, 1);
                assert!(matches!(normalizer.lemmatizer, LemmatizerConfig::Identity));
                assert_eq!(vectorizer, "./models/vectorizer.bin");
                assert!(sparse);
                assert_eq!(text, "great movie");
            }
            other => panic!("Unexpected instruction {other:?}"),
        }
    }

    #[test]
    fn vectorize_reports_broken_config(){
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("featurize.yaml"), "normalizer: [unclosed\n").unwrap();
        let args = FeaturizeArgs::try_parse_from(
            ["featurize", "vectorize", "-c", dir.path().as_str(), "text"]
        ).unwrap();
        assert!(consume_args(args).is_err());
    }

    #[test]
    fn example_config_is_written(){
        let dir = tempdir().unwrap();
        let path = write_example_config(dir.path()).unwrap();
        let configs = Configs::load_from(dir.path());
        assert!(path.exists());
        // The example is not named like a config source.
        assert!(configs.is_err());
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("max_features: 50"), "{content}");
    }
}
