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

mod args;
mod logging;

pub use args::FeaturizeArgs;
use args::{consume_args, Instruction};
use feature_pipeline::io::load_vectorizer;
use feature_pipeline::pipeline::Pipeline;
use camino::Utf8Path;
use log::info;
use text_processing::normalizer::TextNormalizer;
use text_processing::observe::LogHandle;
use crate::config::{Configs, SystemConfig};

pub fn exec_args(args: FeaturizeArgs) -> anyhow::Result<()> {
    match consume_args(args)? {
        Instruction::Run(configs) => execute(configs),
        Instruction::Vectorize { normalizer, vectorizer, sparse, text } => {
            logging::configure_logging(&SystemConfig::default(), Utf8Path::new("."))?;
            let normalizer = TextNormalizer::from_config(&normalizer, LogHandle::process("text_processing::normalizer"))?;
            let vectorizer = load_vectorizer(&vectorizer)?;
            let document = normalizer.normalize(&text);
            let features = vectorizer.transform_document(&document)?;
            if sparse {
                println!("{}", serde_json::to_string(&features.sparse_features())?);
            } else {
                println!("{}", serde_json::to_string(&features)?);
            }
            Ok(())
        }
        Instruction::Nothing => Ok(())
    }
}

/// Runs the whole pipeline with [configs].
fn execute(configs: Configs) -> anyhow::Result<()> {
    let settings = configs.pipeline_settings()?;
    logging::configure_logging(&configs.system, configs.paths.root_path())?;
    info!("Running the feature pipeline in {}.", configs.paths.root_path());
    let normalizer = TextNormalizer::from_config(
        &configs.normalizer,
        LogHandle::process("text_processing::normalizer")
    )?;
    let mut pipeline = Pipeline::new(
        settings,
        normalizer,
        LogHandle::process("feature_pipeline::pipeline")
    )?;
    pipeline.run()?;
    info!("Feature pipeline finished.");
    Ok(())
}
