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

use crate::config::SystemConfig;
use camino::Utf8Path;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

const PATTERN: &str = "{l}@Thread{I} - {d} - {m}{n}";

/// The crates logging through the configured level.
const LOGGERS: [&str; 3] = ["featurize", "feature_pipeline", "text_processing"];

/// Creates the log4rs config, the root only logs warnings.
pub fn create_logging_config(system: &SystemConfig, root: &Utf8Path) -> anyhow::Result<Config> {
    let config = Config::builder();

    let config = if system.log_to_file {
        let file_logger = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(root.join("featurize.log"))?;
        config.appender(Appender::builder().build("out", Box::new(file_logger)))
    } else {
        // stdout is reserved for command output
        let console_logger = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .target(Target::Stderr)
            .build();
        config.appender(Appender::builder().build("out", Box::new(console_logger)))
    };

    let config = LOGGERS
        .into_iter()
        .fold(config, |config, name| config.logger(Logger::builder().build(name, system.log_level)))
        .build(Root::builder().appender("out").build(LevelFilter::Warn))?;
    Ok(config)
}

/// Configure the logging
pub fn configure_logging(system: &SystemConfig, root: &Utf8Path) -> anyhow::Result<()> {
    log4rs::init_config(create_logging_config(system, root)?)?;
    Ok(())
}
