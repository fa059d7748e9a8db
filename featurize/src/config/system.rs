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

use std::time::Duration;
use config::ConfigError;
use serde::{Deserialize, Serialize};

/// Config of the system, logging and time limits.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename(serialize = "System"))]
pub struct SystemConfig {
    /// The log level of the application
    #[serde(default = "_default_log_level")]
    pub log_level: log::LevelFilter,

    /// Log to a file?
    #[serde(default)]
    pub log_to_file: bool,

    /// The seconds a single pipeline stage may take, unlimited if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_budget_secs: Option<f64>,
}

const fn _default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: _default_log_level(),
            log_to_file: false,
            stage_budget_secs: None,
        }
    }
}

impl SystemConfig {
    /// Returns the stage budget, [None] if unset.
    /// Negative, infinite or NaN seconds are rejected.
    pub fn stage_budget(&self) -> Result<Option<Duration>, ConfigError> {
        match self.stage_budget_secs {
            None => Ok(None),
            Some(value) => Duration::try_from_secs_f64(value)
                .map(Some)
                .map_err(|err| ConfigError::Message(format!("system.stage_budget_secs {value} is invalid: {err}")))
        }
    }
}
