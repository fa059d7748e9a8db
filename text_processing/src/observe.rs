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

use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use log::{Level, Log, Metadata, Record};

/// Forwards everything to the logger installed for the process.
struct ProcessLogger;

impl Log for ProcessLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            log::logger().log(record)
        }
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// The logger a component writes to.
///
/// Every component receives its handle on construction instead of reaching
/// for a module level logger, so tests can swap in a [MemoryLog].
#[derive(Clone)]
pub struct LogHandle {
    target: &'static str,
    inner: Arc<dyn Log>,
}

impl LogHandle {
    pub fn new(target: &'static str, inner: Arc<dyn Log>) -> Self {
        Self { target, inner }
    }

    /// A handle writing to the logger of the process, usually log4rs.
    pub fn process(target: &'static str) -> Self {
        Self::new(target, Arc::new(ProcessLogger))
    }

    /// The same sink with another target.
    pub fn with_target(&self, target: &'static str) -> Self {
        Self {
            target,
            inner: self.inner.clone(),
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(
            &Metadata::builder()
                .level(level)
                .target(self.target)
                .build()
        )
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(self.target)
                .args(args)
                .build()
        )
    }

    #[inline]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }

    #[inline]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    #[inline]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    #[inline]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }
}

impl Debug for LogHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A logger keeping every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<(Level, String, String)>>,
}

impl MemoryLog {
    /// (level, target, message) of every record so far.
    pub fn records(&self) -> Vec<(Level, String, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(lvl, _, _)| *lvl == level)
            .map(|(_, _, message)| message)
            .collect()
    }
}

impl Log for MemoryLog {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let entry = (record.level(), record.target().to_string(), record.args().to_string());
        match self.records.lock() {
            Ok(mut records) => records.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use log::Level;
    use crate::observe::{LogHandle, MemoryLog};

    #[test]
    fn handles_write_to_the_injected_sink() {
        let sink = Arc::new(MemoryLog::default());
        let handle = LogHandle::new("normalizer", sink.clone());
        handle.warn(format_args!("stage {} failed", "lemmatization"));
        handle.with_target("vectorizer").info(format_args!("fitted"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (Level::Warn, "normalizer".to_string(), "stage lemmatization failed".to_string()));
        assert_eq!(records[1].1, "vectorizer");
    }
}
