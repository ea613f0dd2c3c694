/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger as SizeBasedTriggerPolicy;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Root};
use log4rs::filter::threshold::ThresholdFilter;
use log4rs::Config;

use crate::config::LogConfig;
use crate::encoder::{parse_level, RecordEncoder};
use crate::error::LogError;
use crate::sinks::{DailyRollingAppender, DeliveryStats, KafkaAppender, SinkKind, WebHookAppender};

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_BACKUPS: u32 = 10;

/// A built logger: the log4rs configuration fanning out to every configured sink.
pub struct Logger {
    inner: log4rs::Logger,
    config: LogConfig,
    sinks: Vec<SinkKind>,
    webhook_stats: Vec<Arc<DeliveryStats>>,
}

/// log4rs configuration produced from a [`LogConfig`], ready to be installed or wrapped.
pub(crate) struct Built {
    pub(crate) config: Config,
    pub(crate) sinks: Vec<SinkKind>,
    pub(crate) webhook_stats: Vec<Arc<DeliveryStats>>,
}

impl Logger {
    /// Builds a standalone logger; it is not installed as the process-wide logger.
    ///
    /// # Arguments
    /// * `config` - Sinks, format and level of the logger
    ///
    /// # Errors
    ///
    /// Directory creation, path resolution and sink construction failures are returned
    /// and no logger is built.
    pub fn new(config: LogConfig) -> Result<Self, LogError> {
        let built = build(&config)?;
        Ok(Self {
            inner: log4rs::Logger::new(built.config),
            config,
            sinks: built.sinks,
            webhook_stats: built.webhook_stats,
        })
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Destinations every record is delivered to.
    pub fn sinks(&self) -> &[SinkKind] {
        &self.sinks
    }

    pub fn webhook_stats(&self) -> &[Arc<DeliveryStats>] {
        &self.webhook_stats
    }

    pub fn max_level(&self) -> LevelFilter {
        self.inner.max_log_level()
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.inner.log(record)
    }

    fn flush(&self) {
        Log::flush(&self.inner)
    }
}

pub(crate) fn build(config: &LogConfig) -> Result<Built, LogError> {
    let level = parse_level(&config.level);
    let encoder = RecordEncoder::new(config);
    let mut sinks = Vec::new();
    let mut webhook_stats = Vec::new();
    let mut appenders: Vec<Appender> = Vec::new();

    if !config.path.is_empty() {
        let path = Path::new(&config.path);
        create_parent_dir(path)?;

        if config.max_size != 0 {
            let appender = size_rotated(config, &encoder)?;
            appenders.push(named("size_rotated_file", None, appender));
            sinks.push(SinkKind::SizeRotatedFile(path.to_path_buf()));
        }

        if config.rotate_day != 0 {
            let appender = DailyRollingAppender::new(path, config.rotate_day, config.max_age, Box::new(encoder.clone()))?;
            sinks.push(SinkKind::DailyRotatedFile(appender.base().to_path_buf()));
            appenders.push(named("daily_rotated_file", None, appender));
        }
    }

    if !config.disable_stdout {
        let stdout = ConsoleAppender::builder()
            .target(Target::Stdout)
            .encoder(Box::new(encoder.clone()))
            .build();
        appenders.push(named("stdout", None, stdout));
        sinks.push(SinkKind::Stdout);
    }

    for (index, hook) in config.webhook.iter().enumerate() {
        let appender = WebHookAppender::new(hook, &config.prefix, &encoder)?;
        webhook_stats.push(appender.stats());
        appenders.push(named(&format!("webhook_{}", index), threshold(&hook.level), appender));
        sinks.push(SinkKind::WebHook(hook.url.clone()));
    }

    if let Some(kafka) = &config.kafka {
        let appender = KafkaAppender::new(kafka, &encoder)?;
        sinks.push(SinkKind::Kafka(appender.topic().to_string()));
        appenders.push(named("kafka", threshold(&kafka.level), appender));
    }

    let names: Vec<String> = appenders.iter().map(|a| a.name().to_string()).collect();
    let built = Config::builder()
        .appenders(appenders)
        .build(Root::builder().appenders(names).build(level))?;

    Ok(Built { config: built, sinks, webhook_stats })
}

/// Fallback used before any explicit configuration: console format on stdout, debug level.
pub(crate) fn fallback() -> Result<Config, LogError> {
    build(&LogConfig { level: "debug".to_string(), ..Default::default() }).map(|built| built.config)
}

fn create_parent_dir(path: &Path) -> Result<(), LogError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(|source| LogError::CreateDir { path: dir.to_path_buf(), source })
        }
        _ => Ok(()),
    }
}

fn size_rotated(config: &LogConfig, encoder: &RecordEncoder) -> Result<RollingFileAppender, LogError> {
    let archived_log_pattern = if config.compress {
        format!("{}.{{}}.gz", config.path)
    } else {
        format!("{}.{{}}", config.path)
    };
    let backups = match config.max_backups {
        0 => DEFAULT_MAX_BACKUPS,
        n => n,
    };

    // Configure rolling policy
    let size_trigger = SizeBasedTriggerPolicy::new(config.max_size.saturating_mul(MEGABYTE));
    let roller = FixedWindowRoller::builder()
        .build(&archived_log_pattern, backups)
        .map_err(|e| LogError::Appender(e.to_string()))?;
    let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

    RollingFileAppender::builder()
        .encoder(Box::new(encoder.clone()))
        .build(PathBuf::from(&config.path), Box::new(compound_policy))
        .map_err(|e| LogError::Appender(e.to_string()))
}

fn threshold(level: &str) -> Option<LevelFilter> {
    (!level.trim().is_empty()).then(|| parse_level(level))
}

fn named(name: &str, level: Option<LevelFilter>, appender: impl Append) -> Appender {
    let mut builder = Appender::builder();
    if let Some(level) = level {
        builder = builder.filter(Box::new(ThresholdFilter::new(level)));
    }
    builder.build(name, Box::new(appender))
}
