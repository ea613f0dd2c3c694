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

pub mod config;
pub mod encoder;
pub mod error;
pub mod logger;
pub mod sinks;

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log4rs::Handle;

pub use config::{combine_fields, KafkaConfig, LogConfig, WebHookConfig, WebHookKind};
pub use encoder::{parse_level, Format, RecordEncoder};
pub use error::LogError;
pub use logger::Logger;
pub use sinks::{DeliveryStats, SinkKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Installed {
    Fallback,
    Configured,
}

/// log4rs handle of the process-wide logger and what it currently runs
static GLOBAL: Mutex<Option<(Handle, Installed)>> = Mutex::new(None);

fn global() -> MutexGuard<'static, Option<(Handle, Installed)>> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the fallback logger (console format on stdout, debug level) unless a logger
/// is already installed.
///
/// # Example
/// ```
/// common_log::init_default().expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init_default() -> Result<(), LogError> {
    let mut global = global();
    if global.is_none() {
        let handle = log4rs::init_config(logger::fallback()?)?;
        *global = Some((handle, Installed::Fallback));
    }
    Ok(())
}

/// Initialize logging system with config
///
/// Replaces the fallback logger if it is installed. The explicit configuration can be
/// installed once, at startup, before other threads start logging.
///
/// # Arguments
/// * `config` - LogConfig info
///
/// # Errors
///
/// * `LogError::AlreadyInitialized` - If an explicit configuration was installed before.
/// * Any construction error of [`Logger::new`]; the current logger is kept.
///
/// # Example
/// ```
/// use common_log::{init, LogConfig};
///
/// let config = LogConfig { format: "json".to_string(), level: "info".to_string(), ..Default::default() };
/// init(&config).expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    let mut global = global();
    if matches!(global.as_ref(), Some((_, Installed::Configured))) {
        return Err(LogError::AlreadyInitialized);
    }
    let built = logger::build(config)?;
    let handle = match global.take() {
        Some((handle, _)) => {
            handle.set_config(built.config);
            handle
        }
        None => log4rs::init_config(built.config)?,
    };
    *global = Some((handle, Installed::Configured));
    Ok(())
}

/// Initialize logging system from a YAML file
///
/// # Arguments
/// * `config_path` - Path to the logging configuration file
pub fn init_with_yaml(config_path: impl Into<PathBuf>) -> Result<(), LogError> {
    let config = LogConfig::from_yaml(config_path)?;
    init(&config)
}

/// Whether an explicit configuration has been installed.
pub fn is_initialized() -> bool {
    matches!(global().as_ref(), Some((_, Installed::Configured)))
}

/// The process-wide logger; the fallback is installed first if nothing is installed yet.
pub fn logger() -> &'static dyn log::Log {
    // another logging backend may own the `log` facade already
    let _ = init_default();
    log::logger()
}

// Re-export log macros for convenient use in other modules
pub use log::{debug, error, info, trace, warn};
