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

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::LogError;

/// Logger configuration, read once when the logger is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file path; empty disables file output
    pub path: String,
    /// Minimum level name; empty or unknown means info
    pub level: String,
    /// Static fields stamped on every record
    pub fields: BTreeMap<String, String>,
    /// Size limit of the size-rotated file, in megabytes; 0 disables it
    pub max_size: u64,
    /// Rotated files kept by the size-rotated file; 0 keeps 10
    pub max_backups: u32,
    /// Age limit in days for daily-rotated files; 0 keeps them all
    pub max_age: u32,
    pub disable_stdout: bool,
    /// gzip files rolled out by size
    pub compress: bool,
    /// "json", "fix" or console (default)
    pub format: String,
    pub forbid_time: bool,
    pub forbid_level: bool,
    /// Annotate records with file:line
    pub caller: bool,
    /// Prepended to chat webhook messages
    pub prefix: String,
    pub kafka: Option<KafkaConfig>,
    pub webhook: Vec<WebHookConfig>,
    /// Rotation interval in days of the daily-rotated file; 0 disables it
    pub rotate_day: u32,
}

/// Kind of endpoint a webhook posts to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebHookKind {
    /// The JSON record is posted as-is
    #[default]
    Generic,
    DingDing,
    Telegram,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebHookConfig {
    pub url: String,
    pub kind: WebHookKind,
    /// Telegram chat id
    pub chat_id: String,
    /// Optional minimum level for this webhook
    pub level: String,
    /// Records waiting for delivery; further records are dropped
    pub queue_size: usize,
    /// Request timeout (seconds)
    pub timeout: u64,
}

impl Default for WebHookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            kind: WebHookKind::Generic,
            chat_id: String::new(),
            level: String::new(),
            queue_size: 1024,
            timeout: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    /// Record key; records are unkeyed when empty
    pub key: String,
    /// Optional minimum level for this sink
    pub level: String,
    /// Extra librdkafka producer properties
    pub properties: BTreeMap<String, String>,
}

impl LogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let config_str = std::fs::read_to_string(path.into())?;
        let config: LogConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    /// Merges `fields` into the static fields, overriding existing keys.
    pub fn add_fields(&mut self, fields: &BTreeMap<String, String>) {
        for (k, v) in fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }
}

/// Merges two field maps; keys of `src2` win.
pub fn combine_fields(src: &BTreeMap<String, String>, src2: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut dst = src.clone();
    dst.extend(src2.iter().map(|(k, v)| (k.clone(), v.clone())));
    dst
}
