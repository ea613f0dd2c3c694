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

//! Record encoding shared by every sink
//!
//! Key order is time, level, caller, msg, static fields, then the record's key/values.
//! A suppressed key is left out of the record entirely.

use chrono::{DateTime, Local};
use log::kv::{self, Key, Source, Value, VisitSource};
use log::{LevelFilter, Record};
use log4rs::encode::{self, Encode};
use serde_json::{Map, Value as JsonValue};

use crate::config::LogConfig;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %:z";
const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const CALLER_KEY: &str = "caller";
const MSG_KEY: &str = "msg";
const FIX_CALLER_WIDTH: usize = 32;
const RESERVED_KEYS: [&str; 4] = [TIME_KEY, LEVEL_KEY, CALLER_KEY, MSG_KEY];
/// Prepended to a field or record key that collides with a built-in key
const FIELD_PREFIX: &str = "fields.";

/// Output format, selected by a case-insensitive name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    /// Fixed-width columns
    Fix,
    /// Tab separated, human readable
    #[default]
    Console,
}

impl Format {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => Format::Json,
            "fix" => Format::Fix,
            _ => Format::Console,
        }
    }
}

/// Parses a level name; empty or unrecognised text falls back to info.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

#[derive(Debug, Clone)]
pub struct RecordEncoder {
    format: Format,
    with_time: bool,
    with_level: bool,
    with_caller: bool,
    fields: Vec<(String, String)>,
}

impl RecordEncoder {
    pub fn new(config: &LogConfig) -> Self {
        Self {
            format: Format::parse(&config.format),
            with_time: !config.forbid_time,
            with_level: !config.forbid_level,
            with_caller: config.caller,
            fields: config.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Same keys and fields, different format.
    pub fn with_format(&self, format: Format) -> Self {
        Self { format, ..self.clone() }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Renders one record as a single line, including the trailing newline.
    pub fn render(&self, record: &Record) -> String {
        self.render_at(record, Local::now())
    }

    pub fn render_at(&self, record: &Record, now: DateTime<Local>) -> String {
        let time = self.with_time.then(|| now.format(TIME_FORMAT).to_string());
        let level = self.with_level.then(|| record.level().to_string());
        let caller = self.with_caller.then(|| short_caller(record));
        let msg = record.args().to_string();
        let mut extra: Vec<(String, JsonValue)> =
            self.fields.iter().map(|(k, v)| (k.clone(), JsonValue::String(v.clone()))).collect();
        collect_key_values(record, &mut extra);
        escape_reserved(&mut extra);

        let mut line = match self.format {
            Format::Json => {
                let mut map = Map::new();
                if let Some(time) = time {
                    map.insert(TIME_KEY.to_string(), JsonValue::String(time));
                }
                if let Some(level) = level {
                    map.insert(LEVEL_KEY.to_string(), JsonValue::String(level));
                }
                if let Some(caller) = caller {
                    map.insert(CALLER_KEY.to_string(), JsonValue::String(caller));
                }
                map.insert(MSG_KEY.to_string(), JsonValue::String(msg));
                map.extend(extra);
                JsonValue::Object(map).to_string()
            }
            Format::Console => {
                let mut columns: Vec<String> = [time, level, caller].into_iter().flatten().collect();
                columns.push(msg);
                if !extra.is_empty() {
                    let map: Map<String, JsonValue> = extra.into_iter().collect();
                    columns.push(JsonValue::Object(map).to_string());
                }
                columns.join("\t")
            }
            Format::Fix => {
                let mut columns = Vec::with_capacity(4);
                if let Some(time) = time {
                    columns.push(time);
                }
                if let Some(level) = level {
                    columns.push(format!("{:<5}", level));
                }
                if let Some(caller) = caller {
                    columns.push(format!("{:<width$}", caller, width = FIX_CALLER_WIDTH));
                }
                columns.push(msg);
                let mut line = columns.join(" ");
                for (k, v) in extra {
                    match v {
                        JsonValue::String(s) => line.push_str(&format!(" {}={}", k, s)),
                        other => line.push_str(&format!(" {}={}", k, other)),
                    }
                }
                line
            }
        };
        line.push('\n');
        line
    }
}

impl Encode for RecordEncoder {
    fn encode(&self, w: &mut dyn encode::Write, record: &Record) -> anyhow::Result<()> {
        w.write_all(self.render(record).as_bytes())?;
        Ok(())
    }
}

/// `dir/file.rs:line`, the last two path components of the source file.
fn short_caller(record: &Record) -> String {
    let Some(file) = record.file() else {
        return record.module_path().unwrap_or("???").to_string();
    };
    let file = file.replace('\\', "/");
    let mut parts = file.rsplitn(3, '/');
    let name = parts.next().unwrap_or_default();
    let short = match parts.next() {
        Some(dir) => format!("{}/{}", dir, name),
        None => name.to_string(),
    };
    match record.line() {
        Some(line) => format!("{}:{}", short, line),
        None => short,
    }
}

struct Collect<'a>(&'a mut Vec<(String, JsonValue)>);

impl<'kvs> VisitSource<'kvs> for Collect<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push((key.as_str().to_string(), to_json(&value)));
        Ok(())
    }
}

fn escape_reserved(extra: &mut [(String, JsonValue)]) {
    for (key, _) in extra.iter_mut() {
        if RESERVED_KEYS.contains(&key.as_str()) {
            key.insert_str(0, FIELD_PREFIX);
        }
    }
}

fn collect_key_values(record: &Record, out: &mut Vec<(String, JsonValue)>) {
    let _ = record.key_values().visit(&mut Collect(out));
}

fn to_json(value: &Value) -> JsonValue {
    if let Some(b) = value.to_bool() {
        JsonValue::Bool(b)
    } else if let Some(i) = value.to_i64() {
        JsonValue::from(i)
    } else if let Some(u) = value.to_u64() {
        JsonValue::from(u)
    } else if let Some(f) = value.to_f64() {
        JsonValue::from(f)
    } else {
        JsonValue::String(value.to_string())
    }
}
