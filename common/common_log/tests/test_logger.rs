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

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use common_log::{LogConfig, Logger, SinkKind, WebHookConfig};
use log::{Level, Log, Record};
use serde_json::Value;
use tempfile::TempDir;

fn file_config(dir: &TempDir, format: &str) -> LogConfig {
    LogConfig {
        path: dir.path().join("x").join("app.log").to_string_lossy().into_owned(),
        max_size: 10,
        disable_stdout: true,
        format: format.to_string(),
        ..Default::default()
    }
}

fn write(logger: &Logger, level: Level, msg: &str) {
    logger.log(&Record::builder().args(format_args!("{}", msg)).level(level).target("billing").build());
}

fn read_lines(path: impl AsRef<Path>) -> Vec<String> {
    fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[test]
fn test_json_file_only() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, "json");
    let logger = Logger::new(config.clone()).unwrap();

    assert!(dir.path().join("x").is_dir());
    assert_eq!(logger.sinks(), &[SinkKind::SizeRotatedFile(config.path.clone().into())]);

    write(&logger, Level::Info, "order created");
    write(&logger, Level::Warn, "order delayed");
    write(&logger, Level::Debug, "below the default level");
    logger.flush();

    let lines = read_lines(&config.path);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value.get("time").is_some());
        assert!(value.get("level").is_some());
    }
    let first: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["msg"], "order created");
    assert_eq!(first["level"], "INFO");
}

#[test]
fn test_size_rotation() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "json");
    config.max_size = 1;
    config.max_backups = 2;
    let logger = Logger::new(config).unwrap();

    let payload = "x".repeat(1024);
    for _ in 0..1200 {
        write(&logger, Level::Info, &payload);
    }
    logger.flush();

    let rolled = files_with_prefix(&dir.path().join("x"), "app.log.");
    assert!(!rolled.is_empty());
    assert!(rolled.len() <= 2);
}

#[test]
fn test_size_and_daily_sinks_together() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "fix");
    config.rotate_day = 1;
    config.max_age = 7;
    let logger = Logger::new(config.clone()).unwrap();
    assert_eq!(logger.sinks().len(), 2);
    assert!(matches!(logger.sinks()[1], SinkKind::DailyRotatedFile(_)));

    write(&logger, Level::Error, "settlement failed");
    logger.flush();

    // size sink owns the base file, the daily sink writes app.log.daily next to it
    assert!(fs::symlink_metadata(&config.path).unwrap().file_type().is_file());
    assert!(read_lines(&config.path)[0].contains("settlement failed"));
    let daily = files_with_prefix(&dir.path().join("x"), "app.log.");
    assert_eq!(daily, vec!["app.log.daily".to_string()]);
    assert!(read_lines(dir.path().join("x").join("app.log.daily"))[0].contains("settlement failed"));
}

#[test]
fn test_forbid_time_and_level() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "json");
    config.forbid_time = true;
    config.forbid_level = true;
    config.fields.insert("service".to_string(), "billing".to_string());
    let logger = Logger::new(config.clone()).unwrap();

    write(&logger, Level::Info, "order created");
    logger.flush();

    let value: Value = serde_json::from_str(&read_lines(&config.path)[0]).unwrap();
    assert!(value.get("time").is_none());
    assert!(value.get("level").is_none());
    assert_eq!(value["msg"], "order created");
    assert_eq!(value["service"], "billing");
}

#[test]
fn test_console_format_is_not_json() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "");
    config.forbid_time = true;
    let logger = Logger::new(config.clone()).unwrap();

    write(&logger, Level::Info, "order created");
    logger.flush();

    let line = &read_lines(&config.path)[0];
    assert!(serde_json::from_str::<Value>(line).is_err());
    assert_eq!(line, "INFO\torder created");
}

#[test]
fn test_level_filters_records() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "json");
    config.level = "error".to_string();
    let logger = Logger::new(config.clone()).unwrap();
    assert_eq!(logger.max_level(), log::LevelFilter::Error);

    write(&logger, Level::Warn, "dropped");
    write(&logger, Level::Error, "kept");
    logger.flush();

    let lines = read_lines(&config.path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("kept"));
}

#[test]
fn test_failing_webhook_does_not_affect_file() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir, "json");
    config.webhook.push(WebHookConfig {
        url: "http://127.0.0.1:9/hook".to_string(),
        timeout: 1,
        ..Default::default()
    });
    let logger = Logger::new(config.clone()).unwrap();
    assert_eq!(logger.sinks().len(), 2);

    for i in 0..3 {
        write(&logger, Level::Error, &format!("payment {} rejected", i));
    }
    logger.flush();
    assert_eq!(read_lines(&config.path).len(), 3);

    let stats = &logger.webhook_stats()[0];
    let deadline = Instant::now() + Duration::from_secs(15);
    while stats.failed() < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(stats.failed(), 3);
    assert_eq!(stats.delivered(), 0);
}

#[test]
fn test_yaml_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logger.yaml");
    let log_path = dir.path().join("app.log");
    fs::write(
        &path,
        format!(
            "path: {}\nlevel: warn\nmax_size: 5\ndisable_stdout: true\nformat: json\nfields:\n  service: billing\n",
            log_path.display()
        ),
    )
    .unwrap();

    let config = LogConfig::from_yaml(&path).unwrap();
    let logger = Logger::new(config).unwrap();
    assert_eq!(logger.max_level(), log::LevelFilter::Warn);
    assert_eq!(logger.sinks(), &[SinkKind::SizeRotatedFile(log_path)]);
}
