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

use std::path::PathBuf;

use thiserror::Error;

/// Logger construction error; no partial logger is returned.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve log path {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build log appender: {0}")]
    Appender(String),

    #[error("Failed to create kafka sink: {0}")]
    Kafka(String),

    #[error("Failed to create webhook sink: {0}")]
    WebHook(String),

    #[error("Invalid log configuration: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),

    #[error("Failed to install logger: {0}")]
    Init(#[from] log::SetLoggerError),

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Failed to read log configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse log configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
