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

//! Database Configuration Module
//! Handles environment variables and connection settings

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use sea_orm::DatabaseBackend;
use serde::{Deserialize, Deserializer};

use crate::DbError;

/// Database configuration
///
/// Every pool option left at zero keeps the driver default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Log every statement through the `log` facade
    pub debug: bool,
    /// Database type ("mysql", "postgres" or "sqlite"); empty accepts the url's backend
    pub dialect: String,
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_open_conns: u32,
    /// Number of idle connections kept warm by the pool
    pub max_idle_conns: u32,
    /// Maximum lifetime of a pooled connection (seconds)
    #[serde(deserialize_with = "duration_secs")]
    pub conn_max_lifetime: Duration,
    /// Idle time after which a pooled connection is closed (seconds)
    #[serde(deserialize_with = "duration_secs")]
    pub conn_max_idle_time: Duration,
    /// Connection timeout (seconds)
    #[serde(deserialize_with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Upper bound applied to a transaction when the caller gives no deadline (seconds)
    #[serde(deserialize_with = "duration_secs")]
    pub trans_timeout: Duration,
}

impl DbConfig {
    pub fn new(dialect: impl Into<String>, url: impl Into<String>) -> Self {
        Self { dialect: dialect.into(), url: url.into(), ..Default::default() }
    }

    /// Loads database configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// * `DbError::Config` - If the file cannot be read or parsed.
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| DbError::Config(format!("read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Loads database configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// `DB_URL` is required. `DB_DIALECT`, `DB_DEBUG`, `DB_MAX_OPEN_CONNS`,
    /// `DB_MAX_IDLE_CONNS`, `DB_CONN_MAX_LIFETIME`, `DB_CONN_MAX_IDLE_TIME`,
    /// `DB_CONNECT_TIMEOUT` and `DB_TRANS_TIMEOUT` are optional; durations are seconds.
    ///
    /// # Errors
    ///
    /// * `DbError::MissingDatabaseUrl` - If `DB_URL` is not set.
    /// * `DbError::Config` - If an optional variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, DbError> {
        info!("get db config from env");
        if let Ok(path) = dotenv::dotenv() {
            info!("load .env file: {}", path.display());
        }
        let url = env::var("DB_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
        let dialect = env::var("DB_DIALECT").unwrap_or_default().to_lowercase();

        Ok(Self {
            debug: env_parse("DB_DEBUG")?.unwrap_or(false),
            dialect,
            url,
            max_open_conns: env_parse("DB_MAX_OPEN_CONNS")?.unwrap_or(0),
            max_idle_conns: env_parse("DB_MAX_IDLE_CONNS")?.unwrap_or(0),
            conn_max_lifetime: env_secs("DB_CONN_MAX_LIFETIME")?,
            conn_max_idle_time: env_secs("DB_CONN_MAX_IDLE_TIME")?,
            connect_timeout: env_secs("DB_CONNECT_TIMEOUT")?,
            trans_timeout: env_secs("DB_TRANS_TIMEOUT")?,
        })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, DbError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DbError::Config(format!("{} has an invalid value: {}", key, value))),
        Err(_) => Ok(None),
    }
}

fn env_secs(key: &str) -> Result<Duration, DbError> {
    match env_parse::<f64>(key)? {
        Some(secs) => secs_to_duration(secs).map_err(|e| DbError::Config(format!("{}: {}", key, e))),
        None => Ok(Duration::ZERO),
    }
}

fn secs_to_duration(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn duration_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    secs_to_duration(secs).map_err(serde::de::Error::custom)
}

/// SQL dialect spoken by the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Parses the configured dialect; an empty string means "whatever the url selects".
    pub fn parse_optional(dialect: &str) -> Result<Option<Self>, DbError> {
        if dialect.trim().is_empty() {
            return Ok(None);
        }
        dialect.parse().map(Some)
    }

    pub fn backend(self) -> DatabaseBackend {
        match self {
            Dialect::MySql => DatabaseBackend::MySql,
            Dialect::Postgres => DatabaseBackend::Postgres,
            Dialect::Sqlite => DatabaseBackend::Sqlite,
        }
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => {
                warn!("db type is not support: {}", other);
                Err(DbError::InvalidDatabaseType(s.to_string()))
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}
