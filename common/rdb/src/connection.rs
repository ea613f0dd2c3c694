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

//! Database Connection Management Module
//! Provides the shared database handle and its process-wide default instance

use std::sync::Arc;

use log::{error, info, warn};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::OnceCell;

use crate::config::{DbConfig, Dialect};
use crate::sql_builder::SqlBuilder;
use crate::DbError;

/// database info
static DEFAULT_DB: OnceCell<Arc<DataBase>> = OnceCell::const_new();

/// Shared database handle: the sea-orm pool plus the config it was opened with.
#[derive(Debug)]
pub struct DataBase {
    conn: DatabaseConnection,
    config: DbConfig,
}

impl DataBase {
    /// Opens the pool described by `config`.
    ///
    /// Pool options are applied only when non-zero; zero keeps the driver default.
    ///
    /// # Errors
    ///
    /// * `DbError::InvalidDatabaseType` - If `dialect` is set to an unknown name.
    /// * `DbError::Connection` - The driver error, unchanged. No retry is attempted.
    /// * `DbError::DialectMismatch` - If `dialect` disagrees with the backend the url selects.
    pub async fn open(config: DbConfig) -> Result<Self, DbError> {
        let dialect = Dialect::parse_optional(&config.dialect)?;
        info!("Configuring database connection parameters: dialect={}, max_open_conns={}",
            config.dialect, config.max_open_conns);

        let conn = Database::connect(connect_options(&config)).await.map_err(|e| {
            error!("Failed to create database connection pool: {}", e);
            DbError::Connection(e)
        })?;

        let backend = conn.get_database_backend();
        if let Some(dialect) = dialect {
            if dialect.backend() != backend {
                if let Err(e) = conn.close().await {
                    warn!("Failed to close database connection pool: {}", e);
                }
                return Err(DbError::DialectMismatch {
                    dialect: dialect.to_string(),
                    backend: format!("{:?}", backend),
                });
            }
        }
        info!("Database connection pool created successfully");
        Ok(Self { conn, config })
    }

    /// Wraps an already opened connection, e.g. a `MockDatabase` connection.
    pub fn from_connection(conn: DatabaseConnection, config: DbConfig) -> Self {
        Self { conn, config }
    }

    /// Row-mapping interface over the pool.
    pub fn orm(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Query-builder interface over the same pool.
    pub fn sql(&self) -> SqlBuilder<'_, DatabaseConnection> {
        SqlBuilder::new(&self.conn)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Starts a bare transaction; the caller commits or rolls it back.
    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.conn.begin().await
    }

    pub async fn close(self) -> Result<(), DbErr> {
        self.conn.close().await
    }

    /// Gives back the underlying connection.
    pub fn into_connection(self) -> DatabaseConnection {
        self.conn
    }
}

fn connect_options(config: &DbConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.sqlx_logging(config.debug);
    if config.max_open_conns != 0 {
        opt.max_connections(config.max_open_conns);
    }
    if config.max_idle_conns != 0 {
        let idle = match config.max_open_conns {
            0 => config.max_idle_conns,
            max => config.max_idle_conns.min(max),
        };
        opt.min_connections(idle);
    }
    if !config.conn_max_lifetime.is_zero() {
        opt.max_lifetime(config.conn_max_lifetime);
    }
    if !config.conn_max_idle_time.is_zero() {
        opt.idle_timeout(config.conn_max_idle_time);
    }
    if !config.connect_timeout.is_zero() {
        opt.connect_timeout(config.connect_timeout);
    }
    opt
}

/// Opens the default database and installs it for the rest of the process.
///
/// # Errors
///
/// * `DbError::AlreadyInitialized` - If a default database already exists.
/// * Any error of [`DataBase::open`].
pub async fn init(config: DbConfig) -> Result<Arc<DataBase>, DbError> {
    if DEFAULT_DB.initialized() {
        return Err(DbError::AlreadyInitialized);
    }
    let db = Arc::new(DataBase::open(config).await?);
    DEFAULT_DB.set(db.clone()).map_err(|_| DbError::AlreadyInitialized)?;
    Ok(db)
}

/// Startup variant of [`init`]: a missing database is unrecoverable, so any failure panics.
///
/// # Example
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     rdb::inject(rdb::DbConfig::new("sqlite", "sqlite::memory:")).await;
///     let db = rdb::default_db().unwrap();
///     println!("connected to {}", db.config().dialect);
/// }
/// ```
pub async fn inject(config: DbConfig) -> Arc<DataBase> {
    match init(config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            panic!("Failed to initialize database: {}", e)
        }
    }
}

/// Get the default database
pub fn default_db() -> Result<Arc<DataBase>, DbError> {
    DEFAULT_DB.get().cloned().ok_or(DbError::NotInitialized)
}

/// Row-mapping interface of the default database.
pub fn orm() -> Result<&'static DatabaseConnection, DbError> {
    DEFAULT_DB.get().map(|db| db.orm()).ok_or(DbError::NotInitialized)
}

/// Query-builder interface of the default database.
pub fn sql() -> Result<SqlBuilder<'static, DatabaseConnection>, DbError> {
    DEFAULT_DB.get().map(|db| db.sql()).ok_or(DbError::NotInitialized)
}
