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

//! Database error handling module
//! Define custom error types for database operations

use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Database operation error
#[derive(Error, Debug)]
pub enum DbError {
    /// Database URL not provided in environment variables
    #[error("Database URL is not provided in environment variables")]
    MissingDatabaseUrl,

    /// Invalid database type specified
    #[error("Invalid database type: {0}")]
    InvalidDatabaseType(String),

    /// Configured dialect does not match the backend selected by the URL
    #[error("Dialect {dialect} does not match the {backend} backend selected by the url")]
    DialectMismatch { dialect: String, backend: String },

    /// Database connection error, returned unchanged from the driver
    #[error("Failed to connect to database: {0}")]
    Connection(#[source] DbErr),

    /// The process-wide handle was used before `init`/`inject`
    #[error("Default database is not initialized")]
    NotInitialized,

    /// The process-wide handle is created once and never replaced
    #[error("Default database is already initialized")]
    AlreadyInitialized,

    /// Configuration could not be loaded
    #[error("Invalid database config: {0}")]
    Config(String),
}

/// Error returned by the transaction helpers.
///
/// `E` is the error type of the unit of work; it is handed back untouched in
/// [`TxError::Execution`] after the transaction has been rolled back.
#[derive(Error, Debug)]
pub enum TxError<E> {
    /// The transaction could not be started
    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] DbErr),

    /// The unit of work reported failure; the transaction was rolled back
    #[error("{0}")]
    Execution(E),

    /// The unit of work succeeded but the commit failed
    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] DbErr),

    /// The transaction outlived its deadline; the transaction was rolled back
    #[error("Transaction deadline exceeded")]
    Timeout,

    /// The unit of work panicked; the transaction was rolled back
    #[error("{0}")]
    Panic(PanicError),
}

impl<E> TxError<E> {
    /// Returns the unit-of-work error, if that is what failed.
    pub fn into_execution(self) -> Option<E> {
        match self {
            TxError::Execution(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TxError::Timeout)
    }
}

/// A panic raised by a unit of work, converted into a value.
#[derive(Debug, Clone)]
pub struct PanicError {
    /// The panic payload, if it was a string
    pub message: String,
    /// Backtrace captured at the panic site
    pub backtrace: String,
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit of work panicked: {}\nstack backtrace:\n{}", self.message, self.backtrace)
    }
}

impl std::error::Error for PanicError {}
