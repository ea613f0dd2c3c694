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

//! Database connection management module
//! Provides the shared sea-orm pool, a sea-query builder over it and transaction helpers
//! with deadline, rollback and panic handling.

pub mod config;
pub mod connection;
pub mod error;
mod panic_guard;
pub mod sql_builder;
pub mod transaction;

pub use config::{DbConfig, Dialect};
pub use connection::{default_db, init, inject, orm, sql, DataBase};
pub use error::{DbError, PanicError, TxError};
pub use sea_orm::sea_query;
pub use sql_builder::SqlBuilder;
pub use transaction::{run_in_transaction, UnitOfWork};
