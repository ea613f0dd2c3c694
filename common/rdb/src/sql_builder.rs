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

//! Query-builder access over the shared pool
//!
//! sea-orm covers row mapping; hand-built statements go through sea-query and are
//! rendered for the backend of the connection they run on.

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, ExecResult, QueryResult, Statement, StatementBuilder};

/// Renders and executes sea-query statements (queries and schema changes) on a
/// connection or transaction.
///
/// # Example
/// ```rust,no_run
/// use rdb::sea_query::{Alias, Expr, Query};
///
/// async fn example(db: &rdb::DataBase) -> Result<(), sea_orm::DbErr> {
///     let select = Query::select()
///         .column(Alias::new("id"))
///         .from(Alias::new("account"))
///         .and_where(Expr::col(Alias::new("active")).eq(true))
///         .to_owned();
///     let rows = db.sql().query_all(&select).await?;
///     println!("{} active accounts", rows.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder<'c, C> {
    conn: &'c C,
}

impl<'c, C> SqlBuilder<'c, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Renders `stmt` for the connection's backend without running it.
    pub fn build<S: StatementBuilder>(&self, stmt: &S) -> Statement {
        self.backend().build(stmt)
    }

    pub async fn execute<S: StatementBuilder>(&self, stmt: &S) -> Result<ExecResult, DbErr> {
        self.conn.execute(self.build(stmt)).await
    }

    pub async fn query_one<S: StatementBuilder>(&self, stmt: &S) -> Result<Option<QueryResult>, DbErr> {
        self.conn.query_one(self.build(stmt)).await
    }

    pub async fn query_all<S: StatementBuilder>(&self, stmt: &S) -> Result<Vec<QueryResult>, DbErr> {
        self.conn.query_all(self.build(stmt)).await
    }
}
