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

//! Transaction helpers
//!
//! Runs a unit of work inside a transaction: commit on success, rollback on failure,
//! rollback on panic or deadline overrun. Exactly one of commit or rollback is issued.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use log::{debug, warn};
use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};

use crate::connection::{default_db, DataBase};
use crate::error::TxError;
use crate::panic_guard;
use crate::DbError;

/// Boxed future returned by a unit of work; borrows the transaction it runs on.
pub type UnitOfWork<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>;

impl DataBase {
    /// Runs `f` inside a transaction bounded by the configured `trans_timeout`, if any.
    ///
    /// # Example
    /// ```rust,no_run
    /// use rdb::sea_query::{Alias, Query};
    /// use rdb::SqlBuilder;
    ///
    /// async fn example(db: &rdb::DataBase) -> Result<(), rdb::TxError<sea_orm::DbErr>> {
    ///     db.transaction(|txn| {
    ///         Box::pin(async move {
    ///             let insert = Query::insert()
    ///                 .into_table(Alias::new("account"))
    ///                 .columns([Alias::new("name")])
    ///                 .values_panic(["alice".into()])
    ///                 .to_owned();
    ///             SqlBuilder::new(txn).execute(&insert).await?;
    ///             Ok(())
    ///         })
    ///     })
    ///     .await
    /// }
    /// ```
    pub async fn transaction<F, T, E>(&self, f: F) -> Result<T, TxError<E>>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> UnitOfWork<'c, T, E> + Send,
        T: Send,
        E: Send,
    {
        self.transaction_with_deadline(None, f).await
    }

    /// Runs `f` inside a transaction.
    ///
    /// A caller deadline is used as-is. Without one, a non-zero `trans_timeout` bounds the
    /// transaction from begin through commit.
    ///
    /// # Errors
    ///
    /// * `TxError::Begin` - The transaction could not be started.
    /// * `TxError::Execution` - `f` failed; the transaction was rolled back.
    /// * `TxError::Commit` - `f` succeeded but the commit failed.
    /// * `TxError::Timeout` - The deadline passed first; the transaction was rolled back.
    /// * `TxError::Panic` - `f` panicked; the transaction was rolled back.
    pub async fn transaction_with_deadline<F, T, E>(&self, deadline: Option<Instant>, f: F) -> Result<T, TxError<E>>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> UnitOfWork<'c, T, E> + Send,
        T: Send,
        E: Send,
    {
        let deadline = deadline.or_else(|| {
            let timeout = self.config().trans_timeout;
            // a timeout too large to represent leaves the transaction unbounded
            (!timeout.is_zero()).then(|| Instant::now().checked_add(timeout)).flatten()
        });

        let txn = match within(deadline, self.orm().begin()).await {
            Some(begun) => begun.map_err(TxError::Begin)?,
            None => return Err(TxError::Timeout),
        };

        let outcome = match panic_guard::catch(|| f(&txn)) {
            Ok(work) => within(deadline, panic_guard::catch_async(work)).await,
            Err(panic) => Some(Err(panic)),
        };

        match outcome {
            Some(Ok(Ok(value))) => {
                commit_within(deadline, txn.commit()).await?;
                Ok(value)
            }
            Some(Ok(Err(e))) => {
                rollback(txn).await;
                Err(TxError::Execution(e))
            }
            Some(Err(panic)) => {
                warn!("Unit of work panicked, rolling back: {}", panic.message);
                rollback(txn).await;
                Err(TxError::Panic(panic))
            }
            None => {
                warn!("Transaction deadline exceeded, rolling back");
                rollback(txn).await;
                Err(TxError::Timeout)
            }
        }
    }
}

async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline.into(), fut).await.ok(),
        None => Some(fut.await),
    }
}

async fn commit_within<E>(
    deadline: Option<Instant>,
    commit: impl Future<Output = Result<(), DbErr>>,
) -> Result<(), TxError<E>> {
    match within(deadline, commit).await {
        Some(committed) => committed.map_err(TxError::Commit),
        None => {
            warn!("Transaction deadline exceeded during commit");
            Err(TxError::Timeout)
        }
    }
}

async fn rollback(txn: DatabaseTransaction) {
    match txn.rollback().await {
        Ok(()) => debug!("Transaction rolled back"),
        Err(e) => warn!("Failed to roll back transaction: {}", e),
    }
}

/// Runs `f` in a transaction on the default database.
///
/// # Errors
///
/// * `DbError::NotInitialized` - If no default database was installed.
pub async fn run_in_transaction<F, T, E>(f: F) -> Result<Result<T, TxError<E>>, DbError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> UnitOfWork<'c, T, E> + Send,
    T: Send,
    E: Send,
{
    let db = default_db()?;
    Ok(db.transaction(f).await)
}
