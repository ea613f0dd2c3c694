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

//! Panic boundary for caller-supplied units of work
//!
//! A panic inside the boundary is turned into a [`PanicError`] carrying the payload and
//! the backtrace of the panic site. Panics outside any boundary still reach the hook
//! that was installed before this one.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use futures::FutureExt;

use crate::error::PanicError;

tokio::task_local! {
    /// Backtrace of the last panic raised inside the current boundary
    static PANIC_TRACE: RefCell<Option<String>>;
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let captured = PANIC_TRACE
                .try_with(|slot| {
                    if let Ok(mut slot) = slot.try_borrow_mut() {
                        *slot = Some(Backtrace::force_capture().to_string());
                    }
                })
                .is_ok();
            if !captured {
                previous(info);
            }
        }));
    });
}

/// Runs `f`, converting a panic into a [`PanicError`].
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, PanicError> {
    install_hook();
    PANIC_TRACE.sync_scope(RefCell::new(None), || {
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(into_panic_error)
    })
}

/// Drives `fut` to completion, converting a panic raised while polling it into a
/// [`PanicError`]. The future is dropped after a panic.
pub(crate) async fn catch_async<F: Future>(fut: F) -> Result<F::Output, PanicError> {
    install_hook();
    PANIC_TRACE
        .scope(RefCell::new(None), async move {
            AssertUnwindSafe(fut).catch_unwind().await.map_err(into_panic_error)
        })
        .await
}

fn into_panic_error(payload: Box<dyn Any + Send>) -> PanicError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    let backtrace = PANIC_TRACE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
        .unwrap_or_else(|| Backtrace::force_capture().to_string());
    PanicError { message, backtrace }
}
