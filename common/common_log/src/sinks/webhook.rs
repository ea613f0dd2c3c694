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

//! Webhook sink
//!
//! Records are rendered on the logging thread and queued; a worker thread posts them.
//! A full queue drops the record instead of blocking the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::Record;
use log4rs::append::Append;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use crate::config::{WebHookConfig, WebHookKind};
use crate::encoder::{Format, RecordEncoder};
use crate::error::LogError;
use crate::sinks::is_transport_record;

/// Delivers one rendered payload to an endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait WebHookTransport: Send {
    fn post(&mut self, url: &str, body: &str) -> Result<(), String>;
}

/// HTTP transport; the client is built on the worker thread at first use.
pub struct HttpTransport {
    timeout: Duration,
    client: Option<Client>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, client: None }
    }
}

impl WebHookTransport for HttpTransport {
    fn post(&mut self, url: &str, body: &str) -> Result<(), String> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| format!("Failed to build http client: {}", e))?;
            self.client = Some(client);
        }
        let Some(client) = self.client.as_ref() else {
            return Err("http client unavailable".to_string());
        };
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .map_err(|e| format!("Failed to send webhook request: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("webhook responded {}", response.status()));
        }
        Ok(())
    }
}

/// Delivery counters of one webhook sink
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl DeliveryStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Records discarded because the queue was full or the worker had stopped
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct WebHookAppender {
    url: String,
    kind: WebHookKind,
    chat_id: String,
    prefix: String,
    encoder: RecordEncoder,
    sender: SyncSender<String>,
    stats: Arc<DeliveryStats>,
}

impl fmt::Debug for WebHookAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebHookAppender")
            .field("url", &self.url)
            .field("kind", &self.kind)
            .field("stats", &self.stats)
            .finish()
    }
}

impl WebHookAppender {
    /// Builds the sink with the HTTP transport.
    pub fn new(config: &WebHookConfig, prefix: &str, encoder: &RecordEncoder) -> Result<Self, LogError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout.max(1)));
        Self::with_transport(config, prefix, encoder, transport)
    }

    /// # Errors
    ///
    /// * `LogError::WebHook` - If the url is empty or the worker thread cannot start.
    pub fn with_transport<T>(
        config: &WebHookConfig,
        prefix: &str,
        encoder: &RecordEncoder,
        transport: T,
    ) -> Result<Self, LogError>
    where
        T: WebHookTransport + 'static,
    {
        if config.url.trim().is_empty() {
            return Err(LogError::WebHook("webhook url is empty".to_string()));
        }
        let (sender, receiver) = mpsc::sync_channel(config.queue_size.max(1));
        let stats = Arc::new(DeliveryStats::default());
        let url = config.url.clone();
        let worker_stats = stats.clone();
        thread::Builder::new()
            .name("log-webhook".to_string())
            .spawn(move || deliver(receiver, transport, &url, &worker_stats))
            .map_err(|e| LogError::WebHook(format!("Failed to start webhook worker: {}", e)))?;

        // chat endpoints get the readable line, generic hooks the JSON record
        let format = match config.kind {
            WebHookKind::Generic => Format::Json,
            WebHookKind::DingDing | WebHookKind::Telegram => Format::Console,
        };
        Ok(Self {
            url: config.url.clone(),
            kind: config.kind,
            chat_id: config.chat_id.clone(),
            prefix: prefix.to_string(),
            encoder: encoder.with_format(format),
            sender,
            stats,
        })
    }

    pub fn stats(&self) -> Arc<DeliveryStats> {
        self.stats.clone()
    }

    fn payload(&self, record: &Record) -> String {
        let line = self.encoder.render(record);
        let line = line.trim_end();
        match self.kind {
            WebHookKind::Generic => line.to_string(),
            WebHookKind::DingDing => json!({
                "msgtype": "text",
                "text": { "content": format!("{}{}", self.prefix, line) },
            })
            .to_string(),
            WebHookKind::Telegram => json!({
                "chat_id": self.chat_id,
                "text": format!("{}{}", self.prefix, line),
            })
            .to_string(),
        }
    }
}

fn deliver<T: WebHookTransport>(receiver: Receiver<String>, mut transport: T, url: &str, stats: &DeliveryStats) {
    for body in receiver {
        match transport.post(url, &body) {
            Ok(()) => stats.delivered.fetch_add(1, Ordering::Relaxed),
            Err(_) => stats.failed.fetch_add(1, Ordering::Relaxed),
        };
    }
}

impl Append for WebHookAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        if is_transport_record(record) {
            return Ok(());
        }
        match self.sender.try_send(self.payload(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(anyhow::anyhow!("webhook worker for {} has stopped", self.url))
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use log::Level;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Barrier, Mutex};
    use std::time::Instant;

    fn hook(kind: WebHookKind, queue_size: usize) -> WebHookConfig {
        WebHookConfig {
            url: "https://hooks.example.com/alert".to_string(),
            kind,
            chat_id: "-100200".to_string(),
            queue_size,
            ..Default::default()
        }
    }

    fn encoder() -> RecordEncoder {
        RecordEncoder::new(&LogConfig { forbid_time: true, ..Default::default() })
    }

    fn append(appender: &WebHookAppender, msg: &str) {
        appender
            .append(&Record::builder().args(format_args!("{}", msg)).level(Level::Error).target("billing").build())
            .unwrap();
    }

    #[test]
    fn test_generic_posts_json_record() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let mut transport = MockWebHookTransport::new();
        transport.expect_post().returning(move |url, body| {
            tx.lock().unwrap().send((url.to_string(), body.to_string())).unwrap();
            Ok(())
        });
        let appender = WebHookAppender::with_transport(&hook(WebHookKind::Generic, 8), "", &encoder(), transport).unwrap();

        append(&appender, "card declined");
        let (url, body) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(url, "https://hooks.example.com/alert");
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["msg"], "card declined");
    }

    #[test]
    fn test_chat_payloads() {
        let dingding =
            WebHookAppender::with_transport(&hook(WebHookKind::DingDing, 8), "[prod] ", &encoder(), MockWebHookTransport::new())
                .unwrap();
        let record = Record::builder().args(format_args!("disk full")).level(Level::Error).build();
        let value: serde_json::Value = serde_json::from_str(&dingding.payload(&record)).unwrap();
        assert_eq!(value["msgtype"], "text");
        assert_eq!(value["text"]["content"], "[prod] ERROR\tdisk full");

        let telegram =
            WebHookAppender::with_transport(&hook(WebHookKind::Telegram, 8), "", &encoder(), MockWebHookTransport::new())
                .unwrap();
        let record = Record::builder().args(format_args!("disk full")).level(Level::Error).build();
        let value: serde_json::Value = serde_json::from_str(&telegram.payload(&record)).unwrap();
        assert_eq!(value["chat_id"], "-100200");
        assert_eq!(value["text"], "ERROR\tdisk full");
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let gate = Arc::new(Barrier::new(2));
        let worker_gate = gate.clone();
        let released = Arc::new(AtomicBool::new(false));
        let mut transport = MockWebHookTransport::new();
        transport.expect_post().returning(move |_, _| {
            if !released.swap(true, Ordering::SeqCst) {
                worker_gate.wait();
            }
            Ok(())
        });
        let appender = WebHookAppender::with_transport(&hook(WebHookKind::Generic, 1), "", &encoder(), transport).unwrap();

        let started = Instant::now();
        for i in 0..50 {
            append(&appender, &format!("record {}", i));
        }
        assert!(started.elapsed() < Duration::from_secs(2));
        let stats = appender.stats();
        assert!(stats.dropped() >= 48);

        gate.wait();
        drop(appender);
    }

    #[test]
    fn test_failures_are_counted() {
        let mut transport = MockWebHookTransport::new();
        transport.expect_post().returning(|_, _| Err("503".to_string()));
        let appender = WebHookAppender::with_transport(&hook(WebHookKind::Generic, 8), "", &encoder(), transport).unwrap();
        let stats = appender.stats();

        append(&appender, "one");
        append(&appender, "two");
        let deadline = Instant::now() + Duration::from_secs(5);
        while stats.failed() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(stats.failed(), 2);
        assert_eq!(stats.delivered(), 0);
    }

    #[test]
    fn test_transport_records_are_skipped() {
        let appender =
            WebHookAppender::with_transport(&hook(WebHookKind::Generic, 1), "", &encoder(), MockWebHookTransport::new())
                .unwrap();
        for _ in 0..10 {
            appender
                .append(&Record::builder().args(format_args!("connecting")).target("hyper::client").build())
                .unwrap();
        }
        assert_eq!(appender.stats().dropped(), 0);
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let config = WebHookConfig::default();
        let result = WebHookAppender::with_transport(&config, "", &encoder(), MockWebHookTransport::new());
        assert!(matches!(result, Err(LogError::WebHook(_))));
    }
}
