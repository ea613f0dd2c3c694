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

//! Sinks fanned out to by the logger, besides log4rs's own file and console appenders

pub mod daily;
pub mod kafka;
pub mod webhook;

use std::fmt;
use std::path::PathBuf;

use log::Record;

pub use daily::DailyRollingAppender;
pub use kafka::KafkaAppender;
pub use webhook::{DeliveryStats, WebHookAppender};

/// One destination of a built logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    SizeRotatedFile(PathBuf),
    DailyRotatedFile(PathBuf),
    Stdout,
    WebHook(String),
    Kafka(String),
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::SizeRotatedFile(path) => write!(f, "file {}", path.display()),
            SinkKind::DailyRotatedFile(path) => write!(f, "daily file {}", path.display()),
            SinkKind::Stdout => f.write_str("stdout"),
            SinkKind::WebHook(url) => write!(f, "webhook {}", url),
            SinkKind::Kafka(topic) => write!(f, "kafka topic {}", topic),
        }
    }
}

const TRANSPORT_TARGETS: [&str; 8] = [
    "rdkafka", "librdkafka", "reqwest", "hyper", "h2", "rustls", "native_tls", "want",
];

/// Records logged by the delivery stacks themselves; forwarding them would loop.
pub(crate) fn is_transport_record(record: &Record) -> bool {
    let target = record.target();
    TRANSPORT_TARGETS.iter().any(|prefix| {
        target == *prefix || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_transport(target: &str) -> bool {
        is_transport_record(&Record::builder().args(format_args!("x")).target(target).build())
    }

    #[test]
    fn test_transport_targets() {
        assert!(is_transport("rdkafka::client"));
        assert!(is_transport("hyper"));
        assert!(is_transport("reqwest::connect"));
        assert!(!is_transport("hyperion"));
        assert!(!is_transport("billing::orders"));
    }
}
