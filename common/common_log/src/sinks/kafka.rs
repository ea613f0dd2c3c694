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

use std::fmt;
use std::time::Duration;

use log::Record;
use log4rs::append::Append;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseRecord, DefaultProducerContext, Producer, ThreadedProducer};

use crate::config::KafkaConfig;
use crate::encoder::{Format, RecordEncoder};
use crate::error::LogError;
use crate::sinks::is_transport_record;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Forwards JSON records to a Kafka topic; sends never wait for the broker.
pub struct KafkaAppender {
    producer: ThreadedProducer<DefaultProducerContext>,
    topic: String,
    key: Option<String>,
    encoder: RecordEncoder,
}

impl fmt::Debug for KafkaAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaAppender")
            .field("topic", &self.topic)
            .field("key", &self.key)
            .finish()
    }
}

impl KafkaAppender {
    /// # Errors
    ///
    /// * `LogError::Kafka` - If no broker or topic is configured, or the producer cannot be created.
    pub fn new(config: &KafkaConfig, encoder: &RecordEncoder) -> Result<Self, LogError> {
        let brokers: Vec<&str> = config.brokers.iter().map(|b| b.trim()).filter(|b| !b.is_empty()).collect();
        if brokers.is_empty() {
            return Err(LogError::Kafka("no kafka brokers configured".to_string()));
        }
        if config.topic.trim().is_empty() {
            return Err(LogError::Kafka("kafka topic is empty".to_string()));
        }

        let mut client = ClientConfig::new();
        client
            .set("bootstrap.servers", brokers.join(","))
            .set("message.timeout.ms", "30000")
            .set("queue.buffering.max.messages", "100000")
            .set("compression.type", "snappy");
        for (key, value) in &config.properties {
            client.set(key, value);
        }
        let producer: ThreadedProducer<DefaultProducerContext> =
            client.create().map_err(|e| LogError::Kafka(e.to_string()))?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            key: Some(config.key.clone()).filter(|k| !k.is_empty()),
            encoder: encoder.with_format(Format::Json),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Append for KafkaAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        if is_transport_record(record) {
            return Ok(());
        }
        let line = self.encoder.render(record);
        let payload = line.trim_end();
        let mut message: BaseRecord<'_, str, str> = BaseRecord::to(&self.topic).payload(payload);
        if let Some(key) = self.key.as_deref() {
            message = message.key(key);
        }
        self.producer
            .send(message)
            .map_err(|(e, _)| anyhow::anyhow!("Failed to queue record for kafka topic {}: {}", self.topic, e))
    }

    fn flush(&self) {
        let _ = self.producer.flush(FLUSH_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;

    fn encoder() -> RecordEncoder {
        RecordEncoder::new(&LogConfig::default())
    }

    #[test]
    fn test_missing_brokers_or_topic() {
        let config = KafkaConfig { brokers: vec![" ".to_string()], topic: "logs".to_string(), ..Default::default() };
        assert!(matches!(KafkaAppender::new(&config, &encoder()), Err(LogError::Kafka(_))));

        let config = KafkaConfig { brokers: vec!["127.0.0.1:9092".to_string()], ..Default::default() };
        assert!(matches!(KafkaAppender::new(&config, &encoder()), Err(LogError::Kafka(_))));
    }

    #[test]
    fn test_invalid_property_fails_construction() {
        let mut config = KafkaConfig {
            brokers: vec!["127.0.0.1:9092".to_string()],
            topic: "logs".to_string(),
            ..Default::default()
        };
        config.properties.insert("no.such.property".to_string(), "1".to_string());
        assert!(matches!(KafkaAppender::new(&config, &encoder()), Err(LogError::Kafka(_))));
    }

    #[test]
    fn test_construction_does_not_contact_brokers() {
        let config = KafkaConfig {
            brokers: vec!["127.0.0.1:1".to_string()],
            topic: "logs".to_string(),
            key: "billing".to_string(),
            ..Default::default()
        };
        let appender = KafkaAppender::new(&config, &encoder()).unwrap();
        assert_eq!(appender.topic(), "logs");
        assert_eq!(appender.key.as_deref(), Some("billing"));
        assert_eq!(appender.encoder.format(), Format::Json);
    }
}
