//! One producer wired to one consumer

use std::sync::Arc;

use scriv_core::{LogLevel, Payload, Producer, ProducerConfig};

use crate::config::ConsumerConfig;
use crate::consumer::Consumer;
use crate::error::LoggingError;

/// Convenience pairing of a [`Producer`] and the [`Consumer`] listening to it
///
/// The consumer also listens to any buses already listed in its config.
#[derive(Debug, Clone)]
pub struct LogStream {
    producer: Arc<Producer>,
    consumer: Consumer,
}

impl LogStream {
    pub fn new(
        producer_config: ProducerConfig,
        consumer_config: ConsumerConfig,
    ) -> Result<Self, LoggingError> {
        let producer = Arc::new(Producer::new(producer_config));
        let consumer = Consumer::new(consumer_config.listening_to(producer.clone()))?;
        Ok(Self { producer, consumer })
    }

    pub fn producer(&self) -> &Arc<Producer> {
        &self.producer
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    pub fn emit(&self, level: LogLevel, payload: impl Into<Payload>) {
        self.producer.emit(level, payload);
    }

    pub fn log(&self, payload: impl Into<Payload>) {
        self.producer.log(payload);
    }

    pub fn error(&self, payload: impl Into<Payload>) {
        self.producer.error(payload);
    }

    pub fn info(&self, payload: impl Into<Payload>) {
        self.producer.info(payload);
    }

    pub fn warn(&self, payload: impl Into<Payload>) {
        self.producer.warn(payload);
    }

    pub fn debug(&self, payload: impl Into<Payload>) {
        self.producer.debug(payload);
    }

    pub fn confirm(&self, payload: impl Into<Payload>) {
        self.producer.confirm(payload);
    }

    /// Resolve once everything emitted so far has been processed
    pub async fn flush(&self) -> Result<(), LoggingError> {
        self.consumer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriv_core::ConsoleConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stream_wires_producer_to_consumer() {
        let dir = TempDir::new().unwrap();
        let stream = LogStream::new(
            ProducerConfig::named("app").with_console(ConsoleConfig::silent()),
            ConsumerConfig::testing(dir.path()),
        )
        .unwrap();

        for level in LogLevel::ALL {
            assert_eq!(stream.producer().listener_count(level), 1);
        }
    }

    #[tokio::test]
    async fn test_extra_buses_are_kept() {
        let dir = TempDir::new().unwrap();
        let other = Arc::new(Producer::new(
            ProducerConfig::named("other").with_console(ConsoleConfig::silent()),
        ));
        let stream = LogStream::new(
            ProducerConfig::named("app").with_console(ConsoleConfig::silent()),
            ConsumerConfig::testing(dir.path()).listening_to(other.clone()),
        )
        .unwrap();

        assert_eq!(other.listener_count(LogLevel::Info), 1);
        assert_eq!(stream.producer().listener_count(LogLevel::Info), 1);
    }
}
