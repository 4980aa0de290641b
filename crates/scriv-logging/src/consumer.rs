//! Consumer: subscribes to producers and persists what they emit
//!
//! A consumer listens on every level a bus has enabled. Each packet it
//! receives is claimed, serialized, and handed to the consumer's file
//! manager without waiting for the write.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use scriv_core::{EventBus, Listener, ListenerId, Packet};
use scriv_format::{Serializer, SerializerConfig};
use scriv_storage::{FileManager, FileManagerHandle, ManagerStatus};

use crate::config::ConsumerConfig;
use crate::error::LoggingError;

struct ConsumerInner {
    id: ListenerId,
    name: String,
    serializer: RwLock<Serializer>,
    files: FileManagerHandle,
    debug: bool,
}

impl Listener for ConsumerInner {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn on_packet(&self, mut packet: Packet) {
        packet.claim(&self.name);
        let encoded = self.serializer.read().encode(&packet);
        self.files.write(encoded);
    }
}

/// Subscriber that serializes packets and writes them to rotating files
///
/// Cloning yields another handle to the same consumer.
#[derive(Clone)]
pub struct Consumer {
    inner: Arc<ConsumerInner>,
}

impl Consumer {
    /// Build the serializer, spawn the file manager, and listen to the
    /// buses listed in `config`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: ConsumerConfig) -> Result<Self, LoggingError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(LoggingError::NoRuntime);
        }

        let files = FileManager::spawn(config.file_manager_config())?;
        let consumer = Self {
            inner: Arc::new(ConsumerInner {
                id: ListenerId::next(),
                name: config.name,
                serializer: RwLock::new(Serializer::new(config.serializer)),
                files,
                debug: config.debug,
            }),
        };

        for bus in config.listen.iter() {
            consumer.listen(bus.as_ref());
        }
        Ok(consumer)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn id(&self) -> ListenerId {
        self.inner.id
    }

    /// Subscribe to every level `bus` has enabled
    pub fn listen(&self, bus: &dyn EventBus) {
        let listener: Arc<dyn Listener> = self.inner.clone();
        let mut levels = 0;
        for level in bus.level_flags().enabled() {
            bus.subscribe(level, listener.clone());
            levels += 1;
        }
        if self.inner.debug {
            debug!(consumer = %self.inner.name, bus = %bus.name(), levels, "Listening");
        }
    }

    pub fn listen_all<'a>(&self, buses: impl IntoIterator<Item = &'a dyn EventBus>) {
        for bus in buses {
            self.listen(bus);
        }
    }

    /// Remove this consumer from every level `bus` has enabled
    pub fn unlisten(&self, bus: &dyn EventBus) {
        for level in bus.level_flags().enabled() {
            bus.unsubscribe(level, self.inner.id);
        }
        if self.inner.debug {
            debug!(consumer = %self.inner.name, bus = %bus.name(), "Stopped listening");
        }
    }

    pub fn unlisten_all<'a>(&self, buses: impl IntoIterator<Item = &'a dyn EventBus>) {
        for bus in buses {
            self.unlisten(bus);
        }
    }

    /// Swap the encoder; packets received afterwards use the new one
    pub fn set_serializer(&self, config: SerializerConfig) {
        self.inner.serializer.write().set_serializer(config);
    }

    pub fn serializer_kind(&self) -> &'static str {
        self.inner.serializer.read().kind()
    }

    /// The underlying file manager
    pub fn files(&self) -> &FileManagerHandle {
        &self.inner.files
    }

    /// Resolve once every packet received so far has been processed
    pub async fn flush(&self) -> Result<(), LoggingError> {
        Ok(self.inner.files.flush().await?)
    }

    pub async fn status(&self) -> Result<ManagerStatus, LoggingError> {
        Ok(self.inner.files.status().await?)
    }

    /// Flush, close the current file, and stop the scheduled jobs
    ///
    /// Packets that arrive afterwards are discarded.
    pub async fn shutdown(&self) -> Result<(), LoggingError> {
        Ok(self.inner.files.shutdown().await?)
    }
}

impl Listener for Consumer {
    fn id(&self) -> ListenerId {
        self.inner.id
    }

    fn on_packet(&self, packet: Packet) {
        self.inner.on_packet(packet);
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("serializer", &self.serializer_kind())
            .finish()
    }
}
