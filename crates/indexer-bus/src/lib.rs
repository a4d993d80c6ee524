//! # Message Bus
//!
//! Defines the publishing and consuming sides of the durable event bus,
//! mirroring the `EventPublisher`/subscription split the rest of this
//! codebase uses for its in-process bus, generalized to an out-of-process
//! broker.
//!
//! [`amqp`] is the production adapter (topic exchange, DLX, durable work
//! queues, publisher confirms, manual ack) over `lapin`. [`memory`] is an
//! in-memory double with the same per-queue FIFO and manual ack/nack
//! semantics, used by `indexer-core`'s and the workspace's tests.

pub mod amqp;
pub mod memory;
pub mod routing;
pub mod topology;

mod error;

pub use error::BusError;
pub use routing::{queue_for_routing_key, RoutingKey};
pub use topology::Topology;

use async_trait::async_trait;
use indexer_types::Message;

pub type BusResult<T> = Result<T, BusError>;

/// Driving port for publishing. Every publish blocks until the broker
/// (or its in-memory stand-in) has durably accepted the message.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, routing_key: &str, message: &Message) -> BusResult<()>;
}

/// A single delivered message plus the handle needed to ack/nack/reject it.
///
/// `message` is `Err` when the payload failed to parse — the handle is
/// still usable, so the worker can reject an unparseable delivery to the
/// DLQ rather than being unable to acknowledge it at all.
pub struct Delivery {
    pub message: Result<Message, String>,
    pub retry_count: u32,
    handle: Box<dyn DeliveryHandle>,
}

impl Delivery {
    pub fn new(message: Result<Message, String>, retry_count: u32, handle: Box<dyn DeliveryHandle>) -> Self {
        Self {
            message,
            retry_count,
            handle,
        }
    }

    pub async fn ack(self) -> BusResult<()> {
        self.handle.ack().await
    }

    /// Requeue with an incremented retry count, for transient failures.
    pub async fn nack_requeue(self) -> BusResult<()> {
        self.handle.nack_requeue().await
    }

    /// Reject without requeue — the broker routes it to the DLQ.
    pub async fn reject_to_dlq(self) -> BusResult<()> {
        self.handle.reject_to_dlq().await
    }
}

#[async_trait]
pub trait DeliveryHandle: Send + Sync {
    async fn ack(&self) -> BusResult<()>;
    async fn nack_requeue(&self) -> BusResult<()>;
    async fn reject_to_dlq(&self) -> BusResult<()>;
}

/// Driving port for consuming from one named queue.
#[async_trait]
pub trait Consumer: Send {
    async fn next_delivery(&mut self) -> BusResult<Delivery>;
}
