//! In-memory bus used by `indexer-core`'s unit tests and the workspace's
//! scenario tests: one unbounded channel per queue, preserving per-queue
//! FIFO order and the same manual ack/nack/reject-to-DLQ contract the AMQP
//! adapter exposes, without requiring a running broker.

use crate::routing::queue_for_routing_key;
use crate::{BusError, BusResult, Consumer, Delivery, DeliveryHandle, MessageBus};
use async_trait::async_trait;
use indexer_types::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

type Queued = (Message, u32);

#[derive(Clone)]
pub struct InMemoryBus {
    queues: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Queued>>>>,
    receivers: Arc<Mutex<HashMap<String, mpsc::UnboundedReceiver<Queued>>>>,
    dlq: mpsc::UnboundedSender<Queued>,
    dlq_rx: Arc<Mutex<mpsc::UnboundedReceiver<Queued>>>,
}

impl InMemoryBus {
    pub fn new(queue_names: &[&str]) -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for name in queue_names {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert((*name).to_string(), tx);
            receivers.insert((*name).to_string(), rx);
        }
        let (dlq_tx, dlq_rx) = mpsc::unbounded_channel();
        Self {
            queues: Arc::new(Mutex::new(senders)),
            receivers: Arc::new(Mutex::new(receivers)),
            dlq: dlq_tx,
            dlq_rx: Arc::new(Mutex::new(dlq_rx)),
        }
    }

    /// Takes ownership of one queue's receiving end to build a `Consumer`.
    /// Panics if the queue was already taken or doesn't exist — a
    /// programming error in test setup, not a runtime condition.
    pub async fn take_consumer(&self, queue: &str) -> InMemoryConsumer {
        let rx = self
            .receivers
            .lock()
            .await
            .remove(queue)
            .unwrap_or_else(|| panic!("queue {queue} already consumed or unknown"));
        InMemoryConsumer {
            queue: queue.to_string(),
            rx,
            requeue_to: self.queues.lock().await.get(queue).unwrap().clone(),
            dlq: self.dlq.clone(),
        }
    }

    pub async fn dlq_depth(&self) -> usize {
        // Unbounded receivers don't expose a length; tests drain instead.
        self.dlq_rx.lock().await.len()
    }

    pub async fn drain_dlq(&self) -> Vec<Message> {
        let mut rx = self.dlq_rx.lock().await;
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item.0);
        }
        out
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, routing_key: &str, message: &Message) -> BusResult<()> {
        let Some(queue) = queue_for_routing_key(routing_key) else {
            return Ok(()); // event.unknown: deliberately dropped
        };
        let queues = self.queues.lock().await;
        let sender = queues
            .get(queue)
            .ok_or_else(|| BusError::QueueClosed(queue.to_string()))?;
        sender
            .send((message.clone(), 0))
            .map_err(|_| BusError::QueueClosed(queue.to_string()))
    }
}

pub struct InMemoryConsumer {
    queue: String,
    rx: mpsc::UnboundedReceiver<Queued>,
    requeue_to: mpsc::UnboundedSender<Queued>,
    dlq: mpsc::UnboundedSender<Queued>,
}

struct InMemoryDeliveryHandle {
    message: Queued,
    requeue_to: mpsc::UnboundedSender<Queued>,
    dlq: mpsc::UnboundedSender<Queued>,
    queue: String,
}

#[async_trait]
impl DeliveryHandle for InMemoryDeliveryHandle {
    async fn ack(&self) -> BusResult<()> {
        Ok(())
    }

    async fn nack_requeue(&self) -> BusResult<()> {
        let (message, retry_count) = self.message.clone();
        self.requeue_to
            .send((message, retry_count + 1))
            .map_err(|_| BusError::QueueClosed(self.queue.clone()))
    }

    async fn reject_to_dlq(&self) -> BusResult<()> {
        self.dlq
            .send(self.message.clone())
            .map_err(|_| BusError::QueueClosed("dlq.events".to_string()))
    }
}

#[async_trait]
impl Consumer for InMemoryConsumer {
    async fn next_delivery(&mut self) -> BusResult<Delivery> {
        let (message, retry_count) = self
            .rx
            .recv()
            .await
            .ok_or_else(|| BusError::QueueClosed(self.queue.clone()))?;
        let handle = InMemoryDeliveryHandle {
            message: (message.clone(), retry_count),
            requeue_to: self.requeue_to.clone(),
            dlq: self.dlq.clone(),
            queue: self.queue.clone(),
        };
        Ok(Delivery::new(Ok(message), retry_count, Box::new(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use indexer_types::{ReconciliationEnvelope, ReconciliationEnvelopeWithMeta};

    fn sample_message() -> Message {
        Message::Reconciliation(ReconciliationEnvelopeWithMeta {
            published_at: Utc::now(),
            reconciliation: ReconciliationEnvelope {
                chain_id: 31337,
                reconciliation_type: "mark_expired_campaigns".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn publish_and_consume_round_trip() {
        let bus = InMemoryBus::new(&["queue.control"]);
        bus.publish("control.reconciliation", &sample_message()).await.unwrap();
        let mut consumer = bus.take_consumer("queue.control").await;
        let delivery = consumer.next_delivery().await.unwrap();
        assert_eq!(delivery.retry_count, 0);
        delivery.ack().await.unwrap();
    }

    #[tokio::test]
    async fn nack_requeue_increments_retry_count() {
        let bus = InMemoryBus::new(&["queue.control"]);
        bus.publish("control.reconciliation", &sample_message()).await.unwrap();
        let mut consumer = bus.take_consumer("queue.control").await;
        let delivery = consumer.next_delivery().await.unwrap();
        delivery.nack_requeue().await.unwrap();

        let redelivered = consumer.next_delivery().await.unwrap();
        assert_eq!(redelivered.retry_count, 1);
    }

    #[tokio::test]
    async fn reject_routes_to_dlq() {
        let bus = InMemoryBus::new(&["queue.control"]);
        bus.publish("control.reconciliation", &sample_message()).await.unwrap();
        let mut consumer = bus.take_consumer("queue.control").await;
        let delivery = consumer.next_delivery().await.unwrap();
        delivery.reject_to_dlq().await.unwrap();

        let dlq = bus.drain_dlq().await;
        assert_eq!(dlq.len(), 1);
    }
}
