//! AMQP 0.9.1 adapter over `lapin`: topic exchange, DLX, durable work
//! queues, publisher confirms, and manual-ack consumption with a retry
//! count carried in the `x-retry-count` header (falling back from the
//! broker's own `x-death` count where present).

use crate::topology::{Topology, DLQ, DLX, EXCHANGE, WORK_QUEUES};
use crate::{BusError, BusResult, Consumer, Delivery, DeliveryHandle, MessageBus};
use async_trait::async_trait;
use indexer_types::Message;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, BasicRejectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{debug, info, warn};

pub struct AmqpBus {
    channel: Channel,
}

#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub name: String,
    pub message_count: u32,
    pub consumer_count: u32,
}

impl AmqpBus {
    pub async fn connect(uri: &str, prefetch: u16) -> BusResult<Self> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        channel.confirm_select(lapin::options::ConfirmSelectOptions::default()).await?;
        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await?;
        info!(uri, "connected to message broker");
        Ok(Self { channel })
    }

    /// Declares the exchange, DLX, DLQ, and all four work queues with
    /// their TTL/max-length/DLX arguments, and the bindings between them.
    /// Idempotent: safe to call on every process start.
    pub async fn declare_topology(&self) -> BusResult<()> {
        self.channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .exchange_declare(
                DLX,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .queue_declare(
                DLQ,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .queue_bind(DLQ, DLX, "dlq", QueueBindOptions::default(), FieldTable::default())
            .await?;

        for queue in WORK_QUEUES {
            self.channel
                .queue_declare(
                    queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    Topology::queue_arguments(),
                )
                .await?;
        }
        for (queue, keys) in Topology::bindings() {
            for key in *keys {
                self.channel
                    .queue_bind(queue, EXCHANGE, key, QueueBindOptions::default(), FieldTable::default())
                    .await?;
            }
        }
        debug!("topology declared");
        Ok(())
    }

    /// Passively declares `queue` to read back its depth and consumer
    /// count without altering it — the basis for `indexer broker status`.
    pub async fn queue_status(&self, queue: &str) -> BusResult<QueueStatus> {
        let declared = self
            .channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(QueueStatus {
            name: queue.to_string(),
            message_count: declared.message_count(),
            consumer_count: declared.consumer_count(),
        })
    }

    /// Purges a queue's contents, including undelivered messages held by
    /// no consumer. Used by `indexer broker purge` for manual recovery.
    pub async fn purge_queue(&self, queue: &str) -> BusResult<u32> {
        let purged = self
            .channel
            .queue_purge(queue, lapin::options::QueuePurgeOptions::default())
            .await?;
        Ok(purged)
    }

    pub async fn consumer(&self, queue: &str, tag: &str) -> BusResult<AmqpConsumer> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(AmqpConsumer {
            channel: self.channel.clone(),
            inner: consumer,
        })
    }
}

#[async_trait]
impl MessageBus for AmqpBus {
    async fn publish(&self, routing_key: &str, message: &Message) -> BusResult<()> {
        let payload = serde_json::to_vec(message)?;
        let confirm = self
            .channel
            .basic_publish(
                EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_content_type("application/json".into()),
            )
            .await?
            .await?;
        if confirm.is_nack() {
            warn!(routing_key, "publish was nacked by broker");
            return Err(BusError::PublishNotConfirmed);
        }
        Ok(())
    }
}

pub struct AmqpConsumer {
    channel: Channel,
    inner: lapin::Consumer,
}

struct AmqpDeliveryHandle {
    channel: Channel,
    delivery_tag: u64,
}

#[async_trait]
impl DeliveryHandle for AmqpDeliveryHandle {
    async fn ack(&self) -> BusResult<()> {
        self.channel
            .basic_ack(self.delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn nack_requeue(&self) -> BusResult<()> {
        self.channel
            .basic_nack(
                self.delivery_tag,
                BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn reject_to_dlq(&self) -> BusResult<()> {
        self.channel
            .basic_reject(self.delivery_tag, BasicRejectOptions { requeue: false })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Consumer for AmqpConsumer {
    async fn next_delivery(&mut self) -> BusResult<Delivery> {
        use tokio_stream::StreamExt;
        let delivery = self
            .inner
            .next()
            .await
            .ok_or_else(|| BusError::QueueClosed("consumer stream ended".to_string()))??;

        let retry_count = delivery
            .properties
            .headers()
            .as_ref()
            .and_then(|headers| headers.inner().get("x-retry-count"))
            .and_then(|v| v.as_long_int())
            .map(|v| v as u32)
            .or_else(|| death_count(&delivery))
            .unwrap_or(0);

        let message = serde_json::from_slice::<Message>(&delivery.data).map_err(|e| e.to_string());
        let handle = AmqpDeliveryHandle {
            channel: self.channel.clone(),
            delivery_tag: delivery.delivery_tag,
        };
        Ok(Delivery::new(message, retry_count, Box::new(handle)))
    }
}

/// Reads the broker's native `x-death` redelivery count, present once a
/// message has been dead-lettered and republished at least once.
fn death_count(delivery: &lapin::message::Delivery) -> Option<u32> {
    let headers = delivery.properties.headers().as_ref()?;
    let deaths = headers.inner().get("x-death")?.as_array()?;
    deaths
        .as_slice()
        .first()
        .and_then(|d| d.as_field_table())
        .and_then(|t| t.inner().get("count"))
        .and_then(|v| v.as_long_long_int())
        .map(|v| v as u32)
}
