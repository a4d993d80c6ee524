use std::time::Duration;

pub const EXCHANGE: &str = "blockchain_events";
pub const DLX: &str = "blockchain_events.dlx";
pub const DLQ: &str = "dlq.events";

pub const WORK_QUEUES: [&str; 4] = [
    "queue.campaign_created",
    "queue.donation_received",
    "queue.withdrawal_refund",
    "queue.control",
];

const QUEUE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const QUEUE_MAX_LENGTH: i64 = 100_000;

/// Declares the full topology: the topic exchange, the direct DLX, the
/// DLQ bound to it, and the four durable work queues each carrying
/// `{message-ttl, max-length, dlx, dlx-routing-key}` arguments. Pure data
/// describing what must exist; the `amqp` adapter is what actually issues
/// the AMQP declarations.
pub struct Topology;

impl Topology {
    pub fn queue_arguments() -> lapin::types::FieldTable {
        let mut args = lapin::types::FieldTable::default();
        args.insert(
            "x-message-ttl".into(),
            lapin::types::AMQPValue::LongUInt(QUEUE_TTL.as_millis() as u32),
        );
        args.insert(
            "x-max-length".into(),
            lapin::types::AMQPValue::LongLongInt(QUEUE_MAX_LENGTH),
        );
        args.insert(
            "x-dead-letter-exchange".into(),
            lapin::types::AMQPValue::LongString(DLX.into()),
        );
        args.insert(
            "x-dead-letter-routing-key".into(),
            lapin::types::AMQPValue::LongString("dlq".into()),
        );
        args
    }

    pub fn bindings() -> &'static [(&'static str, &'static [&'static str])] {
        &[
            ("queue.campaign_created", &["event.campaign_created"]),
            ("queue.donation_received", &["event.donation_received"]),
            ("queue.withdrawal_refund", &["event.withdrawn", "event.refunded"]),
            (
                "queue.control",
                &["control.rollback", "control.reconciliation"],
            ),
        ]
    }
}
