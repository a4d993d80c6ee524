/// The six routing keys this system publishes. Unknown event kinds never
/// produce one of these — they route to `event.unknown`, which is
/// deliberately left unbound so a new, un-migrated event kind drops
/// instead of silently corrupting a queue it wasn't designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingKey {
    CampaignCreated,
    DonationReceived,
    Withdrawn,
    Refunded,
    Rollback,
    Reconciliation,
}

impl RoutingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingKey::CampaignCreated => "event.campaign_created",
            RoutingKey::DonationReceived => "event.donation_received",
            RoutingKey::Withdrawn => "event.withdrawn",
            RoutingKey::Refunded => "event.refunded",
            RoutingKey::Rollback => "control.rollback",
            RoutingKey::Reconciliation => "control.reconciliation",
        }
    }
}

/// Maps a routing key to the durable work queue bound to it.
pub fn queue_for_routing_key(routing_key: &str) -> Option<&'static str> {
    match routing_key {
        "event.campaign_created" => Some("queue.campaign_created"),
        "event.donation_received" => Some("queue.donation_received"),
        "event.withdrawn" | "event.refunded" => Some("queue.withdrawal_refund"),
        "control.rollback" | "control.reconciliation" => Some("queue.control"),
        _ => None,
    }
}
