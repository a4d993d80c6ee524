use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use indexer_store::UnitOfWork;
use tracing::info;

/// Dispatches on `reconciliation_type`; only `mark_expired_campaigns` is
/// implemented, matching the reference system (other reconciliation
/// types are a documented extension point, not a gap).
pub async fn run_reconciliation(
    uow: &mut dyn UnitOfWork,
    reconciliation_type: &str,
    now: DateTime<Utc>,
) -> CoreResult<usize> {
    match reconciliation_type {
        "mark_expired_campaigns" => mark_expired_campaigns(uow, now).await,
        other => Err(CoreError::UnsupportedReconciliationType(other.to_string())),
    }
}

async fn mark_expired_campaigns(uow: &mut dyn UnitOfWork, now: DateTime<Utc>) -> CoreResult<usize> {
    let expired = uow.expired_underfunded_campaigns(now).await?;
    for address in &expired {
        uow.mark_campaign_failed(*address).await?;
    }
    info!(count = expired.len(), "marked expired campaigns as failed");
    Ok(expired.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_updater::apply_event;
    use chrono::TimeZone;
    use indexer_store::{memory::InMemoryStateStore, StateStore};
    use indexer_types::{ArgValue, EventKind};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn expired_underfunded_campaign_is_marked_failed_and_idempotent() {
        let store = InMemoryStateStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.ensure_chain_exists(31337, "local").await.unwrap();

        let mut created = BTreeMap::new();
        created.insert("factory".to_string(), ArgValue::Address("0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string()));
        created.insert("campaign".to_string(), ArgValue::Address("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512".to_string()));
        created.insert("creator".to_string(), ArgValue::Address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string()));
        created.insert("goal".to_string(), ArgValue::Uint("10000000000000000000".to_string()));
        created.insert("deadline".to_string(), ArgValue::Uint("1000".to_string()));
        created.insert("cid".to_string(), ArgValue::Str("QmT".to_string()));
        apply_event(uow.as_mut(), 31337, EventKind::CampaignCreated, &created, "0xtx0", 0, 1, "0xblock1", Utc::now())
            .await
            .unwrap();

        let now = Utc.timestamp_opt(5000, 0).unwrap();
        let count = run_reconciliation(uow.as_mut(), "mark_expired_campaigns", now).await.unwrap();
        assert_eq!(count, 1);

        let count_again = run_reconciliation(uow.as_mut(), "mark_expired_campaigns", now).await.unwrap();
        assert_eq!(count_again, 0);
    }
}
