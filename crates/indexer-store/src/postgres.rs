//! Postgres adapter for the `StateStore` port, built on `sqlx`. Every
//! mutation method runs against a `sqlx::Transaction` held by the unit of
//! work and is only durable once `commit` is called.

use crate::port::{InsertOutcome, StateStore, UnitOfWork};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexer_types::{Address, ArgValue, Campaign, CampaignStatus, Chain, Contribution, Event, SyncState};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::BTreeMap;

pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    pub async fn connect(db_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(db_url)
            .await?;
        Ok(Self { pool })
    }

    /// Applies the embedded migrations; called once at process startup by
    /// every CLI command that touches the store.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn tx(&mut self) -> &mut Transaction<'static, Postgres> {
        self.tx.as_mut().expect("unit of work used after commit/rollback")
    }
}

fn status_str(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Active => "ACTIVE",
        CampaignStatus::Success => "SUCCESS",
        CampaignStatus::Failed => "FAILED",
        CampaignStatus::Withdrawn => "WITHDRAWN",
    }
}

fn status_from_str(s: &str) -> CampaignStatus {
    match s {
        "SUCCESS" => CampaignStatus::Success,
        "FAILED" => CampaignStatus::Failed,
        "WITHDRAWN" => CampaignStatus::Withdrawn,
        _ => CampaignStatus::Active,
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn ensure_chain_exists(&mut self, chain_id: u64, name: &str) -> StoreResult<Chain> {
        let row = sqlx::query(
            r#"
            INSERT INTO chains (chain_id, name, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            ON CONFLICT (chain_id) DO UPDATE SET updated_at = chains.updated_at
            RETURNING id, chain_id, name, rpc_url, created_at, updated_at
            "#,
        )
        .bind(chain_id as i64)
        .bind(name)
        .fetch_one(&mut **self.tx())
        .await?;

        sqlx::query(
            r#"INSERT INTO sync_state (chain_id, last_block, last_block_hash, updated_at)
               VALUES ($1, 0, NULL, now())
               ON CONFLICT (chain_id) DO NOTHING"#,
        )
        .bind(chain_id as i64)
        .execute(&mut **self.tx())
        .await?;

        Ok(Chain {
            id: row.get("id"),
            name: row.get("name"),
            chain_id: row.get::<i64, _>("chain_id") as u64,
            rpc_url: row.get("rpc_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn get_sync_state(&mut self, chain_id: u64) -> StoreResult<Option<SyncState>> {
        let row = sqlx::query(
            "SELECT chain_id, last_block, last_block_hash, updated_at FROM sync_state WHERE chain_id = $1",
        )
        .bind(chain_id as i64)
        .fetch_optional(&mut **self.tx())
        .await?;
        Ok(row.map(|r| SyncState {
            chain_id: r.get::<i64, _>("chain_id") as u64,
            last_block: r.get::<i64, _>("last_block") as u64,
            last_block_hash: r.get("last_block_hash"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn advance_cursor(&mut self, chain_id: u64, block: u64, hash: &str) -> StoreResult<()> {
        sqlx::query(
            r#"UPDATE sync_state SET last_block = $2, last_block_hash = $3, updated_at = now()
               WHERE chain_id = $1"#,
        )
        .bind(chain_id as i64)
        .bind(block as i64)
        .bind(hash)
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn rewind_cursor(&mut self, chain_id: u64, block: u64, hash: &str) -> StoreResult<()> {
        self.advance_cursor(chain_id, block, hash).await
    }

    async fn get_campaign(&mut self, address: Address) -> StoreResult<Option<Campaign>> {
        let row = sqlx::query(
            r#"SELECT address, factory_address, creator_address, goal_wei::text, deadline_ts, cid,
                      status, total_raised_wei::text, withdrawn, withdrawn_amount_wei::text, created_at, updated_at
               FROM campaigns WHERE address = $1"#,
        )
        .bind(address.to_string())
        .fetch_optional(&mut **self.tx())
        .await?;
        Ok(row.map(row_to_campaign))
    }

    async fn get_contribution(
        &mut self,
        campaign: Address,
        donor: Address,
    ) -> StoreResult<Option<Contribution>> {
        let row = sqlx::query(
            r#"SELECT id, campaign_address, donor_address, contributed_wei::text, refunded_wei::text, created_at, updated_at
               FROM contributions WHERE campaign_address = $1 AND donor_address = $2"#,
        )
        .bind(campaign.to_string())
        .bind(donor.to_string())
        .fetch_optional(&mut **self.tx())
        .await?;
        row.map(row_to_contribution).transpose()
    }

    async fn upsert_campaign_created(&mut self, campaign: Campaign) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns
                (address, factory_address, creator_address, goal_wei, deadline_ts, cid,
                 status, total_raised_wei, withdrawn, withdrawn_amount_wei, created_at, updated_at)
            VALUES ($1, $2, $3, $4::numeric, $5, $6, $7, 0, false, NULL, now(), now())
            ON CONFLICT (address) DO UPDATE SET
                factory_address = EXCLUDED.factory_address,
                creator_address = EXCLUDED.creator_address,
                goal_wei = EXCLUDED.goal_wei,
                deadline_ts = EXCLUDED.deadline_ts,
                cid = EXCLUDED.cid,
                status = 'ACTIVE',
                updated_at = now()
            WHERE campaigns.status NOT IN ('SUCCESS', 'WITHDRAWN')
            "#,
        )
        .bind(campaign.address.to_string())
        .bind(campaign.factory_address.to_string())
        .bind(campaign.creator_address.to_string())
        .bind(campaign.goal_wei.to_string())
        .bind(campaign.deadline_ts)
        .bind(campaign.cid)
        .bind(status_str(campaign.status))
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn insert_event(
        &mut self,
        chain_id: u64,
        tx_hash: &str,
        log_index: u64,
        block_number: u64,
        block_hash: &str,
        address: Option<Address>,
        event_name: &str,
        event_data: &BTreeMap<String, ArgValue>,
    ) -> StoreResult<InsertOutcome> {
        let data_json = serde_json::to_value(event_data)
            .map_err(|e| StoreError::OutOfRange(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO events
                (chain_id, tx_hash, log_index, block_number, block_hash, address, event_name, event_data, removed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, now())
            ON CONFLICT (chain_id, tx_hash, log_index) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(chain_id as i64)
        .bind(tx_hash)
        .bind(log_index as i64)
        .bind(block_number as i64)
        .bind(block_hash)
        .bind(address.map(|a| a.to_string()))
        .bind(event_name)
        .bind(data_json)
        .fetch_optional(&mut **self.tx())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("events_chain_id_fkey") => {
                StoreError::UnknownChain(chain_id)
            }
            sqlx::Error::Database(db) if db.constraint() == Some("events_address_fkey") => {
                StoreError::UnknownCampaign(address.map(|a| a.to_string()).unwrap_or_default())
            }
            _ => StoreError::Sql(e),
        })?;

        match result {
            Some(row) => Ok(InsertOutcome::Inserted(row.get("id"))),
            None => Ok(InsertOutcome::Duplicate),
        }
    }

    async fn apply_donation_received(
        &mut self,
        campaign: Address,
        donor: Address,
        amount: u128,
        new_total_raised: u128,
    ) -> StoreResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE campaigns
            SET total_raised_wei = $2::numeric,
                status = CASE WHEN status = 'ACTIVE' AND $2::numeric >= goal_wei THEN 'SUCCESS' ELSE status END,
                updated_at = now()
            WHERE address = $1
            "#,
        )
        .bind(campaign.to_string())
        .bind(new_total_raised.to_string())
        .execute(&mut **self.tx())
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(()); // unknown campaign: warn-and-drop is the caller's job
        }

        sqlx::query(
            r#"
            INSERT INTO contributions (campaign_address, donor_address, contributed_wei, refunded_wei, created_at, updated_at)
            VALUES ($1, $2, $3::numeric, 0, now(), now())
            ON CONFLICT (campaign_address, donor_address) DO UPDATE SET
                contributed_wei = contributions.contributed_wei + EXCLUDED.contributed_wei,
                updated_at = now()
            "#,
        )
        .bind(campaign.to_string())
        .bind(donor.to_string())
        .bind(amount.to_string())
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn apply_withdrawn(&mut self, campaign: Address, amount: u128) -> StoreResult<()> {
        sqlx::query(
            r#"UPDATE campaigns SET withdrawn = true, withdrawn_amount_wei = $2::numeric, status = 'WITHDRAWN', updated_at = now()
               WHERE address = $1"#,
        )
        .bind(campaign.to_string())
        .bind(amount.to_string())
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn apply_refunded(&mut self, campaign: Address, donor: Address, amount: u128) -> StoreResult<()> {
        sqlx::query(
            r#"UPDATE contributions SET refunded_wei = refunded_wei + $3::numeric, updated_at = now()
               WHERE campaign_address = $1 AND donor_address = $2"#,
        )
        .bind(campaign.to_string())
        .bind(donor.to_string())
        .bind(amount.to_string())
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn mark_events_removed(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Address>> {
        let rows = sqlx::query(
            r#"
            WITH removed AS (
                UPDATE events SET removed = true
                WHERE chain_id = $1 AND block_number BETWEEN $2 AND $3 AND removed = false AND address IS NOT NULL
                RETURNING address
            )
            SELECT DISTINCT address FROM removed
            "#,
        )
        .bind(chain_id as i64)
        .bind(from as i64)
        .bind(to as i64)
        .fetch_all(&mut **self.tx())
        .await?;

        rows.into_iter()
            .map(|row| {
                let addr: String = row.get("address");
                Address::parse(&addr).map_err(|e| StoreError::OutOfRange(e.to_string()))
            })
            .collect()
    }

    async fn reset_campaign_for_rollback(&mut self, address: Address) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                total_raised_wei = 0,
                withdrawn = false,
                withdrawn_amount_wei = NULL,
                status = CASE WHEN status = 'WITHDRAWN' THEN status ELSE 'ACTIVE' END,
                updated_at = now()
            WHERE address = $1
            "#,
        )
        .bind(address.to_string())
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn reset_contributions_for_campaign(&mut self, campaign: Address) -> StoreResult<()> {
        sqlx::query(
            "UPDATE contributions SET contributed_wei = 0, refunded_wei = 0, updated_at = now() WHERE campaign_address = $1",
        )
        .bind(campaign.to_string())
        .execute(&mut **self.tx())
        .await?;
        Ok(())
    }

    async fn surviving_events_in_range(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT id, chain_id, tx_hash, log_index, block_number, block_hash, address, event_name, event_data, removed, created_at
            FROM events
            WHERE chain_id = $1 AND block_number BETWEEN $2 AND $3 AND removed = false
            ORDER BY block_number ASC, log_index ASC
            "#,
        )
        .bind(chain_id as i64)
        .bind(from as i64)
        .bind(to as i64)
        .fetch_all(&mut **self.tx())
        .await?;

        rows.into_iter().map(row_to_event).collect()
    }

    async fn expired_underfunded_campaigns(&mut self, now: DateTime<Utc>) -> StoreResult<Vec<Address>> {
        let rows = sqlx::query(
            r#"
            SELECT address FROM campaigns
            WHERE status = 'ACTIVE' AND withdrawn = false AND deadline_ts < $1
              AND total_raised_wei < goal_wei
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(&mut **self.tx())
        .await?;

        rows.into_iter()
            .map(|row| {
                let addr: String = row.get("address");
                Address::parse(&addr).map_err(|e| StoreError::OutOfRange(e.to_string()))
            })
            .collect()
    }

    async fn mark_campaign_failed(&mut self, address: Address) -> StoreResult<()> {
        sqlx::query("UPDATE campaigns SET status = 'FAILED', updated_at = now() WHERE address = $1")
            .bind(address.to_string())
            .execute(&mut **self.tx())
            .await?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.tx.take().expect("used once").commit().await?;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.tx.take().expect("used once").rollback().await?;
        Ok(())
    }
}

fn row_to_campaign(row: sqlx::postgres::PgRow) -> Campaign {
    let goal_wei: String = row.get("goal_wei");
    let total_raised_wei: String = row.get("total_raised_wei");
    let withdrawn_amount_wei: Option<String> = row.get("withdrawn_amount_wei");
    let status: String = row.get("status");
    Campaign {
        address: Address::parse(&row.get::<String, _>("address")).expect("stored address is valid"),
        factory_address: Address::parse(&row.get::<String, _>("factory_address"))
            .expect("stored address is valid"),
        creator_address: Address::parse(&row.get::<String, _>("creator_address"))
            .expect("stored address is valid"),
        goal_wei: goal_wei.parse().unwrap_or(0),
        deadline_ts: row.get("deadline_ts"),
        cid: row.get("cid"),
        status: status_from_str(&status),
        total_raised_wei: total_raised_wei.parse().unwrap_or(0),
        withdrawn: row.get("withdrawn"),
        withdrawn_amount_wei: withdrawn_amount_wei.and_then(|s| s.parse().ok()),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_contribution(row: sqlx::postgres::PgRow) -> StoreResult<Contribution> {
    let contributed_wei: String = row.get("contributed_wei");
    let refunded_wei: String = row.get("refunded_wei");
    Ok(Contribution {
        id: row.get("id"),
        campaign_address: Address::parse(&row.get::<String, _>("campaign_address"))
            .map_err(|e| StoreError::OutOfRange(e.to_string()))?,
        donor_address: Address::parse(&row.get::<String, _>("donor_address"))
            .map_err(|e| StoreError::OutOfRange(e.to_string()))?,
        contributed_wei: contributed_wei.parse().unwrap_or(0),
        refunded_wei: refunded_wei.parse().unwrap_or(0),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_event(row: sqlx::postgres::PgRow) -> StoreResult<Event> {
    let event_data_json: serde_json::Value = row.get("event_data");
    let event_data: BTreeMap<String, ArgValue> =
        serde_json::from_value(event_data_json).map_err(|e| StoreError::OutOfRange(e.to_string()))?;
    let address: Option<String> = row.get("address");
    Ok(Event {
        id: row.get("id"),
        chain_id: row.get::<i64, _>("chain_id") as u64,
        tx_hash: row.get("tx_hash"),
        log_index: row.get::<i64, _>("log_index") as u64,
        block_number: row.get::<i64, _>("block_number") as u64,
        block_hash: row.get("block_hash"),
        address: address
            .map(|a| Address::parse(&a))
            .transpose()
            .map_err(|e| StoreError::OutOfRange(e.to_string()))?,
        event_name: row.get("event_name"),
        event_data,
        removed: row.get("removed"),
        created_at: row.get("created_at"),
    })
}
