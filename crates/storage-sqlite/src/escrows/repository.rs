use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{encode_financials, patch_financials, EscrowDB, NewEscrowDB, SplitRuleDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{commission_split_rules, escrows};
use escrowdesk_core::errors::{Result, ValidationError};
use escrowdesk_core::financials::{
    EscrowFinancialsRepositoryTrait, EscrowRecord, EscrowStatus, FieldUpdate, NewEscrow,
    PersistAck, PersistenceGateway, SplitRule,
};

/// Escrow storage. Also serves as the persistence gateway for field edits.
pub struct EscrowFinancialsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl EscrowFinancialsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        EscrowFinancialsRepository { pool, writer }
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start
        .zip(end)
        .ok_or_else(|| ValidationError::InvalidInput(format!("year {} is out of range", year)).into())
}

#[async_trait]
impl EscrowFinancialsRepositoryTrait for EscrowFinancialsRepository {
    fn get_escrow(&self, escrow_id: &str) -> Result<EscrowRecord> {
        let mut conn = get_connection(&self.pool)?;
        let escrow_db = escrows::table
            .find(escrow_id)
            .select(EscrowDB::as_select())
            .first::<EscrowDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(EscrowRecord::from(escrow_db))
    }

    async fn create_escrow(&self, new_escrow: NewEscrow) -> Result<EscrowRecord> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<EscrowRecord> {
                let now = Utc::now().naive_utc();
                let new_escrow_db = NewEscrowDB {
                    id: new_escrow
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    display_id: new_escrow.display_id,
                    property_address: new_escrow.property_address,
                    escrow_status: EscrowStatus::Active.as_str().to_string(),
                    lead_source: new_escrow.lead_source,
                    closing_date: new_escrow.closing_date,
                    financials: encode_financials(&new_escrow.financials),
                    created_at: now,
                    updated_at: now,
                };

                let result_db = diesel::insert_into(escrows::table)
                    .values(&new_escrow_db)
                    .returning(EscrowDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(EscrowRecord::from(result_db))
            })
            .await
    }

    async fn update_escrow_status(
        &self,
        escrow_id: &str,
        status: EscrowStatus,
        closing_date: Option<NaiveDate>,
    ) -> Result<EscrowRecord> {
        let escrow_id = escrow_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<EscrowRecord> {
                let now = Utc::now().naive_utc();
                let target = escrows::table.find(&escrow_id);
                match closing_date {
                    Some(date) => diesel::update(target)
                        .set((
                            escrows::escrow_status.eq(status.as_str()),
                            escrows::closing_date.eq(Some(date)),
                            escrows::updated_at.eq(now),
                        ))
                        .execute(conn),
                    None => diesel::update(target)
                        .set((
                            escrows::escrow_status.eq(status.as_str()),
                            escrows::updated_at.eq(now),
                        ))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;

                let result_db = escrows::table
                    .find(&escrow_id)
                    .select(EscrowDB::as_select())
                    .first::<EscrowDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(EscrowRecord::from(result_db))
            })
            .await
    }

    fn list_closed_escrows(&self, year: i32) -> Result<Vec<EscrowRecord>> {
        let (start, end) = year_bounds(year)?;
        let mut conn = get_connection(&self.pool)?;
        let escrows_db = escrows::table
            .filter(escrows::escrow_status.eq(EscrowStatus::Closed.as_str()))
            .filter(escrows::closing_date.ge(start))
            .filter(escrows::closing_date.le(end))
            .order(escrows::closing_date.asc())
            .select(EscrowDB::as_select())
            .load::<EscrowDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(escrows_db.into_iter().map(EscrowRecord::from).collect())
    }

    fn get_split_rules(&self, year: i32) -> Result<Vec<SplitRule>> {
        let mut conn = get_connection(&self.pool)?;
        let rules_db = commission_split_rules::table
            .filter(commission_split_rules::effective_year.eq(year))
            .order(commission_split_rules::id.asc())
            .select(SplitRuleDB::as_select())
            .load::<SplitRuleDB>(&mut conn)
            .map_err(StorageError::from)?;

        rules_db
            .into_iter()
            .map(|db| SplitRule::try_from(db).map_err(Into::into))
            .collect()
    }

    async fn save_split_rule(&self, rule: SplitRule) -> Result<SplitRule> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SplitRule> {
                let rule_db = SplitRuleDB::from_domain(rule.clone(), Utc::now().naive_utc());
                diesel::replace_into(commission_split_rules::table)
                    .values(&rule_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(rule)
            })
            .await
    }
}

#[async_trait]
impl PersistenceGateway for EscrowFinancialsRepository {
    /// Writes the single changed field into the escrow's financials column
    /// and drops the stale derived keys, so the next load computes them.
    ///
    /// The backend stores what it is given and does not recompute, so the
    /// acknowledgement carries no server snapshot.
    async fn persist(&self, update: FieldUpdate) -> Result<PersistAck> {
        let field = update.field()?;
        let stale = update.stale_fields()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PersistAck> {
                let raw = escrows::table
                    .find(&update.escrow_id)
                    .select(escrows::financials)
                    .first::<String>(conn)
                    .map_err(StorageError::from)?;

                let patched = patch_financials(&raw, field, update.value, &stale);
                diesel::update(escrows::table.find(&update.escrow_id))
                    .set((
                        escrows::financials.eq(patched),
                        escrows::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                debug!(
                    "Persisted {} = {} on escrow {} ({} stale keys dropped)",
                    update.path,
                    update.value,
                    update.escrow_id,
                    stale.len()
                );
                Ok(PersistAck::accepted())
            })
            .await
    }
}
