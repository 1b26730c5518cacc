//! PostgreSQL implementation of EntitlementStore.
//!
//! One row per user. Each provider slot is a group of columns, so a
//! compare-and-swap is a single-row `UPDATE` guarded by the version.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entitlement::{EntitlementRecord, Plan, ProviderSlot, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{EntitlementStore, StoreError};

pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM entitlements WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;
        Ok(version.map(|v| v as u64).unwrap_or(0))
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    user_id: String,
    web_status: String,
    web_plan: String,
    web_current_period_end: Option<DateTime<Utc>>,
    web_cancel_at_period_end: bool,
    web_customer_id: Option<String>,
    web_subscription_id: Option<String>,
    web_last_applied_at: Option<DateTime<Utc>>,
    mobile_status: String,
    mobile_plan: String,
    mobile_current_period_end: Option<DateTime<Utc>>,
    mobile_cancel_at_period_end: bool,
    mobile_customer_id: Option<String>,
    mobile_subscription_id: Option<String>,
    mobile_last_applied_at: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<EntitlementRow> for EntitlementRecord {
    type Error = StoreError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        let web = slot_from_columns(
            &row.web_status,
            &row.web_plan,
            row.web_current_period_end,
            row.web_cancel_at_period_end,
            row.web_customer_id,
            row.web_subscription_id,
            row.web_last_applied_at,
        )?;
        let mobile = slot_from_columns(
            &row.mobile_status,
            &row.mobile_plan,
            row.mobile_current_period_end,
            row.mobile_cancel_at_period_end,
            row.mobile_customer_id,
            row.mobile_subscription_id,
            row.mobile_last_applied_at,
        )?;
        let user_id = UserId::new(row.user_id).map_err(corrupt)?;
        let version = u64::try_from(row.version)
            .map_err(|_| StoreError::Unavailable(format!("negative version {}", row.version)))?;

        Ok(EntitlementRecord {
            user_id,
            web,
            mobile,
            version,
        })
    }
}

fn slot_from_columns(
    status: &str,
    plan: &str,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    customer_id: Option<String>,
    subscription_id: Option<String>,
    last_applied_at: Option<DateTime<Utc>>,
) -> Result<ProviderSlot, StoreError> {
    Ok(ProviderSlot {
        status: status.parse::<SubscriptionStatus>().map_err(corrupt)?,
        plan: plan.parse::<Plan>().map_err(corrupt)?,
        current_period_end: current_period_end.map(Timestamp::from_datetime),
        cancel_at_period_end,
        external_customer_id: customer_id,
        external_subscription_id: subscription_id,
        last_applied_occurred_at: last_applied_at.map(Timestamp::from_datetime),
    })
}

/// A row that fails to decode is reported as unavailable, never as a default
/// record, so callers fail closed instead of downgrading the user.
fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("corrupt entitlement row: {}", err))
}

fn period_end(slot: &ProviderSlot) -> Option<DateTime<Utc>> {
    slot.current_period_end.map(|t| *t.as_datetime())
}

fn last_applied(slot: &ProviderSlot) -> Option<DateTime<Utc>> {
    slot.last_applied_occurred_at.map(|t| *t.as_datetime())
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn get(&self, user_id: &UserId) -> Result<EntitlementRecord, StoreError> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT user_id,
                   web_status, web_plan, web_current_period_end, web_cancel_at_period_end,
                   web_customer_id, web_subscription_id, web_last_applied_at,
                   mobile_status, mobile_plan, mobile_current_period_end, mobile_cancel_at_period_end,
                   mobile_customer_id, mobile_subscription_id, mobile_last_applied_at,
                   version
            FROM entitlements
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => row.try_into(),
            None => Ok(EntitlementRecord::new(user_id.clone())),
        }
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected_version: u64,
        record: &EntitlementRecord,
    ) -> Result<(), StoreError> {
        let web = &record.web;
        let mobile = &record.mobile;

        let query = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO entitlements (
                    user_id,
                    web_status, web_plan, web_current_period_end, web_cancel_at_period_end,
                    web_customer_id, web_subscription_id, web_last_applied_at,
                    mobile_status, mobile_plan, mobile_current_period_end, mobile_cancel_at_period_end,
                    mobile_customer_id, mobile_subscription_id, mobile_last_applied_at,
                    version, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW())
                ON CONFLICT (user_id) DO NOTHING
                "#,
            )
        } else {
            sqlx::query(
                r#"
                UPDATE entitlements SET
                    web_status = $2, web_plan = $3, web_current_period_end = $4,
                    web_cancel_at_period_end = $5, web_customer_id = $6,
                    web_subscription_id = $7, web_last_applied_at = $8,
                    mobile_status = $9, mobile_plan = $10, mobile_current_period_end = $11,
                    mobile_cancel_at_period_end = $12, mobile_customer_id = $13,
                    mobile_subscription_id = $14, mobile_last_applied_at = $15,
                    version = $16, updated_at = NOW()
                WHERE user_id = $1 AND version = $17
                "#,
            )
        };

        let result = query
            .bind(user_id.as_str())
            .bind(web.status.as_str())
            .bind(web.plan.as_str())
            .bind(period_end(web))
            .bind(web.cancel_at_period_end)
            .bind(web.external_customer_id.as_deref())
            .bind(web.external_subscription_id.as_deref())
            .bind(last_applied(web))
            .bind(mobile.status.as_str())
            .bind(mobile.plan.as_str())
            .bind(period_end(mobile))
            .bind(mobile.cancel_at_period_end)
            .bind(mobile.external_customer_id.as_deref())
            .bind(mobile.external_subscription_id.as_deref())
            .bind(last_applied(mobile))
            .bind(record.version as i64)
            .bind(expected_version as i64)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            let actual = self.current_version(user_id).await?;
            tracing::debug!(
                user_id = %user_id,
                expected = expected_version,
                actual,
                "entitlement compare-and-swap lost"
            );
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> EntitlementRow {
        EntitlementRow {
            user_id: "user-1".to_string(),
            web_status: "active".to_string(),
            web_plan: "pro".to_string(),
            web_current_period_end: Timestamp::from_unix_secs(1_700_000_000).map(|t| *t.as_datetime()),
            web_cancel_at_period_end: false,
            web_customer_id: Some("cus_1".to_string()),
            web_subscription_id: Some("sub_1".to_string()),
            web_last_applied_at: None,
            mobile_status: "no_subscription".to_string(),
            mobile_plan: "free".to_string(),
            mobile_current_period_end: None,
            mobile_cancel_at_period_end: false,
            mobile_customer_id: None,
            mobile_subscription_id: None,
            mobile_last_applied_at: None,
            version: 3,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = EntitlementRecord::try_from(row()).unwrap();
        assert_eq!(record.version, 3);
        assert_eq!(record.web.plan, Plan::Pro);
        assert_eq!(record.web.status, SubscriptionStatus::Active);
        assert_eq!(record.web_customer_id(), Some("cus_1"));
        assert_eq!(record.mobile, ProviderSlot::empty());
    }

    #[test]
    fn unknown_status_is_reported_as_unavailable() {
        let mut bad = row();
        bad.web_status = "paused".to_string();
        assert!(matches!(
            EntitlementRecord::try_from(bad),
            Err(StoreError::Unavailable(_))
        ));
    }
}
