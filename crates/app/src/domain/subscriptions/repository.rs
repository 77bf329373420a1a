//! Subscriptions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    domain::{
        parse_column,
        subscriptions::{
            data::{NewSubscription, SubscriptionUpdate},
            records::{SubscriptionRecord, SubscriptionStatus, SubscriptionUuid},
        },
        tenants::records::TenantUuid,
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_SUBSCRIPTION_SQL: &str = include_str!("sql/create_subscription.sql");
const GET_SUBSCRIPTION_SQL: &str = include_str!("sql/get_subscription.sql");
const LOCK_SUBSCRIPTION_SQL: &str = include_str!("sql/lock_subscription.sql");
const FIND_ACTIVE_SUBSCRIPTION_SQL: &str = include_str!("sql/find_active_subscription.sql");
const LIST_SUBSCRIPTIONS_SQL: &str = include_str!("sql/list_subscriptions.sql");
const COUNT_SUBSCRIPTIONS_SQL: &str = include_str!("sql/count_subscriptions.sql");
const UPDATE_SUBSCRIPTION_SQL: &str = include_str!("sql/update_subscription.sql");
const EXPIRE_LAPSED_SUBSCRIPTIONS_SQL: &str = include_str!("sql/expire_lapsed_subscriptions.sql");
const CANCEL_ACTIVE_SUBSCRIPTION_SQL: &str = include_str!("sql/cancel_active_subscription.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("plan", "plan"),
    ("status", "status"),
    ("periodStart", "period_start"),
    ("period_start", "period_start"),
    ("periodEnd", "period_end"),
    ("period_end", "period_end"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
];

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSubscriptionsRepository;

impl PgSubscriptionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        subscription: NewSubscription,
    ) -> Result<SubscriptionRecord, sqlx::Error> {
        query_as::<Postgres, SubscriptionRecord>(CREATE_SUBSCRIPTION_SQL)
            .bind(SubscriptionUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(subscription.plan.trim())
            .bind(SqlxTimestamp::from(subscription.period_start))
            .bind(SqlxTimestamp::from(subscription.period_end))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, sqlx::Error> {
        query_as::<Postgres, SubscriptionRecord>(GET_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .bind(subscription.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, sqlx::Error> {
        query_as::<Postgres, SubscriptionRecord>(LOCK_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .bind(subscription.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// The tenant's active subscription, locked.
    pub(crate) async fn find_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<Option<SubscriptionRecord>, sqlx::Error> {
        query_as::<Postgres, SubscriptionRecord>(FIND_ACTIVE_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_subscriptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        page: &PageRequest,
    ) -> Result<(Vec<SubscriptionRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("created_at", SortOrder::Desc), "uuid");
        let sql = format!("{LIST_SUBSCRIPTIONS_SQL}ORDER BY {order}\nLIMIT $3 OFFSET $4");

        let subscriptions = query_as::<Postgres, SubscriptionRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_SUBSCRIPTIONS_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok((subscriptions, total))
    }

    pub(crate) async fn update_subscription(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        subscription: SubscriptionUuid,
        update: SubscriptionUpdate,
    ) -> Result<SubscriptionRecord, sqlx::Error> {
        query_as::<Postgres, SubscriptionRecord>(UPDATE_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .bind(subscription.into_uuid())
            .bind(update.plan.as_deref().map(str::trim))
            .bind(update.status.map(SubscriptionStatus::as_str))
            .bind(update.period_start.map(SqlxTimestamp::from))
            .bind(update.period_end.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    /// Move active subscriptions whose period has ended to `expired`.
    pub(crate) async fn expire_lapsed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<Vec<SubscriptionUuid>, sqlx::Error> {
        let expired: Vec<Uuid> = query_scalar(EXPIRE_LAPSED_SUBSCRIPTIONS_SQL)
            .bind(tenant.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(expired.into_iter().map(SubscriptionUuid::from_uuid).collect())
    }

    /// Cancel the tenant's active subscription, if any.
    pub(crate) async fn cancel_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CANCEL_ACTIVE_SUBSCRIPTION_SQL)
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for SubscriptionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SubscriptionUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            plan: row.try_get("plan")?,
            status: parse_column(row, "status")?,
            period_start: row.try_get::<SqlxTimestamp, _>("period_start")?.to_jiff(),
            period_end: row.try_get::<SqlxTimestamp, _>("period_end")?.to_jiff(),
            cancelled_at: row
                .try_get::<Option<SqlxTimestamp>, _>("cancelled_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
