//! Subscriptions service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    auth::Claims,
    database::Db,
    domain::{
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        subscriptions::{
            data::{NewSubscription, SubscriptionUpdate},
            errors::SubscriptionsServiceError,
            records::{SubscriptionRecord, SubscriptionStatus, SubscriptionUuid},
            repository::PgSubscriptionsRepository,
        },
        tenants::records::TenantUuid,
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgSubscriptionsService {
    db: Db,
    repository: PgSubscriptionsRepository,
    audit: PgAuditRepository,
}

impl PgSubscriptionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSubscriptionsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    /// Expire lapsed subscriptions, recording a system event for each.
    async fn expire_lapsed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<usize, SubscriptionsServiceError> {
        let expired = self.repository.expire_lapsed(tx, tenant).await?;

        for subscription in &expired {
            self.audit
                .record(
                    tx,
                    tenant,
                    NewAuditEntry::system(AuditAction::SubscriptionExpire, *subscription),
                )
                .await?;
        }

        Ok(expired.len())
    }
}

fn check_period(start: Timestamp, end: Timestamp) -> Result<(), SubscriptionsServiceError> {
    if end > start {
        Ok(())
    } else {
        Err(SubscriptionsServiceError::InvalidPeriod)
    }
}

#[async_trait]
impl SubscriptionsService for PgSubscriptionsService {
    #[tracing::instrument(
        name = "subscriptions.service.create_subscription",
        skip(self, claims, subscription),
        fields(tenant_uuid = %claims.tenant),
        err
    )]
    async fn create_subscription(
        &self,
        claims: &Claims,
        subscription: NewSubscription,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError> {
        check_period(subscription.period_start, subscription.period_end)?;

        if subscription.period_end <= Timestamp::now() {
            return Err(SubscriptionsServiceError::InvalidPeriod);
        }

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let expired = self.expire_lapsed(&mut tx, claims.tenant).await?;

        if self.repository.find_active(&mut tx, claims.tenant).await?.is_some() {
            return Err(SubscriptionsServiceError::AlreadyActive);
        }

        let created = self
            .repository
            .create_subscription(&mut tx, claims.tenant, subscription)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SubscriptionCreate, created.uuid)
                    .with_metadata(json!({
                        "plan": created.plan,
                        "period_start": created.period_start,
                        "period_end": created.period_end,
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(subscription_uuid = %created.uuid, expired, "created subscription");

        Ok(created)
    }

    async fn get_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let subscription = self
            .repository
            .get_subscription(&mut tx, claims.tenant, subscription)
            .await?;

        tx.commit().await?;

        Ok(subscription)
    }

    async fn list_subscriptions(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<SubscriptionRecord>, SubscriptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (subscriptions, total) = self
            .repository
            .list_subscriptions(&mut tx, claims.tenant, &page)
            .await?;

        tx.commit().await?;

        Ok(Page::new(subscriptions, &page, total))
    }

    #[tracing::instrument(
        name = "subscriptions.service.update_subscription",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, subscription_uuid = %subscription),
        err
    )]
    async fn update_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
        update: SubscriptionUpdate,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .repository
            .lock_subscription(&mut tx, claims.tenant, subscription)
            .await?;

        if current.status.is_terminal() {
            return Err(SubscriptionsServiceError::InvalidTransition);
        }

        let (start, end) = update.resulting_period(&current);

        check_period(start, end)?;

        let changed_fields = update.changed_fields();
        let action = if update.status == Some(SubscriptionStatus::Cancelled) {
            AuditAction::SubscriptionCancel
        } else {
            AuditAction::SubscriptionUpdate
        };

        let updated = self
            .repository
            .update_subscription(&mut tx, claims.tenant, subscription, update)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, action, subscription).with_metadata(json!({
                    "fields": changed_fields,
                    "status": updated.status.as_str(),
                })),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "subscriptions.service.cancel_subscription",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, subscription_uuid = %subscription),
        err
    )]
    async fn cancel_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .repository
            .lock_subscription(&mut tx, claims.tenant, subscription)
            .await?;

        if current.status != SubscriptionStatus::Active {
            return Err(SubscriptionsServiceError::NotActive);
        }

        let cancelled = self
            .repository
            .update_subscription(
                &mut tx,
                claims.tenant,
                subscription,
                SubscriptionUpdate {
                    status: Some(SubscriptionStatus::Cancelled),
                    ..SubscriptionUpdate::default()
                },
            )
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::SubscriptionCancel, subscription)
                    .with_metadata(json!({ "plan": cancelled.plan })),
            )
            .await?;

        tx.commit().await?;

        info!(subscription_uuid = %subscription, "cancelled subscription");

        Ok(cancelled)
    }
}

#[automock]
#[async_trait]
pub trait SubscriptionsService: Send + Sync {
    /// Starts a subscription; at most one may be active per tenant.
    async fn create_subscription(
        &self,
        claims: &Claims,
        subscription: NewSubscription,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError>;

    async fn get_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError>;

    async fn list_subscriptions(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<SubscriptionRecord>, SubscriptionsServiceError>;

    async fn update_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
        update: SubscriptionUpdate,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError>;

    async fn cancel_subscription(
        &self,
        claims: &Claims,
        subscription: SubscriptionUuid,
    ) -> Result<SubscriptionRecord, SubscriptionsServiceError>;
}
