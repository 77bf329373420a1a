//! Subscription Models

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{domain::subscriptions::records::SubscriptionRecord, pagination::Page};

/// Subscription Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubscriptionResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan: String,

    /// `active`, `cancelled` or `expired`
    pub status: String,

    pub period_start: String,
    pub period_end: String,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubscriptionRecord> for SubscriptionResponse {
    fn from(subscription: SubscriptionRecord) -> Self {
        SubscriptionResponse {
            id: subscription.uuid.into_uuid(),
            tenant_id: subscription.tenant.into_uuid(),
            plan: subscription.plan,
            status: subscription.status.to_string(),
            period_start: subscription.period_start.to_string(),
            period_end: subscription.period_end.to_string(),
            cancelled_at: subscription.cancelled_at.as_ref().map(ToString::to_string),
            created_at: subscription.created_at.to_string(),
            updated_at: subscription.updated_at.to_string(),
        }
    }
}

/// Subscription List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SubscriptionsResponse {
    pub items: Vec<SubscriptionResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<SubscriptionRecord>> for SubscriptionsResponse {
    fn from(page: Page<SubscriptionRecord>) -> Self {
        SubscriptionsResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
