//! Subscription Data

use jiff::Timestamp;

use crate::domain::subscriptions::records::{SubscriptionRecord, SubscriptionStatus};

/// New Subscription Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub plan: String,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
}

/// Subscription Update Data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub period_start: Option<Timestamp>,
    pub period_end: Option<Timestamp>,
}

impl SubscriptionUpdate {
    /// The billing period after applying this update to `current`.
    pub(crate) fn resulting_period(&self, current: &SubscriptionRecord) -> (Timestamp, Timestamp) {
        (
            self.period_start.unwrap_or(current.period_start),
            self.period_end.unwrap_or(current.period_end),
        )
    }

    pub(crate) fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("plan", self.plan.is_some()),
            ("status", self.status.is_some()),
            ("period_start", self.period_start.is_some()),
            ("period_end", self.period_end.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}
