//! Subscription Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{UnknownVariant, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Subscription UUID
pub type SubscriptionUuid = TypedUuid<SubscriptionRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Cancelled and expired subscriptions never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(UnknownVariant::new("subscription status", value)),
        }
    }
}

/// Subscription Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub uuid: SubscriptionUuid,
    pub tenant: TenantUuid,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
