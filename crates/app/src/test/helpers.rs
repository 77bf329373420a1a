//! Test Helpers

use jiff::{SignedDuration, Timestamp};

use crate::{
    auth::{Claims, Permissions},
    domain::tenants::data::{NewRegistration, Registration},
};

/// Password satisfying the default policy.
pub(crate) const TEST_PASSWORD: &str = "Corr3ct-Horse!";

pub(crate) fn registration(tenant_name: &str, email: &str) -> NewRegistration {
    NewRegistration {
        tenant_name: tenant_name.to_string(),
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        display_name: "Owner".to_string(),
    }
}

/// Claims the token manager would issue for a fresh registration.
pub(crate) fn claims_for(registration: &Registration) -> Claims {
    let now = Timestamp::now();

    Claims {
        subject: registration.user.uuid,
        tenant: registration.tenant.uuid,
        email: registration.user.email.clone(),
        permissions: registration.permissions.clone(),
        issued_at: now,
        expires_at: now + SignedDuration::from_hours(1),
    }
}

/// The same caller restricted to `permissions`.
pub(crate) fn restrict(claims: &Claims, permissions: &[&str]) -> Claims {
    Claims {
        permissions: permissions.iter().copied().collect::<Permissions>(),
        ..claims.clone()
    }
}
