//! Test helpers.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use nexus_app::{
    auth::{Claims, Permissions, TokenManager},
    context::AppContext,
    domain::{
        api_keys::MockApiKeysService, audit::MockAuditService, databases::MockDatabasesService,
        roles::MockRolesService, spreadsheets::MockSpreadsheetsService,
        subscriptions::MockSubscriptionsService,
        tenants::{MockTenantsService, records::TenantUuid},
        users::{MockUsersService, records::UserUuid},
    },
    rate_limit::MockRateLimiter,
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_TENANT_UUID: TenantUuid = TenantUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::from_u128(1));

pub(crate) const TEST_SECRET: &[u8] = b"nexus-test-secret";

pub(crate) fn test_tokens() -> TokenManager {
    TokenManager::new(TEST_SECRET, SignedDuration::from_hours(1))
        .expect("test token manager should build")
}

pub(crate) fn test_claims(permissions: &[&str]) -> Claims {
    Claims {
        subject: TEST_USER_UUID,
        tenant: TEST_TENANT_UUID,
        email: "admin@nexus.test".to_string(),
        permissions: permissions.iter().copied().collect::<Permissions>(),
        issued_at: Timestamp::UNIX_EPOCH,
        expires_at: Timestamp::MAX,
    }
}

/// Places fixed claims in the depot, standing in for the auth middleware.
pub(crate) struct InjectClaims(pub(crate) Claims);

#[handler]
impl InjectClaims {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        depot.insert_claims(self.0.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

/// Service mocks; any left untouched fail the test if called.
#[derive(Default)]
pub(crate) struct TestApp {
    pub(crate) tenants: MockTenantsService,
    pub(crate) users: MockUsersService,
    pub(crate) roles: MockRolesService,
    pub(crate) api_keys: MockApiKeysService,
    pub(crate) databases: MockDatabasesService,
    pub(crate) subscriptions: MockSubscriptionsService,
    pub(crate) audit: MockAuditService,
    pub(crate) spreadsheets: MockSpreadsheetsService,
    pub(crate) rate_limiter: Option<MockRateLimiter>,
}

impl TestApp {
    pub(crate) fn state(self) -> Arc<State> {
        let context = AppContext {
            tenants: Arc::new(self.tenants),
            users: Arc::new(self.users),
            roles: Arc::new(self.roles),
            api_keys: Arc::new(self.api_keys),
            databases: Arc::new(self.databases),
            subscriptions: Arc::new(self.subscriptions),
            audit: Arc::new(self.audit),
            spreadsheets: Arc::new(self.spreadsheets),
            tokens: test_tokens(),
        };

        let rate_limiter = self
            .rate_limiter
            .map(|limiter| Arc::new(limiter) as Arc<dyn nexus_app::rate_limit::RateLimiter>);

        State::shared(context, rate_limiter)
    }

    /// Serve `route` with state injected and no authentication.
    pub(crate) fn anonymous(self, route: Router) -> Service {
        Service::new(Router::new().hoop(inject(self.state())).push(route))
    }

    /// Serve `route` as a caller holding `permissions`.
    pub(crate) fn service(self, permissions: &[&str], route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.state()))
                .hoop(InjectClaims(test_claims(permissions)))
                .push(route),
        )
    }
}
