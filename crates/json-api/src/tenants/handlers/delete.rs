//! Delete Tenant Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{auth::permissions::TENANT_DELETE, domain::tenants::data::TenantDeletion};

use crate::{extensions::*, state::State, tenants::errors::into_status_error};

/// Tenant Deleted Response
///
/// Rows affected by the cascade.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TenantDeletedResponse {
    pub users: u64,
    pub api_keys: u64,
    pub databases: u64,
    pub subscriptions: u64,
}

impl From<TenantDeletion> for TenantDeletedResponse {
    fn from(deletion: TenantDeletion) -> Self {
        TenantDeletedResponse {
            users: deletion.users,
            api_keys: deletion.api_keys,
            databases: deletion.databases,
            subscriptions: deletion.subscriptions,
        }
    }
}

/// Delete Tenant Handler
///
/// Soft-deletes the tenant, its users, keys, databases and active subscription.
#[endpoint(
    tags("tenants"),
    summary = "Delete Tenant",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Tenant deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Tenant not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<TenantDeletedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(TENANT_DELETE)?;

    let deletion = state
        .app
        .tenants
        .delete_tenant(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(deletion.into()))
}
