//! Database Instance Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{domain::databases::records::DatabaseRecord, pagination::Page};

/// Connection Details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct ConnectionResponse {
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Database Instance Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DatabaseResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub engine: String,
    pub size_class: String,

    /// `provisioning`, `ready`, `scaling`, `error` or `deleted`
    pub status: String,

    /// Present once the instance is ready.
    pub connection: Option<ConnectionResponse>,

    pub created_at: String,
    pub updated_at: String,
}

impl From<DatabaseRecord> for DatabaseResponse {
    fn from(database: DatabaseRecord) -> Self {
        let connection = match (database.host, database.port, database.database_name) {
            (Some(host), Some(port), Some(name)) => Some(ConnectionResponse {
                host,
                port,
                database: name,
            }),
            _ => None,
        };

        DatabaseResponse {
            id: database.uuid.into_uuid(),
            tenant_id: database.tenant.into_uuid(),
            name: database.name,
            engine: database.engine.as_str().to_string(),
            size_class: database.size_class.as_str().to_string(),
            status: database.status.as_str().to_string(),
            connection,
            created_at: database.created_at.to_string(),
            updated_at: database.updated_at.to_string(),
        }
    }
}

/// Database Instance List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DatabasesResponse {
    pub items: Vec<DatabaseResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<DatabaseRecord>> for DatabasesResponse {
    fn from(page: Page<DatabaseRecord>) -> Self {
        DatabasesResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
