//! Audit service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    auth::Claims,
    database::Db,
    domain::audit::{
        data::AuditFilter, errors::AuditServiceError, records::AuditRecord,
        repository::PgAuditRepository,
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgAuditService {
    db: Db,
    repository: PgAuditRepository,
}

impl PgAuditService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAuditRepository::new(),
        }
    }
}

#[async_trait]
impl AuditService for PgAuditService {
    #[tracing::instrument(
        name = "audit.service.list_audit_records",
        skip(self, claims, filter, page),
        fields(tenant_uuid = %claims.tenant),
        err
    )]
    async fn list_audit_records(
        &self,
        claims: &Claims,
        filter: AuditFilter,
        page: PageRequest,
    ) -> Result<Page<AuditRecord>, AuditServiceError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from >= to
        {
            return Err(AuditServiceError::InvalidRange);
        }

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (records, total) = self
            .repository
            .list(&mut tx, claims.tenant, &filter, &page)
            .await?;

        tx.commit().await?;

        Ok(Page::new(records, &page, total))
    }
}

#[automock]
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Lists the caller tenant's audit records, newest first.
    async fn list_audit_records(
        &self,
        claims: &Claims,
        filter: AuditFilter,
        page: PageRequest,
    ) -> Result<Page<AuditRecord>, AuditServiceError>;
}
