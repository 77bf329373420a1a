//! Audit Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    domain::{
        audit::{
            data::{AuditFilter, NewAuditEntry},
            records::{AuditRecord, AuditRecordUuid},
        },
        tenants::records::TenantUuid,
        users::records::UserUuid,
    },
    pagination::PageRequest,
};

const RECORD_AUDIT_SQL: &str = include_str!("sql/record.sql");
const LIST_AUDIT_SQL: &str = include_str!("sql/list.sql");
const COUNT_AUDIT_SQL: &str = include_str!("sql/count.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuditRepository;

impl PgAuditRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Append an entry inside the caller's transaction.
    #[tracing::instrument(
        name = "audit.repository.record",
        skip(self, tx, entry),
        fields(tenant_uuid = %tenant, action = entry.action.as_str()),
        err
    )]
    pub(crate) async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        entry: NewAuditEntry,
    ) -> Result<AuditRecordUuid, sqlx::Error> {
        let uuid = AuditRecordUuid::new();

        query(RECORD_AUDIT_SQL)
            .bind(uuid.into_uuid())
            .bind(tenant.into_uuid())
            .bind(entry.actor.map(UserUuid::into_uuid))
            .bind(entry.action.as_str())
            .bind(entry.action.target().as_str())
            .bind(entry.target_uuid)
            .bind(entry.metadata)
            .execute(&mut **tx)
            .await?;

        Ok(uuid)
    }

    pub(crate) async fn list(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<(Vec<AuditRecord>, i64), sqlx::Error> {
        let actor = filter.actor.map(UserUuid::into_uuid);
        let from = filter.from.map(SqlxTimestamp::from);
        let to = filter.to.map(SqlxTimestamp::from);

        let records = query_as::<Postgres, AuditRecord>(LIST_AUDIT_SQL)
            .bind(tenant.into_uuid())
            .bind(actor)
            .bind(filter.action.as_deref())
            .bind(filter.target_kind.as_deref())
            .bind(filter.target_uuid)
            .bind(from)
            .bind(to)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_AUDIT_SQL)
            .bind(tenant.into_uuid())
            .bind(actor)
            .bind(filter.action.as_deref())
            .bind(filter.target_kind.as_deref())
            .bind(filter.target_uuid)
            .bind(from)
            .bind(to)
            .fetch_one(&mut **tx)
            .await?;

        Ok((records, total))
    }
}

impl<'r> FromRow<'r, PgRow> for AuditRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AuditRecordUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            actor: row
                .try_get::<Option<Uuid>, _>("actor_uuid")?
                .map(UserUuid::from_uuid),
            action: row.try_get("action")?,
            target_kind: row.try_get("target_kind")?,
            target_uuid: row.try_get("target_uuid")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
