//! Audit Log Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use nexus_app::{auth::permissions::AUDIT_READ, domain::audit::data::AuditFilter};

use crate::{
    audit::{errors::into_status_error, models::AuditRecordsResponse},
    extensions::*,
    state::State,
};

/// Audit filters, alongside the usual paging parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditQuery {
    #[serde(alias = "userId")]
    actor: Option<Uuid>,
    action: Option<String>,
    target_kind: Option<String>,
    target_id: Option<Uuid>,
    from: Option<String>,
    to: Option<String>,
}

impl AuditQuery {
    fn from_request(req: &mut Request) -> Result<Self, StatusError> {
        req.parse_queries::<Self>().or_400("Invalid audit filter")
    }

    fn into_filter(self) -> Result<AuditFilter, StatusError> {
        Ok(AuditFilter {
            actor: self.actor.map(Into::into),
            action: self.action.filter(|action| !action.is_empty()),
            target_kind: self.target_kind.filter(|kind| !kind.is_empty()),
            target_uuid: self.target_id,
            from: parse_optional_timestamp("from", self.from.as_deref())?,
            to: parse_optional_timestamp("to", self.to.as_deref())?,
        })
    }
}

/// Audit Log Handler
///
/// Newest first. `from` is inclusive and `to` exclusive.
#[endpoint(
    tags("audit"),
    summary = "List Audit Records",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Audit records listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing audit.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<AuditRecordsResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let filter = AuditQuery::from_request(req)?.into_filter()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(AUDIT_READ)?;

    let records = state
        .app
        .audit
        .list_audit_records(claims, filter, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(records.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::{
        domain::audit::{
            AuditServiceError,
            records::{AuditRecord, AuditRecordUuid},
        },
        pagination::Page,
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TEST_USER_UUID, TestApp};

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.service(&["audit.read"], Router::with_path("audit-logs").get(handler))
    }

    fn make_record(target: Uuid) -> AuditRecord {
        AuditRecord {
            uuid: AuditRecordUuid::new(),
            tenant: TEST_TENANT_UUID,
            actor: Some(TEST_USER_UUID),
            action: "user.create".to_string(),
            target_kind: "user".to_string(),
            target_uuid: target,
            metadata: json!({ "email": "bob@t.example" }),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn test_filters_are_passed_through() -> TestResult {
        let target = Uuid::now_v7();

        let mut app = TestApp::default();

        app.audit
            .expect_list_audit_records()
            .once()
            .withf(move |_, filter, page| {
                filter.actor == Some(TEST_USER_UUID)
                    && filter.action.as_deref() == Some("user.create")
                    && filter.target_kind.as_deref() == Some("user")
                    && filter.target_uuid == Some(target)
                    && filter.from.map(Timestamp::as_second) == Some(1_767_225_600)
                    && filter.to.is_none()
                    && page.page_size == 10
            })
            .return_once(move |_, _, page| Ok(Page::new(vec![make_record(target)], &page, 1)));

        let mut res = TestClient::get(format!(
            "http://example.com/audit-logs?actor={TEST_USER_UUID}&action=user.create\
             &targetKind=user&targetId={target}&from=2026-01-01T00:00:00Z&pageSize=10"
        ))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: AuditRecordsResponse = res.take_json().await?;
        let record = body.items.first();

        assert_eq!(record.map(|r| r.target_id), Some(target));
        assert_eq!(
            record.and_then(|r| r.user_id),
            Some(TEST_USER_UUID.into_uuid())
        );
        assert_eq!(
            record.map(|r| r.metadata.clone()),
            Some(json!({ "email": "bob@t.example" }))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_range_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.audit
            .expect_list_audit_records()
            .once()
            .return_once(|_, _, _| Err(AuditServiceError::InvalidRange));

        let res = TestClient::get(
            "http://example.com/audit-logs?from=2026-02-01T00:00:00Z&to=2026-01-01T00:00:00Z",
        )
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_actor_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.audit.expect_list_audit_records().never();

        let res = TestClient::get("http://example.com/audit-logs?actor=someone")
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_requires_audit_read() -> TestResult {
        let mut app = TestApp::default();

        app.audit.expect_list_audit_records().never();

        let res = TestClient::get("http://example.com/audit-logs")
            .send(&app.service(&["user.read"], Router::with_path("audit-logs").get(handler)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
