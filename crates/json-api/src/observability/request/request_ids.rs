//! Correlation ids carried in `x-request-id`.

use std::fmt;

use salvo::{
    http::header::HeaderValue,
    prelude::{Request, Response},
};
use tracing::warn;
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_LEN: usize = 128;

/// The caller's id when it is short printable ASCII, otherwise a fresh v7 uuid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RequestId(String);

impl RequestId {
    pub(super) fn of(req: &Request) -> Self {
        Self::resolve(req.header::<String>(REQUEST_ID_HEADER).as_deref())
    }

    fn resolve(supplied: Option<&str>) -> Self {
        match supplied.map(str::trim) {
            Some(id) if Self::acceptable(id) => Self(id.to_owned()),
            _ => Self(Uuid::now_v7().to_string()),
        }
    }

    fn acceptable(id: &str) -> bool {
        (1..=MAX_LEN).contains(&id.len()) && id.bytes().all(|byte| byte.is_ascii_graphic())
    }

    /// Echo the id so clients can quote it when reporting failures.
    pub(super) fn echo(&self, res: &mut Response) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => {
                res.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Err(source) => warn!(request_id = %self, "request id is not a valid header value: {source}"),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_supplied_id_is_trimmed_and_kept() {
        assert_eq!(RequestId::resolve(Some(" req-42 ")).to_string(), "req-42");
    }

    #[test]
    fn unusable_ids_are_replaced_with_a_uuid() {
        let oversized = "x".repeat(MAX_LEN + 1);

        for supplied in [None, Some("   "), Some("a b"), Some(oversized.as_str())] {
            let resolved = RequestId::resolve(supplied).to_string();

            assert!(Uuid::parse_str(&resolved).is_ok(), "{supplied:?} became {resolved}");
        }
    }
}
