//! Timestamp parsing for request fields.

use jiff::Timestamp;
use salvo::http::StatusError;

use super::result::ResultExt as _;

/// Parse an RFC 3339 instant supplied in `field`.
pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp, StatusError> {
    value
        .parse::<Timestamp>()
        .or_400(&format!("Invalid timestamp for `{field}`"))
}

/// [`parse_timestamp`] over an optional field.
pub(crate) fn parse_optional_timestamp(
    field: &str,
    value: Option<&str>,
) -> Result<Option<Timestamp>, StatusError> {
    value.map(|value| parse_timestamp(field, value)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rfc3339_instants() {
        assert_eq!(
            parse_timestamp("from", "2026-01-01T00:00:00Z")
                .ok()
                .map(Timestamp::as_second),
            Some(1_767_225_600)
        );
    }

    #[test]
    fn names_the_field_on_error() {
        let error = parse_timestamp("expiresAt", "next tuesday").expect_err("rejected");

        assert_eq!(error.code.as_u16(), 400);
        assert!(error.brief.contains("expiresAt"));
    }

    #[test]
    fn absent_value_is_none() {
        assert!(matches!(parse_optional_timestamp("to", None), Ok(None)));
    }
}
