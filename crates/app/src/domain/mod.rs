//! Nexus Domain Concerns

use std::str::FromStr;

use sqlx::{Row, postgres::PgRow};
use thiserror::Error;

pub mod api_keys;
pub mod audit;
pub mod databases;
pub mod roles;
pub mod spreadsheets;
pub mod subscriptions;
pub mod tenants;
pub mod users;

/// A stored or submitted enum value that is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Decode a text column into a closed enum.
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let value: String = row.try_get(column)?;

    value.parse().map_err(|error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    })
}

/// Decode a non-negative `INTEGER` column.
pub(crate) fn unsigned_column(row: &PgRow, column: &str) -> sqlx::Result<u32> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    })
}

/// Encode an unsigned value for an `INTEGER` column.
pub(crate) fn to_sql_int(value: u32) -> sqlx::Result<i32> {
    i32::try_from(value).map_err(|error| sqlx::Error::Encode(Box::new(error)))
}
