//! Extension traits

mod depot;
mod query;
mod result;
mod timestamp;

pub(crate) use depot::DepotExt as _;
pub(crate) use query::ListQuery;
pub(crate) use result::ResultExt as _;
pub(crate) use timestamp::{parse_optional_timestamp, parse_timestamp};
