//! Audit Log

mod errors;
pub(crate) mod index;
mod models;
