//! Audit Log

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::AuditServiceError;
pub(crate) use repository::PgAuditRepository;
pub use service::*;
