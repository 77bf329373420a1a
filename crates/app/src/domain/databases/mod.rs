//! Database Instances

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::DatabasesServiceError;
pub(crate) use repository::PgDatabasesRepository;
pub use service::*;
