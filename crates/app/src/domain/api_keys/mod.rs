//! API Keys

pub mod data;
pub mod errors;
pub mod key;
pub mod records;
mod repository;
pub mod service;

pub use errors::ApiKeysServiceError;
pub(crate) use repository::PgApiKeysRepository;
pub use service::*;
