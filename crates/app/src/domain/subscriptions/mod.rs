//! Subscriptions

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::SubscriptionsServiceError;
pub(crate) use repository::PgSubscriptionsRepository;
pub use service::*;
