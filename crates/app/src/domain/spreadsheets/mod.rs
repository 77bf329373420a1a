//! Spreadsheets

pub mod batch;
pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod service;
pub mod values;

pub use errors::SpreadsheetsServiceError;
pub use service::*;
