//! Authentication

mod errors;
pub(crate) mod login;
pub(crate) mod middleware;
mod models;
pub(crate) mod register;
