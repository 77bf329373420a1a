//! Cell Handlers

pub(crate) mod batch;
pub(crate) mod index;
pub(crate) mod update;
