//! Database Instance Data

use crate::domain::databases::records::{DatabaseEngine, DatabaseStatus, SizeClass};

/// New Database Instance Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDatabase {
    pub name: String,
    pub engine: DatabaseEngine,
    pub size_class: SizeClass,
}

/// Where clients reach a ready instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Status report from the provisioning delegate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: DatabaseStatus,
    pub connection: Option<ConnectionInfo>,
}
