//! Database Instance Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{UnknownVariant, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// Database Instance UUID
pub type DatabaseUuid = TypedUuid<DatabaseRecord>;

/// Engine backing a managed database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Postgres,
    Mysql,
    Mongodb,
    Redis,
}

impl DatabaseEngine {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "mongodb" => Ok(Self::Mongodb),
            "redis" => Ok(Self::Redis),
            _ => Err(UnknownVariant::new("database engine", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl SizeClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeClass {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::Xlarge),
            _ => Err(UnknownVariant::new("size class", value)),
        }
    }
}

/// Lifecycle of a managed database.
///
/// ```text
/// provisioning -> ready | error
/// ready        -> scaling
/// scaling      -> ready | error
/// error        -> provisioning
/// (any)        -> deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Provisioning,
    Ready,
    Scaling,
    Error,
    Deleted,
}

impl DatabaseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Ready => "ready",
            Self::Scaling => "scaling",
            Self::Error => "error",
            Self::Deleted => "deleted",
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Provisioning, Self::Ready | Self::Error)
                | (Self::Ready, Self::Scaling)
                | (Self::Scaling, Self::Ready | Self::Error)
                | (Self::Error, Self::Provisioning)
                | (
                    Self::Provisioning | Self::Ready | Self::Scaling | Self::Error,
                    Self::Deleted
                )
        )
    }
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "provisioning" => Ok(Self::Provisioning),
            "ready" => Ok(Self::Ready),
            "scaling" => Ok(Self::Scaling),
            "error" => Ok(Self::Error),
            "deleted" => Ok(Self::Deleted),
            _ => Err(UnknownVariant::new("database status", value)),
        }
    }
}

/// Database Instance Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRecord {
    pub uuid: DatabaseUuid,
    pub tenant: TenantUuid,
    pub name: String,
    pub engine: DatabaseEngine,
    pub size_class: SizeClass,
    pub status: DatabaseStatus,

    /// Connection metadata, present once the instance has reported ready.
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_name: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
