//! Record identifiers that cannot be mixed up across record types.

use std::{cmp::Ordering, fmt, hash, marker::PhantomData, str::FromStr};

use uuid::Uuid;

/// A v7 [`Uuid`] branded with the record type `R` it identifies.
///
/// `R` is only a marker; none of the trait impls below place bounds on it,
/// so `TenantUuid` stays `Copy` even though `TenantRecord` is not.
pub struct TypedUuid<R> {
    raw: Uuid,
    record: PhantomData<fn() -> R>,
}

impl<R> TypedUuid<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    pub const fn from_uuid(raw: Uuid) -> Self {
        Self {
            raw,
            record: PhantomData,
        }
    }

    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.raw
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.raw
    }
}

impl<R> Default for TypedUuid<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for TypedUuid<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for TypedUuid<R> {}

impl<R> PartialEq for TypedUuid<R> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<R> Eq for TypedUuid<R> {}

impl<R> PartialOrd for TypedUuid<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R> Ord for TypedUuid<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<R> hash::Hash for TypedUuid<R> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<R> fmt::Debug for TypedUuid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}

impl<R> fmt::Display for TypedUuid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

impl<R> FromStr for TypedUuid<R> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<R> From<Uuid> for TypedUuid<R> {
    fn from(raw: Uuid) -> Self {
        Self::from_uuid(raw)
    }
}

impl<R> From<TypedUuid<R>> for Uuid {
    fn from(id: TypedUuid<R>) -> Self {
        id.raw
    }
}
