//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use nexus_app::auth::Claims;

const CLAIMS_KEY: &str = "claims";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_claims(&mut self, claims: Claims);

    fn claims_or_401(&self) -> Result<&Claims, StatusError>;

    /// The caller's claims, provided they hold `permission`.
    fn authorize_or_403(&self, permission: &str) -> Result<&Claims, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_claims(&mut self, claims: Claims) {
        self.insert(CLAIMS_KEY, claims);
    }

    fn claims_or_401(&self) -> Result<&Claims, StatusError> {
        self.get::<Claims>(CLAIMS_KEY)
            .map_err(|_ignored| StatusError::unauthorized().brief("Authentication required"))
    }

    fn authorize_or_403(&self, permission: &str) -> Result<&Claims, StatusError> {
        let claims = self.claims_or_401()?;

        if claims.allows(permission) {
            Ok(claims)
        } else {
            Err(StatusError::forbidden().brief(format!("Missing permission `{permission}`")))
        }
    }
}
