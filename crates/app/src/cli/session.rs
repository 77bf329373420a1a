//! Database connection and operator sign-in shared by subcommands.

use clap::Args;
use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use nexus_app::{
    auth::{Claims, PasswordPolicy},
    database::{self, Db},
    domain::{
        tenants::records::TenantUuid,
        users::{PgUsersService, UsersService, data::Credentials},
    },
};

/// Lifetime of the claims a CLI invocation acts with.
const SESSION_TTL: SignedDuration = SignedDuration::from_mins(5);

#[derive(Debug, Args)]
pub(crate) struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub(crate) database_url: String,
}

impl DatabaseArgs {
    pub(crate) async fn connect(&self) -> Result<Db, String> {
        database::connect(&self.database_url)
            .await
            .map(Db::new)
            .map_err(|error| format!("failed to connect to database: {error}"))
    }
}

/// Existing user whose permissions the command runs with.
#[derive(Debug, Args)]
pub(crate) struct OperatorArgs {
    /// Operator email
    #[arg(long, env = "NEXUS_OPERATOR_EMAIL")]
    pub(crate) operator_email: String,

    /// Operator password
    #[arg(long, env = "NEXUS_OPERATOR_PASSWORD", hide_env_values = true)]
    pub(crate) operator_password: String,

    /// Operator tenant; required when the email exists in several tenants
    #[arg(long)]
    pub(crate) tenant_uuid: Option<Uuid>,
}

impl OperatorArgs {
    pub(crate) async fn sign_in(&self, db: &Db) -> Result<Claims, String> {
        let users = PgUsersService::new(db.clone(), PasswordPolicy::default());

        let authenticated = users
            .authenticate(Credentials {
                email: self.operator_email.clone(),
                password: self.operator_password.clone(),
                tenant: self.tenant_uuid.map(TenantUuid::from_uuid),
            })
            .await
            .map_err(|error| format!("operator sign-in failed: {error}"))?;

        let issued_at = Timestamp::now();

        Ok(Claims {
            subject: authenticated.user.uuid,
            tenant: authenticated.user.tenant,
            email: authenticated.user.email,
            permissions: authenticated.permissions,
            issued_at,
            expires_at: issued_at + SESSION_TTL,
        })
    }
}
