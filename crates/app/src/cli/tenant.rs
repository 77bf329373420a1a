use clap::Args;
use nexus_app::{
    auth::PasswordPolicy,
    domain::tenants::{PgTenantsService, TenantsService, data::NewRegistration},
};

use crate::cli::session::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct CreateTenantArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Tenant display name
    #[arg(long)]
    name: String,

    /// Administrator email
    #[arg(long)]
    email: String,

    /// Administrator password
    #[arg(long, env = "NEXUS_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// Administrator display name; defaults to the email
    #[arg(long)]
    display_name: Option<String>,
}

pub(crate) async fn run(args: CreateTenantArgs) -> Result<(), String> {
    let db = args.database.connect().await?;
    let service = PgTenantsService::new(db, PasswordPolicy::default());

    let display_name = args.display_name.unwrap_or_else(|| args.email.clone());

    let registration = service
        .register(NewRegistration {
            tenant_name: args.name,
            email: args.email,
            password: args.password,
            display_name,
        })
        .await
        .map_err(|error| format!("failed to create tenant: {error}"))?;

    println!("tenant_uuid: {}", registration.tenant.uuid);
    println!("tenant_name: {}", registration.tenant.name);
    println!("admin_role_uuid: {}", registration.role.uuid);
    println!("admin_user_uuid: {}", registration.user.uuid);
    println!("admin_email: {}", registration.user.email);

    Ok(())
}
