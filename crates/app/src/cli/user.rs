use clap::Args;
use nexus_app::{
    auth::{Claims, PasswordPolicy, Permissions, WILDCARD_PERMISSION},
    domain::{
        roles::{PgRolesService, RolesService, data::NewRole, records::RoleUuid},
        users::{PgUsersService, UsersService, data::NewUser},
    },
    pagination::{MAX_PAGE_SIZE, PageRequest},
};

use crate::cli::session::{DatabaseArgs, OperatorArgs};

const ADMIN_ROLE_NAME: &str = "admin";

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    operator: OperatorArgs,

    /// New user's email
    #[arg(long)]
    email: String,

    /// New user's password
    #[arg(long, env = "NEXUS_USER_PASSWORD", hide_env_values = true)]
    password: String,

    /// New user's display name; defaults to the email
    #[arg(long)]
    display_name: Option<String>,
}

pub(crate) async fn run(args: CreateUserArgs) -> Result<(), String> {
    let db = args.database.connect().await?;
    let claims = args.operator.sign_in(&db).await?;

    let roles = PgRolesService::new(db.clone());
    let users = PgUsersService::new(db, PasswordPolicy::default());

    let role = wildcard_role(&roles, &claims).await?;
    let display_name = args.display_name.unwrap_or_else(|| args.email.clone());

    let user = users
        .create_user(
            &claims,
            NewUser {
                email: args.email,
                password: args.password,
                display_name,
                roles: vec![role],
            },
        )
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("tenant_uuid: {}", user.tenant);
    println!("user_uuid: {}", user.uuid);
    println!("email: {}", user.email);
    println!("role_uuid: {role}");

    Ok(())
}

async fn wildcard_role(roles: &PgRolesService, claims: &Claims) -> Result<RoleUuid, String> {
    let page = roles
        .list_roles(claims, PageRequest::new(None, Some(i64::from(MAX_PAGE_SIZE))))
        .await
        .map_err(|error| format!("failed to list roles: {error}"))?;

    if let Some(role) = page.items.iter().find(|role| role.permissions.is_wildcard()) {
        return Ok(role.uuid);
    }

    let role = roles
        .create_role(
            claims,
            NewRole {
                name: ADMIN_ROLE_NAME.to_string(),
                permissions: [WILDCARD_PERMISSION].into_iter().collect::<Permissions>(),
            },
        )
        .await
        .map_err(|error| format!("failed to create admin role: {error}"))?;

    Ok(role.uuid)
}
