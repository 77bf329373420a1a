//! `nexus-app` command tree.

use clap::{Parser, Subcommand};

mod db;
mod key;
mod session;
mod tenant;
mod user;

#[derive(Debug, Parser)]
#[command(name = "nexus-app", about = "Nexus administration CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tenant bootstrap
    #[command(subcommand)]
    Tenant(TenantCommand),

    /// User bootstrap
    #[command(subcommand)]
    User(UserCommand),

    /// API key management
    #[command(subcommand)]
    Key(KeyCommand),

    /// Schema and database role maintenance
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum TenantCommand {
    /// Register a tenant with its first administrator
    Create(tenant::CreateTenantArgs),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Create a user holding the tenant's wildcard role
    Create(user::CreateUserArgs),
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    /// Issue an API key owned by the operator
    Create(key::create::CreateKeyArgs),

    /// List the operator tenant's API keys
    List(key::list::ListKeysArgs),

    /// Revoke an API key
    Revoke(key::revoke::RevokeKeyArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply pending schema migrations
    Migrate(db::migrate::MigrateArgs),

    /// Create or update the row-level-security-bound runtime role
    EnsureAppRole(db::ensure_app_role::EnsureAppRoleArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Command::Tenant(TenantCommand::Create(args)) => tenant::run(args).await,
            Command::User(UserCommand::Create(args)) => user::run(args).await,
            Command::Key(KeyCommand::Create(args)) => key::create::run(args).await,
            Command::Key(KeyCommand::List(args)) => key::list::run(args).await,
            Command::Key(KeyCommand::Revoke(args)) => key::revoke::run(args).await,
            Command::Db(DbCommand::Migrate(args)) => db::migrate::run(args).await,
            Command::Db(DbCommand::EnsureAppRole(args)) => db::ensure_app_role::run(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_revoke_parses() {
        let cli = Cli::try_parse_from([
            "nexus-app",
            "key",
            "revoke",
            "--database-url",
            "postgres://localhost/nexus",
            "--operator-email",
            "ops@nexus.test",
            "--operator-password",
            "pw",
            "--key-uuid",
            "0190c1a4-6f6b-7c3e-9f58-3a7d2b1e4c90",
        ]);

        assert!(
            matches!(
                cli.map(|cli| cli.command),
                Ok(Command::Key(KeyCommand::Revoke(_)))
            ),
            "expected key revoke to parse"
        );
    }
}
