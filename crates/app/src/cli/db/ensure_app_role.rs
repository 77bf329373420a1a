use clap::Args;
use sqlx::{PgConnection, Postgres, Transaction, query, query_scalar};

use crate::cli::session::DatabaseArgs;

/// Attributes that keep the runtime role subject to row-level security.
const ROLE_ATTRIBUTES: &str = "LOGIN NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS";

/// Tables the runtime role may only append to and read.
const APPEND_ONLY_TABLES: &[&str] = &["audit_log"];

const TENANT_TABLES_WITHOUT_RLS_SQL: &str = "\
SELECT c.relname::text FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = 'public' AND c.relkind = 'r'
  AND NOT c.relrowsecurity
  AND c.relname <> '_sqlx_migrations'
ORDER BY c.relname";

#[derive(Debug, Args)]
pub(crate) struct EnsureAppRoleArgs {
    /// Administrative connection; runtime credentials cannot manage roles
    #[command(flatten)]
    database: DatabaseArgs,

    /// Application runtime role name
    #[arg(long, default_value = "nexus_app")]
    role_name: String,

    /// Application role password
    #[arg(long, env = "APP_DB_PASSWORD", hide_env_values = true)]
    password: String,
}

pub(crate) async fn run(args: EnsureAppRoleArgs) -> Result<(), String> {
    if args.role_name.trim().is_empty() {
        return Err("role name cannot be empty".to_string());
    }

    if args.password.trim().is_empty() {
        return Err("password cannot be empty".to_string());
    }

    let db = args.database.connect().await?;

    let mut tx = db
        .pool()
        .begin()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    let role = quote(&mut *tx, "quote_ident", &args.role_name).await?;

    upsert_role(&mut tx, &args.role_name, &role, &args.password).await?;

    for statement in grants(&role) {
        query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|error| format!("failed to apply `{statement}`: {error}"))?;
    }

    let unprotected: Vec<String> = query_scalar(TENANT_TABLES_WITHOUT_RLS_SQL)
        .fetch_all(&mut *tx)
        .await
        .map_err(|error| format!("failed to inspect row-level security: {error}"))?;

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("role: {}", args.role_name);
    println!("append_only: {}", APPEND_ONLY_TABLES.join(", "));

    if !unprotected.is_empty() {
        println!("tables_without_rls: {}", unprotected.join(", "));
    }

    Ok(())
}

/// Identifiers and literals in role DDL cannot be bound, so Postgres quotes them.
async fn quote(conn: &mut PgConnection, function: &str, value: &str) -> Result<String, String> {
    query_scalar(&format!("SELECT {function}($1)"))
        .bind(value)
        .fetch_one(conn)
        .await
        .map_err(|error| format!("failed to quote `{value}`: {error}"))
}

async fn upsert_role(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    role: &str,
    password: &str,
) -> Result<(), String> {
    let password = quote(&mut **tx, "quote_literal", password).await?;

    let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|error| format!("failed to look up role: {error}"))?;

    let verb = if exists { "ALTER" } else { "CREATE" };

    query(&format!("{verb} ROLE {role} {ROLE_ATTRIBUTES} PASSWORD {password}"))
        .execute(&mut **tx)
        .await
        .map_err(|error| format!("failed to {} role: {error}", verb.to_lowercase()))?;

    Ok(())
}

fn grants(role: &str) -> Vec<String> {
    let mut statements = vec![
        format!("GRANT USAGE ON SCHEMA public TO {role}"),
        format!("GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {role}"),
        format!("GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA public TO {role}"),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public \
             GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {role}"
        ),
    ];

    statements.extend(
        APPEND_ONLY_TABLES
            .iter()
            .map(|table| format!("REVOKE UPDATE, DELETE, TRUNCATE ON {table} FROM {role}")),
    );

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_log_stays_append_only() {
        let statements = grants("\"nexus_app\"");

        assert_eq!(
            statements.last().map(String::as_str),
            Some("REVOKE UPDATE, DELETE, TRUNCATE ON audit_log FROM \"nexus_app\"")
        );
    }
}
