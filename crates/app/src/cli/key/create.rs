use clap::Args;
use jiff::Timestamp;
use nexus_app::{
    auth::Permissions,
    domain::api_keys::{ApiKeysService, PgApiKeysService, data::NewApiKey},
};

use crate::cli::session::{DatabaseArgs, OperatorArgs};

#[derive(Debug, Args)]
pub(crate) struct CreateKeyArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    operator: OperatorArgs,

    /// Key label
    #[arg(long)]
    name: String,

    /// Granted permission; repeat for several
    #[arg(long = "scope", required = true)]
    scopes: Vec<String>,

    /// Optional expiry timestamp (RFC 3339); defaults to 90 days
    #[arg(long)]
    expires_at: Option<String>,
}

pub(crate) async fn run(args: CreateKeyArgs) -> Result<(), String> {
    let expires_at = parse_expires_at(args.expires_at.as_deref())?;

    let db = args.database.connect().await?;
    let claims = args.operator.sign_in(&db).await?;
    let service = PgApiKeysService::new(db);

    let issued = service
        .issue_api_key(
            &claims,
            NewApiKey {
                name: args.name,
                scopes: Permissions::from(args.scopes),
                expires_at,
            },
        )
        .await
        .map_err(|error| format!("failed to create key: {error}"))?;

    println!("key_uuid: {}", issued.record.uuid);
    println!("tenant_uuid: {}", issued.record.tenant);
    println!("key_prefix: {}", issued.record.prefix);
    println!("key_scopes: {}", issued.record.scopes.into_vec().join(","));
    println!("key_expires_at: {}", issued.record.expires_at);
    println!("api_key: {}", issued.key);
    println!("store this key now; it is only shown once");

    Ok(())
}

fn parse_expires_at(raw: Option<&str>) -> Result<Option<Timestamp>, String> {
    raw.map(|value| {
        value
            .parse::<Timestamp>()
            .map_err(|error| format!("invalid expires-at timestamp: {error}"))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_optional() {
        assert_eq!(parse_expires_at(None), Ok(None));
    }

    #[test]
    fn malformed_expiry_is_rejected() {
        assert!(parse_expires_at(Some("next tuesday")).is_err());
    }

    #[test]
    fn rfc3339_expiry_is_parsed() -> Result<(), String> {
        let parsed = parse_expires_at(Some("2030-01-01T00:00:00Z"))?;

        assert_eq!(
            parsed.map(|at| at.as_second()),
            Some(1_893_456_000),
            "expected the unix time of 2030-01-01"
        );

        Ok(())
    }
}
