use clap::Args;
use nexus_app::domain::api_keys::{ApiKeysService, PgApiKeysService, records::ApiKeyUuid};
use uuid::Uuid;

use crate::cli::session::{DatabaseArgs, OperatorArgs};

#[derive(Debug, Args)]
pub(crate) struct RevokeKeyArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    operator: OperatorArgs,

    /// Key to revoke
    #[arg(long)]
    key_uuid: Uuid,
}

pub(crate) async fn run(args: RevokeKeyArgs) -> Result<(), String> {
    let db = args.database.connect().await?;
    let claims = args.operator.sign_in(&db).await?;
    let service = PgApiKeysService::new(db);

    let key = service
        .revoke_api_key(&claims, ApiKeyUuid::from_uuid(args.key_uuid))
        .await
        .map_err(|error| format!("failed to revoke key: {error}"))?;

    println!("key_uuid: {}", key.uuid);
    println!("key_status: {}", key.status.as_str());

    if let Some(revoked_at) = key.revoked_at {
        println!("key_revoked_at: {revoked_at}");
    }

    Ok(())
}
