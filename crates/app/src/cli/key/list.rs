use clap::Args;
use nexus_app::{
    domain::api_keys::{ApiKeysService, PgApiKeysService},
    pagination::PageRequest,
};

use crate::cli::session::{DatabaseArgs, OperatorArgs};

#[derive(Debug, Args)]
pub(crate) struct ListKeysArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    operator: OperatorArgs,

    /// One-based page number
    #[arg(long)]
    page: Option<i64>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<i64>,
}

pub(crate) async fn run(args: ListKeysArgs) -> Result<(), String> {
    let db = args.database.connect().await?;
    let claims = args.operator.sign_in(&db).await?;
    let service = PgApiKeysService::new(db);

    let page = service
        .list_api_keys(&claims, PageRequest::new(args.page, args.page_size))
        .await
        .map_err(|error| format!("failed to list keys: {error}"))?;

    for key in &page.items {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            key.uuid,
            key.prefix,
            key.status.as_str(),
            key.expires_at,
            key.name
        );
    }

    println!(
        "page {} of {} keys ({} per page)",
        page.page, page.total, page.page_size
    );

    Ok(())
}
