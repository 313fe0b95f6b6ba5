use dotenvy::dotenv;
use ouderraad::{
    config::{cms::CmsConfig, database, site},
    core::{
        audit::{self, AuditAction},
        cms::CmsClient,
        transfer,
    },
    errors::Result,
};
use std::{env, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Site settings and CMS credentials
    let site_config = site::load_default_config()
        .inspect_err(|e| error!("Failed to load site configuration: {}", e))?;
    let cms_config = CmsConfig::from_env()
        .inspect_err(|e| error!("Failed to load CMS configuration: {}", e))?;

    // 4. Database for the audit trail
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. One-shot export of the configured content models
    let target = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("export.json"), PathBuf::from);
    let client = CmsClient::new(cms_config)?;
    let document = transfer::export_content(
        &client,
        &site_config.content_models,
        site_config.table.fetch_limit,
    )
    .await?;
    transfer::write_export(&document, &target)
        .inspect_err(|e| error!("Failed to write {}: {}", target.display(), e))?;

    let total: usize = document.content.values().map(Vec::len).sum();
    audit::record(
        &db,
        "cli",
        AuditAction::Export,
        "content",
        &site_config.content_models.join(","),
        Some(format!("{total} entries to {}", target.display())),
    )
    .await?;

    info!("Exported {} entries to {}", total, target.display());
    Ok(())
}
