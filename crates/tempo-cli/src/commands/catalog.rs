use serde_json::{Value, json};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CatalogCommands;
use crate::commands::shared::parse::read_json;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo catalog`.
pub async fn handle(
    action: &CatalogCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        CatalogCommands::Import { file } => {
            let entries: Vec<Value> = read_json(file)?;
            let total = entries.len();
            let imported = ctx.service.store().import_catalog(entries).await?;
            ctx.service.refresh_catalog();
            output(
                &json!({ "imported": imported, "skipped": total - imported }),
                flags.format,
            )
        }
        CatalogCommands::List => {
            let classes = ctx.service.classes().await?;
            output(&classes, flags.format)
        }
    }
}
