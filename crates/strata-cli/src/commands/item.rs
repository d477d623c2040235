use serde::Serialize;
use strata_core::entities::Item;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ItemCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ItemResponse {
    #[serde(flatten)]
    item: Item,
    has_embedding: bool,
}

/// Handle `strata item`.
pub async fn handle(
    action: &ItemCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ItemCommands::Import { file } => {
            let report = ctx.service.import_items(file).await?;
            output(&report, flags.format)
        }
        ItemCommands::Get { id } => {
            let item = ctx.service.get_item(id).await?;
            output(&item_response(item), flags.format)
        }
    }
}

fn item_response(item: Item) -> ItemResponse {
    ItemResponse {
        has_embedding: item.has_embedding(),
        item,
    }
}
