use serde_json::{Value, json};
use tempo_core::entities::Session;
use tempo_engine::resolve;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ResolveArgs;
use crate::commands::shared::parse::read_json;
use crate::output::output;

/// Handle `tempo resolve`.
pub fn handle(args: &ResolveArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let document: Value = read_json(&args.file)?;
    let session = Session::from_json(document)?;
    output(
        &json!({
            "session": session.key.to_string(),
            "version": session.version,
            "statuses": resolve(&session),
        }),
        flags.format,
    )
}
