use tempo_core::entities::SessionKey;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::QueueCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo queue`.
pub fn handle(action: &QueueCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        QueueCommands::List => output(&ctx.service.queue().snapshot(), flags.format),
        QueueCommands::Discard { class, date, id } => {
            let key = SessionKey::parse(class, date)?;
            let Some(discarded) = ctx.service.queue().discard(&key, id) else {
                anyhow::bail!("no queued mutation {id} for {key}");
            };
            ctx.service.invalidate_session(&key);
            output(&discarded, flags.format)
        }
    }
}
