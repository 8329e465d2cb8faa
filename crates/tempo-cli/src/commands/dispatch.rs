use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Resolve(args) => commands::resolve::handle(&args, flags),
        Commands::Day(args) => commands::day::handle(&args, ctx, flags).await,
        Commands::Report(args) => commands::report::handle(&args, ctx, flags).await,
        Commands::Record(args) => commands::record::handle(&args, ctx, flags).await,
        Commands::Replay => commands::replay::handle(ctx, flags).await,
        Commands::Catalog { action } => commands::catalog::handle(&action, ctx, flags).await,
        Commands::Queue { action } => commands::queue::handle(&action, ctx, flags),
    }
}
