use tempo_engine::DateRange;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo report`.
pub async fn handle(args: &ReportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let range = DateRange::parse(&args.from, &args.to)?;
    let report = ctx.service.report(range, args.teacher.as_deref()).await?;
    let queued = ctx.service.queue().len();
    if queued > 0 {
        tracing::warn!(queued, "report includes edits that are not yet stored");
    }
    output(&report, flags.format)
}
