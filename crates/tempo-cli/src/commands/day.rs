use crate::cli::GlobalFlags;
use crate::cli::root_commands::DayArgs;
use crate::commands::shared::parse::parse_date;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo day`.
pub async fn handle(args: &DayArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let date = parse_date(&args.date, "date")?;
    let agenda = ctx.service.day_agenda(date, &args.teacher).await?;
    output(&agenda, flags.format)
}
