use serde_json::json;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo replay`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.service.replay().await;
    let applied: Vec<&str> = report.applied.iter().map(|m| m.id.as_str()).collect();
    let failures: Vec<String> = report.failures.iter().map(ToString::to_string).collect();

    output(
        &json!({
            "applied": applied,
            "deferred": report.deferred,
            "failures": failures,
            "remaining": ctx.service.queue().len(),
        }),
        flags.format,
    )?;

    if !failures.is_empty() {
        anyhow::bail!("{} queued mutation(s) failed permanently", failures.len());
    }
    Ok(())
}
