use serde_json::json;
use tempo_core::entities::{MutationKind, SessionKey};
use tempo_engine::{EngineError, RecordOutcome, resolve};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RecordArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tempo record`.
pub async fn handle(args: &RecordArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let key = SessionKey::parse(&args.class, &args.date)?;
    let kind = intent(args)?;

    if let Some(teacher) = &args.teacher {
        match ctx
            .service
            .start_session(&key, Some(teacher.clone()), args.roster.clone())
            .await
        {
            Ok(_) => {}
            Err(EngineError::Store(error)) if error.is_transient() => {
                tracing::warn!(%error, %key, "could not create session; recording offline");
            }
            Err(error) => return Err(error.into()),
        }
    }

    match ctx.service.record(key, kind).await? {
        RecordOutcome::Committed(session) => output(
            &json!({
                "outcome": "committed",
                "version": session.version,
                "statuses": resolve(&session),
            }),
            flags.format,
        ),
        RecordOutcome::Queued { mutation, view } => {
            tracing::warn!(id = %mutation.id, key = %mutation.key, "store unreachable; change queued");
            output(
                &json!({
                    "outcome": "queued",
                    "mutation": mutation.id,
                    "statuses": resolve(&view),
                }),
                flags.format,
            )
        }
    }
}

fn intent(args: &RecordArgs) -> anyhow::Result<MutationKind> {
    match (&args.student, args.status, &args.justify, &args.note) {
        (Some(student), Some(status), _, _) => Ok(MutationKind::set_status(student.as_str(), status)),
        (Some(student), None, Some(reason), _) => {
            Ok(MutationKind::justify(student.as_str(), reason.as_str()))
        }
        (_, _, _, Some(note)) => Ok(MutationKind::observe(note.as_str())),
        _ => anyhow::bail!("record needs --status, --justify, or --note"),
    }
}
