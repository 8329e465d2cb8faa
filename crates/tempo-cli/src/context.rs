use std::sync::Arc;

use anyhow::Context;
use tempo_config::TempoConfig;
use tempo_db::TempoDb;
use tempo_engine::AttendanceService;
use tempo_engine::clock::SystemClock;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: AttendanceService<TempoDb>,
}

impl AppContext {
    /// Open the configured database and restore the offline queue journal.
    pub async fn init(config: &TempoConfig, db_override: Option<&str>) -> anyhow::Result<Self> {
        let db_path = db_override.unwrap_or(&config.store.path);
        let db = TempoDb::open_local(db_path)
            .await
            .with_context(|| format!("failed to open attendance database at {db_path}"))?;

        let service = AttendanceService::open(db, config, Arc::new(SystemClock))
            .context("failed to restore the offline queue")?;

        let queued = service.queue().len();
        if queued > 0 {
            tracing::info!(queued, "offline queue has pending mutations");
        }

        Ok(Self { service })
    }
}
