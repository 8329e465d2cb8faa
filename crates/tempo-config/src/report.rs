//! Attendance report policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Whether an unjustified `late` counts toward the attendance rate.
    #[serde(default)]
    pub late_counts_as_attended: bool,
}
