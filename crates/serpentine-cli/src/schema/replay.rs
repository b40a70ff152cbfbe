use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serpentine_engine::Replay;

/// Recorded episode of a generation's best agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFile {
    /// Timestamp when the recording was created (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Generation whose best agent played the episode
    pub generation: u32,
    #[serde(flatten)]
    pub replay: Replay,
}
