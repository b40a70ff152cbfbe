use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serpentine_evaluator::observation::ObservationKind;
use serpentine_training::champion::ChampionSnapshot;

/// Saved champion agent.
///
/// Only the snapshot fields are required, so bare snapshots load as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionFile {
    /// Timestamp when the file was written (ISO 8601 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// Network layout the genome was trained with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkInfo>,
    /// Robustness score, when the agent was scored on the multi-seed suite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robustness: Option<f64>,
    #[serde(flatten)]
    pub snapshot: ChampionSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub observation: ObservationKind,
    pub hidden1: usize,
    /// Zero when the network has a single hidden layer
    pub hidden2: usize,
}
