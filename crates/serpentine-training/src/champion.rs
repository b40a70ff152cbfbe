use serde::{Deserialize, Serialize};
use serpentine_evaluator::policy::{GenomeLengthError, PolicyNetwork, Topology};

use crate::genetic::Agent;

/// Serializable record of a trained agent.
///
/// Holds everything needed to rebuild the agent's policy network, plus the
/// single-seed results it was saved with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionSnapshot {
    pub generation: u32,
    pub fitness: f64,
    pub ticks: u32,
    pub fruits: u32,
    pub genome: Vec<f32>,
}

impl ChampionSnapshot {
    /// Copies the agent's genome and latest single-seed results.
    #[must_use]
    pub fn from_agent(agent: &Agent, generation: u32) -> Self {
        let (ticks, fruits) = agent.stats().map_or((0, 0), |s| (s.ticks, s.fruits));
        Self {
            generation,
            fitness: agent.fitness(),
            ticks,
            fruits,
            genome: agent.genome().to_vec(),
        }
    }

    /// Loads the saved genome into a network of the given topology.
    pub fn network(&self, topology: Topology) -> Result<PolicyNetwork, GenomeLengthError> {
        PolicyNetwork::from_genome(topology, &self.genome)
    }
}
