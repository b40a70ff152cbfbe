use serde::{Deserialize, Serialize};

/// Why an episode ended.
///
/// `None` is only observed while the snake is still alive; every finished
/// episode carries one of the four terminal causes.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    #[default]
    #[display("none")]
    None,
    #[display("wall")]
    Wall,
    #[serde(rename = "self")]
    #[display("self")]
    SelfCollision,
    #[display("stall")]
    Stall,
    #[display("timeout")]
    Timeout,
}

impl DeathCause {
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Wall,
        Self::SelfCollision,
        Self::Stall,
        Self::Timeout,
    ];

    /// Returns `true` for causes that end the episode by a collision.
    #[must_use]
    pub const fn is_collision(self) -> bool {
        matches!(self, Self::Wall | Self::SelfCollision)
    }
}

/// Summary of one finished episode.
///
/// # Example
///
/// ```
/// use serpentine_engine::{DeathCause, EnvConfig, Simulation};
///
/// let config = EnvConfig::new(5, 5, 1, 3, 100, false)?;
/// let mut sim = Simulation::new(&config, 7);
/// sim.step(serpentine_engine::Action::Straight);
/// sim.step(serpentine_engine::Action::Straight);
/// sim.step(serpentine_engine::Action::Straight);
///
/// let stats = sim.stats(7);
/// assert_eq!(stats.ticks, 3);
/// assert_eq!(stats.death, DeathCause::Wall);
/// # Ok::<(), serpentine_engine::EnvConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub fruits: u32,
    pub ticks: u32,
    pub progress_sum: f64,
    pub death: DeathCause,
    pub seed: u32,
}

/// Histogram of terminal causes over a set of episodes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathCauseCounts {
    pub none: u32,
    pub wall: u32,
    #[serde(rename = "self")]
    pub self_collision: u32,
    pub stall: u32,
    pub timeout: u32,
}

impl DeathCauseCounts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            none: 0,
            wall: 0,
            self_collision: 0,
            stall: 0,
            timeout: 0,
        }
    }

    /// Builds a histogram from a sequence of causes.
    pub fn from_causes<I>(causes: I) -> Self
    where
        I: IntoIterator<Item = DeathCause>,
    {
        let mut counts = Self::new();
        for cause in causes {
            counts.record(cause);
        }
        counts
    }

    pub const fn record(&mut self, cause: DeathCause) {
        *self.slot_mut(cause) += 1;
    }

    #[must_use]
    pub const fn get(&self, cause: DeathCause) -> u32 {
        match cause {
            DeathCause::None => self.none,
            DeathCause::Wall => self.wall,
            DeathCause::SelfCollision => self.self_collision,
            DeathCause::Stall => self.stall,
            DeathCause::Timeout => self.timeout,
        }
    }

    /// Total number of recorded episodes.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.none + self.wall + self.self_collision + self.stall + self.timeout
    }

    const fn slot_mut(&mut self, cause: DeathCause) -> &mut u32 {
        match cause {
            DeathCause::None => &mut self.none,
            DeathCause::Wall => &mut self.wall,
            DeathCause::SelfCollision => &mut self.self_collision,
            DeathCause::Stall => &mut self.stall,
            DeathCause::Timeout => &mut self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_cause_serde_names() {
        let json = serde_json::to_string(&DeathCause::ALL).unwrap();
        assert_eq!(json, r#"["none","wall","self","stall","timeout"]"#);
        let parsed: Vec<DeathCause> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, DeathCause::ALL);
    }

    #[test]
    fn test_display_matches_serde() {
        for cause in DeathCause::ALL {
            let json = serde_json::to_string(&cause).unwrap();
            assert_eq!(json, format!("\"{cause}\""));
        }
    }

    #[test]
    fn test_counts_record() {
        let counts = DeathCauseCounts::from_causes([
            DeathCause::Wall,
            DeathCause::Wall,
            DeathCause::Timeout,
            DeathCause::SelfCollision,
        ]);
        assert_eq!(counts.get(DeathCause::Wall), 2);
        assert_eq!(counts.get(DeathCause::SelfCollision), 1);
        assert_eq!(counts.get(DeathCause::Stall), 0);
        assert_eq!(counts.get(DeathCause::Timeout), 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_collision_causes() {
        assert!(DeathCause::Wall.is_collision());
        assert!(DeathCause::SelfCollision.is_collision());
        assert!(!DeathCause::Stall.is_collision());
        assert!(DeathCause::Timeout.is_timeout());
    }
}
