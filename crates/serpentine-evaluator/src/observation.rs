//! Observation encodings: turning simulation state into network input.
//!
//! Every encoding is built from the simulation's sensor queries, evaluated for
//! the three relative actions in the order straight, left, right:
//!
//! | Kind    | Len | Layout |
//! |---------|-----|--------|
//! | `wall`  | 3   | wall danger ×3 |
//! | `self`  | 6   | danger ×3, body ray ×3 |
//! | `fruit` | 6   | fruit dx, fruit dy, danger ×3, length |
//! | `multi` | 10  | danger ×3, body ray ×3, fruit dx, fruit dy, fruit distance, length |
//!
//! "danger" is wall-or-body danger; booleans encode as `0.0` / `1.0`.

use serde::{Deserialize, Serialize};
use serpentine_engine::{Action, Simulation};

/// Longest observation vector of any encoding.
pub const MAX_OBSERVATION_LEN: usize = 10;

const RELATIVE_ACTIONS: [Action; 3] = [Action::Straight, Action::TurnLeft, Action::TurnRight];

/// Named observation encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    #[display("wall")]
    Wall,
    #[serde(rename = "self")]
    #[display("self")]
    SelfAvoid,
    #[display("fruit")]
    Fruit,
    #[display("multi")]
    Multi,
}

impl ObservationKind {
    pub const ALL: [Self; 4] = [Self::Wall, Self::SelfAvoid, Self::Fruit, Self::Multi];

    /// Parses an encoding name, accepting both `wall` and `wall_min` spellings.
    ///
    /// ```
    /// use serpentine_evaluator::observation::ObservationKind;
    ///
    /// assert_eq!(ObservationKind::parse("fruit_min"), Some(ObservationKind::Fruit));
    /// assert_eq!(ObservationKind::parse("self"), Some(ObservationKind::SelfAvoid));
    /// assert_eq!(ObservationKind::parse("vision"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let base = name.strip_suffix("_min").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(base))
    }

    /// Like [`parse`](Self::parse), but unknown names fall back to `wall`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::Wall)
    }

    /// Length of the vector this encoding produces.
    #[must_use]
    pub const fn dimension(self) -> usize {
        match self {
            Self::Wall => 3,
            Self::SelfAvoid | Self::Fruit => 6,
            Self::Multi => 10,
        }
    }
}

/// Fills a reusable buffer with one encoding of the simulation state.
///
/// Extraction writes into a fixed array owned by the extractor, so it never
/// allocates.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    kind: ObservationKind,
    buffer: [f32; MAX_OBSERVATION_LEN],
}

impl FeatureExtractor {
    #[must_use]
    pub const fn new(kind: ObservationKind) -> Self {
        Self {
            kind,
            buffer: [0.0; MAX_OBSERVATION_LEN],
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    /// Encodes the current state of `sim`.
    ///
    /// The returned slice is valid until the next call.
    pub fn extract(&mut self, sim: &Simulation) -> &[f32] {
        let buf = &mut self.buffer;
        match self.kind {
            ObservationKind::Wall => {
                for (slot, action) in buf.iter_mut().zip(RELATIVE_ACTIONS) {
                    *slot = flag(sim.is_danger_wall(action));
                }
            }
            ObservationKind::SelfAvoid => {
                write_dangers(&mut buf[0..3], sim);
                write_body_rays(&mut buf[3..6], sim);
            }
            ObservationKind::Fruit => {
                (buf[0], buf[1]) = sim.fruit_direction();
                write_dangers(&mut buf[2..5], sim);
                buf[5] = sim.length_norm();
            }
            ObservationKind::Multi => {
                write_dangers(&mut buf[0..3], sim);
                write_body_rays(&mut buf[3..6], sim);
                (buf[6], buf[7]) = sim.fruit_direction();
                buf[8] = sim.fruit_distance_norm();
                buf[9] = sim.length_norm();
            }
        }
        &self.buffer[..self.kind.dimension()]
    }
}

fn write_dangers(out: &mut [f32], sim: &Simulation) {
    for (slot, action) in out.iter_mut().zip(RELATIVE_ACTIONS) {
        *slot = flag(sim.is_danger(action));
    }
}

fn write_body_rays(out: &mut [f32], sim: &Simulation) {
    for (slot, action) in out.iter_mut().zip(RELATIVE_ACTIONS) {
        *slot = sim.body_distance(action);
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}
