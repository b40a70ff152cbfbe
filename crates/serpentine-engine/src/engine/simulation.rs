use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::core::{Action, Body, Heading, Position};

use super::{
    env_config::EnvConfig,
    episode_stats::{DeathCause, EpisodeStats},
};

/// Deterministic snake simulation.
///
/// A simulation owns its body, its fruit and a pseudo-random generator seeded
/// once at creation. The generator is only advanced to place fruit, so the same
/// configuration, seed and action sequence always reproduce the same episode.
///
/// Once the snake dies, [`step`](Self::step) becomes a no-op.
///
/// # Example
///
/// ```
/// use serpentine_engine::{Action, DeathCause, EnvConfig, Simulation};
///
/// let config = EnvConfig::new(10, 10, 1, 200, 9999, false)?;
/// let mut sim = Simulation::new(&config, 42);
/// while sim.is_alive() {
///     sim.step(Action::Straight);
/// }
/// // Spawned at (5, 5) facing right: the fifth step leaves the grid.
/// assert_eq!(sim.death_cause(), DeathCause::Wall);
/// assert_eq!(sim.tick(), 5);
/// # Ok::<(), serpentine_engine::EnvConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    config: EnvConfig,
    body: Body,
    heading: Heading,
    fruit: Option<Position>,
    tick: u32,
    ticks_since_fruit: u32,
    fruits_eaten: u32,
    progress_sum: f64,
    fruit_baseline: f64,
    death: DeathCause,
    rng: Pcg32,
}

impl Simulation {
    /// Creates a fresh episode.
    ///
    /// The snake spawns at the centre cell facing right, its body extending
    /// leftwards. When fruit is enabled it is placed immediately and the
    /// progress baseline is set to the head-to-fruit distance.
    #[must_use]
    pub fn new(config: &EnvConfig, seed: u32) -> Self {
        let (cx, cy) = centre(config);
        let cells = (0..config.start_length()).map(|i| Position::new(cx - offset(i), cy));
        let body = Body::new(config.width(), config.height(), cells);

        let mut sim = Self {
            config: *config,
            body,
            heading: Heading::Right,
            fruit: None,
            tick: 0,
            ticks_since_fruit: 0,
            fruits_eaten: 0,
            progress_sum: 0.0,
            fruit_baseline: 0.0,
            death: DeathCause::None,
            rng: Pcg32::seed_from_u64(u64::from(seed)),
        };
        if config.fruit_enabled() {
            sim.place_fruit();
        }
        sim
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self, action: Action) {
        if !self.is_alive() {
            return;
        }

        self.tick += 1;
        self.ticks_since_fruit += 1;
        self.heading = self.heading.turned(action);

        let new_head = self.body.head().step(self.heading);
        if !self.body.in_bounds(new_head) {
            self.death = DeathCause::Wall;
            return;
        }
        if self.body.occupies_except_tail(new_head) {
            self.death = DeathCause::SelfCollision;
            return;
        }

        if self.fruit == Some(new_head) {
            self.body.advance(new_head, true);
            self.fruits_eaten += 1;
            self.ticks_since_fruit = 0;
            self.place_fruit();
        } else {
            self.body.advance(new_head, false);
            if let Some(distance) = self.fruit_distance() {
                let improvement = self.fruit_baseline - distance;
                if improvement > 0.0 {
                    self.progress_sum += improvement;
                }
                self.fruit_baseline = distance;
            }
        }

        if self.ticks_since_fruit >= self.config.stall_window() {
            self.death = DeathCause::Stall;
        } else if self.tick >= self.config.tick_cap() {
            self.death = DeathCause::Timeout;
        }
    }

    /// Summarises the episode so far, tagged with `seed`.
    #[must_use]
    pub fn stats(&self, seed: u32) -> EpisodeStats {
        EpisodeStats {
            fruits: self.fruits_eaten,
            ticks: self.tick,
            progress_sum: self.progress_sum,
            death: self.death,
            seed,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EnvConfig {
        &self.config
    }

    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    #[must_use]
    pub fn head(&self) -> Position {
        self.body.head()
    }

    #[must_use]
    pub fn tail(&self) -> Position {
        self.body.tail()
    }

    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Current fruit cell, if fruit is enabled and the grid still has room.
    #[must_use]
    pub const fn fruit(&self) -> Option<Position> {
        self.fruit
    }

    #[must_use]
    pub const fn tick(&self) -> u32 {
        self.tick
    }

    #[must_use]
    pub const fn ticks_since_fruit(&self) -> u32 {
        self.ticks_since_fruit
    }

    #[must_use]
    pub const fn fruits_eaten(&self) -> u32 {
        self.fruits_eaten
    }

    #[must_use]
    pub const fn progress_sum(&self) -> f64 {
        self.progress_sum
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self.death, DeathCause::None)
    }

    #[must_use]
    pub const fn death_cause(&self) -> DeathCause {
        self.death
    }

    /// Would `action` move the head off the grid?
    #[must_use]
    pub fn is_danger_wall(&self, action: Action) -> bool {
        !self.body.in_bounds(self.peek(action))
    }

    /// Would `action` move the head into the body? The tail is not counted.
    #[must_use]
    pub fn is_danger_body(&self, action: Action) -> bool {
        self.body.occupies_except_tail(self.peek(action))
    }

    #[must_use]
    pub fn is_danger(&self, action: Action) -> bool {
        self.is_danger_wall(action) || self.is_danger_body(action)
    }

    /// Distance to the first body cell along the ray cast from the head in
    /// the direction `action` would take, normalised by `width + height`.
    ///
    /// Returns `1.0` when the ray leaves the grid without hitting the body.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn body_distance(&self, action: Action) -> f32 {
        let heading = self.heading.turned(action);
        let head = self.body.head();
        let perimeter = self.config.perimeter();
        for distance in 1..perimeter {
            let pos = head.offset(heading, offset(distance));
            if !self.body.in_bounds(pos) {
                return 1.0;
            }
            if self.body.occupies(pos) {
                return distance as f32 / perimeter as f32;
            }
        }
        1.0
    }

    /// Head-to-fruit offset in the heading-relative frame, normalised by
    /// `width + height`.
    ///
    /// The returned `(x, y)` has `y` pointing forward and `x` to the right.
    /// Without fruit this is `(0.0, 0.0)`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fruit_direction(&self) -> (f32, f32) {
        let Some(fruit) = self.fruit else {
            return (0.0, 0.0);
        };
        let head = self.body.head();
        let perimeter = self.config.perimeter() as f32;
        let dx = (fruit.x - head.x) as f32 / perimeter;
        let dy = (fruit.y - head.y) as f32 / perimeter;
        self.heading.to_relative(dx, dy)
    }

    /// Manhattan distance to the fruit normalised by `width + height`, or
    /// `1.0` without fruit.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fruit_distance_norm(&self) -> f32 {
        self.fruit.map_or(1.0, |fruit| {
            self.body.head().manhattan_distance(fruit) as f32 / self.config.perimeter() as f32
        })
    }

    /// Body length as a fraction of the grid area.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn length_norm(&self) -> f32 {
        self.body.len() as f32 / self.config.area() as f32
    }

    fn peek(&self, action: Action) -> Position {
        self.body.head().step(self.heading.turned(action))
    }

    fn fruit_distance(&self) -> Option<f64> {
        self.fruit
            .map(|fruit| f64::from(self.body.head().manhattan_distance(fruit)))
    }

    fn place_fruit(&mut self) {
        let empty = self.body.empty_count();
        self.fruit = if empty == 0 {
            None
        } else {
            let index = self.rng.random_range(0..empty);
            self.body.empty_cells().nth(index)
        };
        if let Some(distance) = self.fruit_distance() {
            self.fruit_baseline = distance;
        }
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn centre(config: &EnvConfig) -> (i32, i32) {
    ((config.width() / 2) as i32, (config.height() / 2) as i32)
}

// Grid dimensions are validated to fit in `i32`.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn offset(n: usize) -> i32 {
    n as i32
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};

    use super::*;

    fn config(
        width: usize,
        height: usize,
        start_length: usize,
        tick_cap: u32,
        fruit: bool,
    ) -> EnvConfig {
        EnvConfig::new(width, height, start_length, tick_cap, 9999, fruit).unwrap()
    }

    fn random_actions(seed: u64, n: usize) -> Vec<Action> {
        let mut rng = Pcg32::seed_from_u64(seed);
        (0..n)
            .map(|_| Action::ALL[rng.random_range(0..Action::LEN)])
            .collect()
    }

    fn wall_follower(sim: &Simulation) -> Action {
        if !sim.is_danger(Action::Straight) {
            Action::Straight
        } else if !sim.is_danger(Action::TurnRight) {
            Action::TurnRight
        } else {
            Action::TurnLeft
        }
    }

    #[test]
    fn test_spawn_layout() {
        let sim = Simulation::new(&config(10, 8, 3, 200, false), 1);
        assert_eq!(sim.heading(), Heading::Right);
        assert_eq!(
            sim.body().iter().collect::<Vec<_>>(),
            [
                Position::new(5, 4),
                Position::new(4, 4),
                Position::new(3, 4),
            ]
        );
        assert_eq!(sim.fruit(), None);
        assert!(sim.is_alive());
    }

    #[test]
    fn test_fruit_spawns_on_empty_cell() {
        for seed in 0..50 {
            let sim = Simulation::new(&config(6, 6, 3, 200, true), seed);
            let fruit = sim.fruit().unwrap();
            assert!(sim.body().in_bounds(fruit));
            assert!(!sim.body().occupies(fruit));
        }
    }

    #[test]
    fn test_determinism() {
        let config = config(8, 8, 2, 300, true);
        for seed in 0..20 {
            let actions = random_actions(u64::from(seed), 300);
            let run = || {
                let mut sim = Simulation::new(&config, seed);
                let mut fruits = vec![sim.fruit()];
                for &action in &actions {
                    sim.step(action);
                    fruits.push(sim.fruit());
                }
                (sim.stats(seed), fruits)
            };
            assert_eq!(run(), run());
        }
    }

    #[test]
    fn test_length_and_bounds_invariants() {
        let config = config(7, 7, 2, 500, true);
        for seed in 0..30 {
            let mut sim = Simulation::new(&config, seed);
            for action in random_actions(u64::from(seed) + 100, 500) {
                let len = sim.body_len();
                let fruits = sim.fruits_eaten();
                sim.step(action);
                if !sim.is_alive() {
                    break;
                }
                let grown = sim.fruits_eaten() - fruits;
                assert_eq!(sim.body_len(), len + grown as usize);
                assert!(grown <= 1);
                let head = sim.head();
                assert!((0..7).contains(&head.x) && (0..7).contains(&head.y));
            }
        }
    }

    #[test]
    fn test_step_after_death_is_noop() {
        let mut sim = Simulation::new(&config(4, 4, 1, 100, false), 3);
        while sim.is_alive() {
            sim.step(Action::Straight);
        }
        let stats = sim.stats(3);
        sim.step(Action::TurnLeft);
        assert_eq!(sim.stats(3), stats);
        assert_eq!(sim.heading(), Heading::Right);
    }

    #[test]
    fn test_moving_onto_vacating_tail_is_safe() {
        let mut sim = Simulation::new(&config(10, 10, 4, 200, false), 0);
        sim.step(Action::TurnRight);
        sim.step(Action::TurnRight);
        assert!(!sim.is_danger_body(Action::TurnRight));
        sim.step(Action::TurnRight);
        assert!(sim.is_alive());
        assert_eq!(sim.head(), Position::new(4, 5));
        assert_eq!(sim.body_len(), 4);
    }

    #[test]
    fn test_self_collision() {
        let mut sim = Simulation::new(&config(10, 10, 5, 200, false), 0);
        sim.step(Action::TurnRight);
        sim.step(Action::TurnRight);
        assert!(sim.is_danger_body(Action::TurnRight));
        sim.step(Action::TurnRight);
        assert_eq!(sim.death_cause(), DeathCause::SelfCollision);
        assert_eq!(sim.tick(), 3);
    }

    #[test]
    fn test_wall_follower_reaches_timeout() {
        let mut sim = Simulation::new(&config(10, 10, 1, 200, false), 9);
        while sim.is_alive() {
            let action = wall_follower(&sim);
            sim.step(action);
        }
        let stats = sim.stats(9);
        assert_eq!(stats.death, DeathCause::Timeout);
        assert_eq!(stats.ticks, 200);
    }

    #[test]
    fn test_eating_adjacent_fruit() {
        let mut sim = Simulation::new(&config(10, 10, 2, 200, true), 5);
        let target = sim.head().step(Heading::Right);
        sim.fruit = Some(target);
        sim.step(Action::Straight);
        assert_eq!(sim.fruits_eaten(), 1);
        assert_eq!(sim.ticks_since_fruit(), 0);
        assert_eq!(sim.body_len(), 3);
        assert_eq!(sim.head(), target);
        let fruit = sim.fruit().unwrap();
        assert!(!sim.body().occupies(fruit));
    }

    #[test]
    fn test_progress_counts_only_improvements() {
        let mut sim = Simulation::new(&config(10, 10, 1, 200, true), 0);
        sim.fruit = Some(Position::new(8, 5));
        sim.fruit_baseline = 3.0;
        sim.step(Action::Straight);
        assert!((sim.progress_sum() - 1.0).abs() < f64::EPSILON);
        // Moving away only raises the baseline.
        sim.step(Action::TurnLeft);
        sim.step(Action::TurnLeft);
        assert!((sim.progress_sum() - 1.0).abs() < f64::EPSILON);
        sim.step(Action::TurnLeft);
        assert!((sim.progress_sum() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stall_precedes_timeout() {
        let config = EnvConfig::new(10, 10, 1, 3, 3, false).unwrap();
        let mut sim = Simulation::new(&config, 0);
        sim.step(Action::Straight);
        sim.step(Action::Straight);
        assert!(sim.is_alive());
        sim.step(Action::Straight);
        assert_eq!(sim.death_cause(), DeathCause::Stall);
    }

    #[test]
    fn test_danger_queries() {
        let mut sim = Simulation::new(&config(3, 3, 1, 200, false), 0);
        // Head at (1, 1) facing right.
        assert!(!sim.is_danger(Action::Straight));
        sim.step(Action::Straight);
        assert!(sim.is_danger_wall(Action::Straight));
        assert!(!sim.is_danger_wall(Action::TurnLeft));
        assert!(!sim.is_danger_body(Action::Straight));
        assert!(sim.is_danger(Action::Straight));
    }

    #[test]
    fn test_body_distance() {
        let mut sim = Simulation::new(&config(10, 10, 5, 200, false), 0);
        // Body: (5,5) (4,5) (3,5) (2,5) (1,5), heading right.
        assert_eq!(sim.body_distance(Action::Straight), 1.0);
        sim.step(Action::TurnRight);
        sim.step(Action::TurnRight);
        // Head (4,6) facing left; body above it at (4,5).
        let distance = sim.body_distance(Action::TurnRight);
        assert!((distance - 1.0 / 20.0).abs() < 1e-6);
        assert_eq!(sim.body_distance(Action::TurnLeft), 1.0);
    }

    #[test]
    fn test_fruit_direction_frames() {
        let mut sim = Simulation::new(&config(10, 10, 1, 200, true), 0);
        // Head (5,5) facing right; fruit two cells ahead and one below.
        sim.fruit = Some(Position::new(7, 6));
        let (x, y) = sim.fruit_direction();
        assert!((y - 2.0 / 20.0).abs() < 1e-6, "forward");
        assert!((x - 1.0 / 20.0).abs() < 1e-6, "right");

        sim.heading = Heading::Left;
        let (x, y) = sim.fruit_direction();
        assert!((y + 2.0 / 20.0).abs() < 1e-6);
        assert!((x + 1.0 / 20.0).abs() < 1e-6);

        assert!((sim.fruit_distance_norm() - 3.0 / 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_fruit_queries_without_fruit() {
        let sim = Simulation::new(&config(10, 10, 2, 200, false), 0);
        assert_eq!(sim.fruit_direction(), (0.0, 0.0));
        assert_eq!(sim.fruit_distance_norm(), 1.0);
        assert!((sim.length_norm() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_full_grid_leaves_no_fruit() {
        let config = EnvConfig::new(2, 1, 1, 10, 10, true).unwrap();
        let mut sim = Simulation::new(&config, 0);
        // Head (1, 0); the only empty cell is (0, 0).
        assert_eq!(sim.fruit(), Some(Position::new(0, 0)));
        sim.step(Action::TurnLeft);
        sim.step(Action::TurnLeft);
        assert_eq!(sim.death_cause(), DeathCause::Wall);

        let mut sim = Simulation::new(&config, 0);
        sim.heading = Heading::Left;
        sim.step(Action::Straight);
        assert_eq!(sim.fruits_eaten(), 1);
        assert_eq!(sim.fruit(), None);
        assert_eq!(sim.fruit_distance_norm(), 1.0);
    }
}
