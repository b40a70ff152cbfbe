//! Genome operations for the genetic algorithm.
//!
//! A genome is the flat `f32` weight vector of a policy network (see
//! [`serpentine_evaluator::policy`] for the layout). These functions implement
//! the variation operators used by
//! [`PopulationEvolver`](crate::genetic::PopulationEvolver):
//!
//! - **Initialization**: [`random`] draws every gene from `N(0, 2 / len)`
//! - **Crossover**: [`uniform_crossover`] picks each gene from either parent
//! - **Mutation**: [`mutate`] resets or perturbs genes independently
//! - **Reset**: [`reinitialize`] overwrites a whole genome with fresh `N(0, 0.5²)` genes
//!
//! All operators take the random source explicitly; none of them keep state.

use rand::Rng;
use rand_distr::{Distribution as _, Normal, NormalError, StandardNormal};

/// Standard deviation of genes drawn by a reset.
pub const RESET_SIGMA: f64 = 0.5;

/// Draws a genome with a scaled normal ("Xavier-like") distribution.
///
/// Each gene is sampled from `N(0, scale²)` with `scale = sqrt(2 / len)`.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
/// use serpentine_training::genome;
///
/// let mut rng = Pcg32::seed_from_u64(1);
/// let genes = genome::random(&mut rng, 59);
/// assert_eq!(genes.len(), 59);
/// assert!(genes.iter().all(|g| g.abs() < 2.0));
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn random<R>(rng: &mut R, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    if len == 0 {
        return vec![];
    }
    let scale = (2.0 / len as f64).sqrt();
    (0..len).map(|_| scaled_normal(rng, scale)).collect()
}

/// Overwrites every gene with a fresh `N(0, 0.5²)` draw.
pub fn reinitialize<R>(genome: &mut [f32], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for gene in genome {
        *gene = scaled_normal(rng, RESET_SIGMA);
    }
}

/// Builds a child by taking each gene from `p1` or `p2` with equal odds.
///
/// # Panics
///
/// Panics if the parents have different lengths.
pub fn uniform_crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len(), "parents must have equal genome length");
    p1.iter()
        .zip(p2)
        .map(|(&a, &b)| if rng.random_bool(0.5) { b } else { a })
        .collect()
}

/// Per-gene mutation probabilities and magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationParams {
    rate: f64,
    reset_p: f64,
    perturbation: Normal<f64>,
}

impl MutationParams {
    /// Validates mutation parameters.
    ///
    /// `rate` and `reset_p` must be probabilities; `sigma` must be a finite,
    /// non-negative standard deviation.
    pub fn new(rate: f64, sigma: f64, reset_p: f64) -> Result<Self, MutationParamsError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(MutationParamsError::Probability {
                name: "rate",
                value: rate,
            });
        }
        if !(0.0..=1.0).contains(&reset_p) {
            return Err(MutationParamsError::Probability {
                name: "reset probability",
                value: reset_p,
            });
        }
        let perturbation = Normal::new(0.0, sigma).map_err(MutationParamsError::Sigma)?;
        Ok(Self {
            rate,
            reset_p,
            perturbation,
        })
    }

    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.perturbation.std_dev()
    }

    #[must_use]
    pub const fn reset_p(&self) -> f64 {
        self.reset_p
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum MutationParamsError {
    #[display("mutation {name} must be within [0, 1] (got {value})")]
    Probability { name: &'static str, value: f64 },
    #[display("invalid mutation sigma: {_0}")]
    Sigma(NormalError),
}

/// Mutates a genome in place.
///
/// Each gene is handled independently. First, with probability `reset_p`, the
/// gene is replaced by a fresh `N(0, 0.5²)` draw. Otherwise, with probability
/// `rate`, `N(0, sigma²)` noise is added to it.
pub fn mutate<R>(genome: &mut [f32], params: &MutationParams, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for gene in genome {
        if rng.random_bool(params.reset_p) {
            *gene = scaled_normal(rng, RESET_SIGMA);
        } else if rng.random_bool(params.rate) {
            *gene += narrow(params.perturbation.sample(rng));
        }
    }
}

fn scaled_normal<R>(rng: &mut R, scale: f64) -> f32
where
    R: Rng + ?Sized,
{
    let z: f64 = rng.sample(StandardNormal);
    narrow(z * scale)
}

#[expect(clippy::cast_possible_truncation)]
fn narrow(value: f64) -> f32 {
    value as f32
}
