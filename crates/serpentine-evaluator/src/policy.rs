//! Fixed-topology feed-forward policy network.
//!
//! A network maps an observation vector to one of the three relative actions.
//! Layers are fully connected: hidden layers use ReLU, the output layer is
//! linear, and the chosen action is the arg-max of the outputs (ties go to the
//! lowest index).
//!
//! # Genome layout
//!
//! The whole network is a single flat `f32` vector. For each layer in order,
//! for each output unit, the unit's bias comes first, followed by one weight
//! per input unit:
//!
//! ```text
//! [b0, w0_0, w0_1, .., b1, w1_0, w1_1, .., (next layer) ..]
//! ```
//!
//! so a genome has `Σ (inputs + 1) × outputs` genes.
//!
//! # Example
//!
//! ```
//! use serpentine_evaluator::policy::{PolicyNetwork, Topology};
//! use serpentine_engine::Action;
//!
//! let topology = Topology::new(3, 4, 0)?;
//! assert_eq!(topology.genome_len(), (3 + 1) * 4 + (4 + 1) * 3);
//!
//! let mut network = PolicyNetwork::new(topology);
//! // All-zero weights tie every output, so the first action wins.
//! assert_eq!(network.forward(&[1.0, 0.0, 0.0]), Action::Straight);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use arrayvec::ArrayVec;
use serpentine_engine::Action;

/// Width of the output layer: one unit per action.
pub const OUTPUT_LEN: usize = Action::LEN;

const MAX_LAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TopologyError {
    #[display("network input width must be at least 1")]
    ZeroInput,
    #[display("first hidden layer width must be at least 1")]
    ZeroHidden,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("genome has {actual} genes but the network expects {expected}")]
pub struct GenomeLengthError {
    pub expected: usize,
    pub actual: usize,
}

/// Shape of one fully connected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerShape {
    pub inputs: usize,
    pub outputs: usize,
}

impl LayerShape {
    /// Number of genes (biases and weights) the layer consumes.
    #[must_use]
    pub const fn param_count(self) -> usize {
        (self.inputs + 1) * self.outputs
    }
}

/// Layer widths of a policy network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    input: usize,
    hidden1: usize,
    hidden2: Option<usize>,
    layers: ArrayVec<LayerShape, MAX_LAYERS>,
}

impl Topology {
    /// Builds a topology `input → hidden1 → [hidden2] → 3`.
    ///
    /// A `hidden2` of zero omits the second hidden layer.
    pub fn new(input: usize, hidden1: usize, hidden2: usize) -> Result<Self, TopologyError> {
        if input == 0 {
            return Err(TopologyError::ZeroInput);
        }
        if hidden1 == 0 {
            return Err(TopologyError::ZeroHidden);
        }
        let hidden2 = (hidden2 > 0).then_some(hidden2);

        let mut layers = ArrayVec::new();
        layers.push(LayerShape {
            inputs: input,
            outputs: hidden1,
        });
        let last_hidden = match hidden2 {
            Some(hidden2) => {
                layers.push(LayerShape {
                    inputs: hidden1,
                    outputs: hidden2,
                });
                hidden2
            }
            None => hidden1,
        };
        layers.push(LayerShape {
            inputs: last_hidden,
            outputs: OUTPUT_LEN,
        });

        Ok(Self {
            input,
            hidden1,
            hidden2,
            layers,
        })
    }

    #[must_use]
    pub const fn input(&self) -> usize {
        self.input
    }

    #[must_use]
    pub const fn hidden1(&self) -> usize {
        self.hidden1
    }

    #[must_use]
    pub const fn hidden2(&self) -> Option<usize> {
        self.hidden2
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerShape] {
        &self.layers
    }

    /// Total number of genes a genome for this topology must have.
    #[must_use]
    pub fn genome_len(&self) -> usize {
        self.layers.iter().map(|layer| layer.param_count()).sum()
    }

    /// Checks that `genome` has exactly [`genome_len`](Self::genome_len) genes.
    pub fn check_genome(&self, genome: &[f32]) -> Result<(), GenomeLengthError> {
        let expected = self.genome_len();
        if genome.len() == expected {
            Ok(())
        } else {
            Err(GenomeLengthError {
                expected,
                actual: genome.len(),
            })
        }
    }
}

/// A policy network with its own weights and activation buffers.
///
/// Activation buffers are allocated once at construction, so
/// [`forward`](Self::forward) never allocates.
#[derive(Debug, Clone)]
pub struct PolicyNetwork {
    topology: Topology,
    weights: Vec<f32>,
    activations: ArrayVec<Vec<f32>, MAX_LAYERS>,
}

impl PolicyNetwork {
    /// Creates a network with all weights set to zero.
    #[must_use]
    pub fn new(topology: Topology) -> Self {
        let weights = vec![0.0; topology.genome_len()];
        let activations = topology
            .layers()
            .iter()
            .map(|layer| vec![0.0; layer.outputs])
            .collect();
        Self {
            topology,
            weights,
            activations,
        }
    }

    /// Creates a network and loads `genome` into it.
    pub fn from_genome(topology: Topology, genome: &[f32]) -> Result<Self, GenomeLengthError> {
        let mut network = Self::new(topology);
        network.load_genome(genome)?;
        Ok(network)
    }

    /// Replaces the weights with a copy of `genome`.
    pub fn load_genome(&mut self, genome: &[f32]) -> Result<(), GenomeLengthError> {
        self.topology.check_genome(genome)?;
        self.weights.copy_from_slice(genome);
        Ok(())
    }

    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn genome(&self) -> &[f32] {
        &self.weights
    }

    /// Chooses an action for `input`.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not match the topology's input width.
    pub fn forward(&mut self, input: &[f32]) -> Action {
        let outputs = self.forward_raw(input);
        let mut best = 0;
        for (i, value) in outputs.iter().enumerate().skip(1) {
            if *value > outputs[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    /// Runs the network and returns the raw output activations.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not match the topology's input width.
    pub fn forward_raw(&mut self, input: &[f32]) -> &[f32] {
        assert_eq!(
            input.len(),
            self.topology.input(),
            "observation width does not match the network input"
        );

        let last = self.activations.len() - 1;
        let mut offset = 0;
        for (i, layer) in self.topology.layers.iter().enumerate() {
            let (done, rest) = self.activations.split_at_mut(i);
            let source: &[f32] = if i == 0 { input } else { &done[i - 1] };
            let stride = layer.inputs + 1;
            for unit in &mut rest[0] {
                let params = &self.weights[offset..offset + stride];
                let sum = params[1..]
                    .iter()
                    .zip(source)
                    .fold(params[0], |acc, (w, x)| acc + x * w);
                *unit = if i == last { sum } else { relu(sum) };
                offset += stride;
            }
        }
        &self.activations[last]
    }
}

fn relu(x: f32) -> f32 {
    if x > 0.0 { x } else { 0.0 }
}
