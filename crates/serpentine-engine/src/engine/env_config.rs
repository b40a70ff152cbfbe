use serde::{Deserialize, Serialize};

/// Error raised when environment parameters cannot describe a playable grid.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EnvConfigError {
    #[display("grid must be at least 1x1 (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[display("grid {width}x{height} is too large")]
    GridTooLarge { width: usize, height: usize },
    #[display("start length must be at least 1")]
    ZeroStartLength,
    #[display(
        "start length {start_length} does not fit left of the centre column of a {width}-wide grid"
    )]
    StartLengthTooLong { start_length: usize, width: usize },
    #[display("tick cap must be at least 1")]
    ZeroTickCap,
    #[display("stall window must be at least 1")]
    ZeroStallWindow,
}

/// Environment parameters for a simulation.
///
/// Values are validated on construction (and on deserialization), so a
/// [`Simulation`](crate::Simulation) can always be built from an `EnvConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvConfig", into = "RawEnvConfig")]
pub struct EnvConfig {
    width: usize,
    height: usize,
    start_length: usize,
    tick_cap: u32,
    stall_window: u32,
    fruit_enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawEnvConfig {
    width: usize,
    height: usize,
    start_length: usize,
    tick_cap: u32,
    stall_window: u32,
    fruit_enabled: bool,
}

impl TryFrom<RawEnvConfig> for EnvConfig {
    type Error = EnvConfigError;

    fn try_from(raw: RawEnvConfig) -> Result<Self, Self::Error> {
        Self::new(
            raw.width,
            raw.height,
            raw.start_length,
            raw.tick_cap,
            raw.stall_window,
            raw.fruit_enabled,
        )
    }
}

impl From<EnvConfig> for RawEnvConfig {
    fn from(config: EnvConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            start_length: config.start_length,
            tick_cap: config.tick_cap,
            stall_window: config.stall_window,
            fruit_enabled: config.fruit_enabled,
        }
    }
}

impl EnvConfig {
    /// Validates and builds an environment configuration.
    ///
    /// The snake spawns at the centre cell `(width / 2, height / 2)` facing right
    /// with its body extending leftwards, so `start_length` may be at most
    /// `width / 2 + 1`.
    pub fn new(
        width: usize,
        height: usize,
        start_length: usize,
        tick_cap: u32,
        stall_window: u32,
        fruit_enabled: bool,
    ) -> Result<Self, EnvConfigError> {
        if width == 0 || height == 0 {
            return Err(EnvConfigError::EmptyGrid { width, height });
        }
        let too_large = i32::try_from(width).is_err()
            || i32::try_from(height).is_err()
            || width.checked_mul(height).is_none();
        if too_large {
            return Err(EnvConfigError::GridTooLarge { width, height });
        }
        if start_length == 0 {
            return Err(EnvConfigError::ZeroStartLength);
        }
        if start_length > width / 2 + 1 {
            return Err(EnvConfigError::StartLengthTooLong {
                start_length,
                width,
            });
        }
        if tick_cap == 0 {
            return Err(EnvConfigError::ZeroTickCap);
        }
        if stall_window == 0 {
            return Err(EnvConfigError::ZeroStallWindow);
        }
        Ok(Self {
            width,
            height,
            start_length,
            tick_cap,
            stall_window,
            fruit_enabled,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn start_length(&self) -> usize {
        self.start_length
    }

    #[must_use]
    pub const fn tick_cap(&self) -> u32 {
        self.tick_cap
    }

    #[must_use]
    pub const fn stall_window(&self) -> u32 {
        self.stall_window
    }

    #[must_use]
    pub const fn fruit_enabled(&self) -> bool {
        self.fruit_enabled
    }

    /// Returns a copy with a different tick cap.
    pub fn with_tick_cap(self, tick_cap: u32) -> Result<Self, EnvConfigError> {
        Self::new(
            self.width,
            self.height,
            self.start_length,
            tick_cap,
            self.stall_window,
            self.fruit_enabled,
        )
    }

    /// Returns a copy with a different stall window.
    pub fn with_stall_window(self, stall_window: u32) -> Result<Self, EnvConfigError> {
        Self::new(
            self.width,
            self.height,
            self.start_length,
            self.tick_cap,
            stall_window,
            self.fruit_enabled,
        )
    }

    /// Number of cells on the grid.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// `width + height`, the normaliser for distances and ray lengths.
    #[must_use]
    pub const fn perimeter(&self) -> usize {
        self.width + self.height
    }
}
