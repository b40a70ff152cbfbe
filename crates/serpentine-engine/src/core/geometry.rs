use serde::{Deserialize, Serialize};

/// A cell on the grid.
///
/// The origin `(0, 0)` is the top-left corner; `x` grows rightward and `y` grows
/// downward. Coordinates are signed so that a step off the grid is representable
/// and can be rejected by a bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell one step away in `heading`.
    #[must_use]
    pub const fn step(self, heading: Heading) -> Self {
        self.offset(heading, 1)
    }

    /// Returns the cell `distance` steps away in `heading`.
    #[must_use]
    pub const fn offset(self, heading: Heading, distance: i32) -> Self {
        let (dx, dy) = heading.unit_vector();
        Self {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
        }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Absolute heading of the snake.
///
/// The variants are listed in clockwise rotational order, and their ordinals
/// (`Up = 0` .. `Left = 3`) are what turning arithmetic operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    #[display("up")]
    Up,
    #[display("right")]
    Right,
    #[display("down")]
    Down,
    #[display("left")]
    Left,
}

impl Heading {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Self {
        Self::ALL[(ordinal % 4) as usize]
    }

    /// Applies a relative action to this heading.
    ///
    /// `TurnLeft` rotates by −1 (mod 4), `TurnRight` by +1 (mod 4). No action
    /// produces a reversal.
    #[must_use]
    pub const fn turned(self, action: Action) -> Self {
        match action {
            Action::Straight => self,
            Action::TurnLeft => Self::from_ordinal(self.ordinal() + 3),
            Action::TurnRight => Self::from_ordinal(self.ordinal() + 1),
        }
    }

    /// World-space `(dx, dy)` of a single step in this heading.
    #[must_use]
    pub const fn unit_vector(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Rotates a world-space vector into this heading's frame.
    ///
    /// In the returned `(x, y)`, `y` points forward and `x` points to the
    /// snake's right-hand side.
    #[must_use]
    pub fn to_relative(self, dx: f32, dy: f32) -> (f32, f32) {
        match self {
            Self::Up => (dx, -dy),
            Self::Right => (dy, dx),
            Self::Down => (-dx, dy),
            Self::Left => (-dy, -dx),
        }
    }
}

/// Action chosen by a policy each tick, relative to the current heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[display("straight")]
    Straight,
    #[display("left")]
    TurnLeft,
    #[display("right")]
    TurnRight,
}

impl Action {
    /// Number of actions, which is also the policy network's output width.
    pub const LEN: usize = 3;
    /// Actions ordered by their policy output index.
    pub const ALL: [Self; Self::LEN] = [Self::Straight, Self::TurnLeft, Self::TurnRight];

    /// Maps a policy output index to an action.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_left_then_right_is_identity() {
        for heading in Heading::ALL {
            assert_eq!(
                heading.turned(Action::TurnLeft).turned(Action::TurnRight),
                heading
            );
            assert_eq!(
                heading.turned(Action::TurnRight).turned(Action::TurnLeft),
                heading
            );
        }
    }

    #[test]
    fn test_turn_never_reverses() {
        for heading in Heading::ALL {
            for action in Action::ALL {
                let (dx, dy) = heading.unit_vector();
                let (tx, ty) = heading.turned(action).unit_vector();
                assert_ne!((dx + tx, dy + ty), (0, 0), "{heading} + {action}");
            }
        }
    }

    #[test]
    fn test_turn_mapping() {
        assert_eq!(Heading::Up.turned(Action::TurnLeft), Heading::Left);
        assert_eq!(Heading::Up.turned(Action::TurnRight), Heading::Right);
        assert_eq!(Heading::Left.turned(Action::TurnRight), Heading::Up);
        assert_eq!(Heading::Down.turned(Action::Straight), Heading::Down);
    }

    #[test]
    fn test_relative_frame_forward_and_right() {
        for heading in Heading::ALL {
            let (fx, fy) = heading.unit_vector();
            #[expect(clippy::cast_precision_loss)]
            let forward = heading.to_relative(fx as f32, fy as f32);
            assert_eq!(forward, (0.0, 1.0), "forward for {heading}");

            let (rx, ry) = heading.turned(Action::TurnRight).unit_vector();
            #[expect(clippy::cast_precision_loss)]
            let right = heading.to_relative(rx as f32, ry as f32);
            assert_eq!(right, (1.0, 0.0), "right for {heading}");
        }
    }

    #[test]
    fn test_manhattan_distance() {
        let a = Position::new(1, 2);
        let b = Position::new(4, -2);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
        assert_eq!(a.offset(Heading::Down, 3), Position::new(1, 5));
    }

    #[test]
    fn test_action_index_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(3), None);
    }
}
