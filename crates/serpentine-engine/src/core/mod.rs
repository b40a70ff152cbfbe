//! Core data structures: grid geometry and the snake body.

pub use self::{body::*, geometry::*};

pub(crate) mod body;
pub(crate) mod geometry;
