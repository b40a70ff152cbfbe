use std::collections::VecDeque;

use super::geometry::Position;

/// The snake's body: an ordered run of distinct cells, head first.
///
/// Cells live in a ring buffer sized to the whole grid, so growing or sliding
/// the body never reallocates. An occupancy grid mirrors the ring buffer for
/// constant-time membership tests.
#[derive(Debug, Clone)]
pub struct Body {
    width: usize,
    height: usize,
    cells: VecDeque<Position>,
    occupied: Vec<bool>,
}

impl Body {
    /// Creates a body from `cells` (head first) on a `width × height` grid.
    ///
    /// # Panics
    ///
    /// Panics if `cells` is empty, contains an out-of-bounds cell, or
    /// contains the same cell twice.
    #[must_use]
    pub fn new<I>(width: usize, height: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut body = Self {
            width,
            height,
            cells: VecDeque::with_capacity(width * height),
            occupied: vec![false; width * height],
        };
        for cell in cells {
            let index = body.index_of(cell).expect("body cell must be on the grid");
            assert!(!body.occupied[index], "body cells must be distinct");
            body.occupied[index] = true;
            body.cells.push_back(cell);
        }
        assert!(!body.cells.is_empty(), "body must have at least one cell");
        body
    }

    #[must_use]
    pub fn head(&self) -> Position {
        self.cells[0]
    }

    #[must_use]
    pub fn tail(&self) -> Position {
        self.cells[self.cells.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over the body cells from head to tail.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }

    /// Returns `true` if `pos` is inside the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index_of(pos).is_some()
    }

    /// Returns `true` if any body cell, tail included, occupies `pos`.
    #[must_use]
    pub fn occupies(&self, pos: Position) -> bool {
        self.index_of(pos).is_some_and(|i| self.occupied[i])
    }

    /// Returns `true` if a body cell other than the current tail occupies `pos`.
    ///
    /// The tail vacates its cell on a non-growing move, so it is not an obstacle
    /// for the head's next step.
    #[must_use]
    pub fn occupies_except_tail(&self, pos: Position) -> bool {
        self.occupies(pos) && pos != self.tail()
    }

    /// Moves the head onto `new_head`.
    ///
    /// When `grow` is `false` the tail cell is released, keeping the length
    /// constant; otherwise the body becomes one cell longer.
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        if !grow {
            if let Some(tail) = self.cells.pop_back() {
                self.set_occupied(tail, false);
            }
        }
        self.set_occupied(new_head, true);
        self.cells.push_front(new_head);
    }

    /// Iterates over every grid cell not covered by the body, in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(|(i, _)| self.position_of(i))
    }

    /// Number of grid cells not covered by the body.
    #[must_use]
    pub fn empty_count(&self) -> usize {
        self.occupied.len() - self.cells.len()
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        let x = usize::try_from(pos.x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(pos.y).ok().filter(|y| *y < self.height)?;
        Some(y * self.width + x)
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn position_of(&self, index: usize) -> Position {
        Position::new((index % self.width) as i32, (index / self.width) as i32)
    }

    fn set_occupied(&mut self, pos: Position, occupied: bool) {
        let index = self
            .index_of(pos)
            .expect("body cells are kept inside the grid");
        self.occupied[index] = occupied;
    }
}
