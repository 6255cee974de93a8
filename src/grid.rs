//! Cells, positions and the fixed-size grid that owns them.
//!
//! Walls between neighbors are stored twice, once on each side. The only way
//! to change a wall is through [`Grid::open_wall`] and [`Grid::close_wall`],
//! which always update both copies together.

use crate::direction::Direction;
use crate::error::MazeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    row: usize,
    col: usize,
    north_blocked: bool,
    south_blocked: bool,
    east_blocked: bool,
    west_blocked: bool,
    visited: bool,
}

impl Cell {
    fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            north_blocked: true,
            south_blocked: true,
            east_blocked: true,
            west_blocked: true,
            visited: false,
        }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.row, self.col)
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn visited(&self) -> bool {
        self.visited
    }

    /// Whether the wall on the given side is standing. `Direction::None` is
    /// treated as blocked.
    pub fn is_blocked(&self, dir: Direction) -> bool {
        match dir {
            Direction::North => self.north_blocked,
            Direction::South => self.south_blocked,
            Direction::East => self.east_blocked,
            Direction::West => self.west_blocked,
            Direction::None => true,
        }
    }

    pub fn is_open(&self, dir: Direction) -> bool {
        !self.is_blocked(dir)
    }

    fn set_blocked(&mut self, dir: Direction, blocked: bool) {
        match dir {
            Direction::North => self.north_blocked = blocked,
            Direction::South => self.south_blocked = blocked,
            Direction::East => self.east_blocked = blocked,
            Direction::West => self.west_blocked = blocked,
            Direction::None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid with every wall standing and nothing visited.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MazeError> {
        if rows == 0 || cols == 0 {
            return Err(MazeError::EmptyDimensions { rows, cols });
        }
        let len = rows
            .checked_mul(cols)
            .ok_or(MazeError::TooLarge { rows, cols })?;

        let mut cells = Vec::with_capacity(len);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(row, col));
            }
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell count; never zero since empty dimensions are rejected.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if self.contains(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Position at a row-major index.
    pub fn pos_at(&self, index: usize) -> Option<Pos> {
        if index < self.cells.len() {
            Some(Pos::new(index / self.cols, index % self.cols))
        } else {
            None
        }
    }

    pub fn neighbor(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        if dir.is_none() || !self.contains(pos) {
            return None;
        }
        let (dr, dc) = dir.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        let next = Pos::new(row, col);
        if self.contains(next) {
            Some(next)
        } else {
            None
        }
    }

    /// True when a neighbor exists in `dir` and the wall toward it is open.
    pub fn is_passable(&self, pos: Pos, dir: Direction) -> bool {
        match (self.cell(pos), self.neighbor(pos, dir)) {
            (Some(cell), Some(_)) => cell.is_open(dir),
            _ => false,
        }
    }

    /// Knocks down the wall on the `dir` side of `pos` and the matching wall
    /// of the neighbor. At the boundary only the own side is cleared.
    /// Returns the neighbor that was touched, if any.
    pub fn open_wall(&mut self, pos: Pos, dir: Direction) -> Option<Pos> {
        self.set_wall(pos, dir, false)
    }

    /// Inverse of [`Grid::open_wall`].
    pub fn close_wall(&mut self, pos: Pos, dir: Direction) -> Option<Pos> {
        self.set_wall(pos, dir, true)
    }

    fn set_wall(&mut self, pos: Pos, dir: Direction, blocked: bool) -> Option<Pos> {
        if dir.is_none() || !self.contains(pos) {
            return None;
        }
        let idx = self.index(pos);
        self.cells[idx].set_blocked(dir, blocked);

        let next = self.neighbor(pos, dir)?;
        let next_idx = self.index(next);
        self.cells[next_idx].set_blocked(dir.opposite(), blocked);
        Some(next)
    }

    pub fn mark_visited(&mut self, pos: Pos) {
        if self.contains(pos) {
            let idx = self.index(pos);
            self.cells[idx].visited = true;
        }
    }

    pub fn clear_visited(&mut self) {
        for cell in &mut self.cells {
            cell.visited = false;
        }
    }

    /// Number of open passages between neighboring cells. Boundary walls
    /// knocked open from the inside are not counted.
    pub fn open_passages(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| {
                [Direction::South, Direction::East]
                    .iter()
                    .filter(|dir| self.is_passable(cell.pos(), **dir))
                    .count()
            })
            .sum()
    }

    /// Checks that every shared wall agrees on both sides.
    pub fn is_consistent(&self) -> bool {
        self.cells.iter().all(|cell| {
            Direction::CARDINALS.iter().all(|dir| {
                match self.neighbor(cell.pos(), *dir).and_then(|n| self.cell(n)) {
                    Some(other) => cell.is_blocked(*dir) == other.is_blocked(dir.opposite()),
                    None => true,
                }
            })
        })
    }

    fn index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }
}
