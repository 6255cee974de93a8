//! Game state: the maze, the tank driving through it, the goal and the
//! trail of cells between the start and the tank.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::direction::Direction;
use crate::error::MazeError;
use crate::generator::{generate_maze, SealReport};
use crate::grid::{Grid, Pos};

pub const STARTING_SHELLS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Moved { from: Pos, to: Pos },
    CannonPrimed(Direction),
    CannonDisarmed,
    WallBlasted { from: Pos, toward: Direction },
    Solved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tank {
    pos: Pos,
    last_direction: Direction,
    shells: u32,
    aim: Direction,
}

impl Tank {
    pub fn new(pos: Pos) -> Self {
        Self {
            pos,
            last_direction: Direction::None,
            shells: STARTING_SHELLS,
            aim: Direction::None,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    pub fn shells(&self) -> u32 {
        self.shells
    }

    pub fn aim(&self) -> Direction {
        self.aim
    }

    pub fn is_armed(&self) -> bool {
        !self.aim.is_none()
    }
}

type Listener = Box<dyn FnMut(&GameEvent)>;

pub struct Engine<R: Rng = StdRng> {
    rng: R,
    grid: Grid,
    tank: Tank,
    goal: Pos,
    history: Vec<Pos>,
    seal: SealReport,
    listeners: Vec<Listener>,
}

impl Engine<StdRng> {
    /// Engine whose mazes are reproducible from `seed`.
    pub fn seeded(rows: usize, cols: usize, seed: u64) -> Result<Self, MazeError> {
        Self::new(rows, cols, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Engine<R> {
    pub fn new(rows: usize, cols: usize, mut rng: R) -> Result<Self, MazeError> {
        let level = Level::build(&mut rng, rows, cols)?;
        Ok(Self {
            rng,
            grid: level.grid,
            tank: Tank::new(level.start),
            goal: level.goal,
            history: vec![level.start],
            seal: level.seal,
            listeners: Vec::new(),
        })
    }

    /// Replaces the maze with a freshly generated one. On error the current
    /// maze is kept.
    pub fn initialize(&mut self, rows: usize, cols: usize) -> Result<(), MazeError> {
        let level = Level::build(&mut self.rng, rows, cols)?;
        self.grid = level.grid;
        self.tank = Tank::new(level.start);
        self.goal = level.goal;
        self.history.clear();
        self.history.push(level.start);
        self.seal = level.seal;
        Ok(())
    }

    /// New maze with the current dimensions.
    pub fn restart(&mut self) -> Result<(), MazeError> {
        self.initialize(self.grid.rows(), self.grid.cols())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn can_move(&self, pos: Pos, dir: Direction) -> bool {
        self.grid.is_passable(pos, dir)
    }

    pub fn move_actor(&mut self, dir: Direction) -> bool {
        let from = self.tank.pos;
        if !self.can_move(from, dir) {
            return false;
        }
        let Some(to) = self.grid.neighbor(from, dir) else {
            return false;
        };

        self.tank.pos = to;
        self.tank.last_direction = dir;
        if let Some(first) = self.history.iter().position(|p| *p == to) {
            self.history.truncate(first);
        }
        self.history.push(to);
        trace!(
            "tank moved {} to ({}, {}), trail length {}",
            dir.name(),
            to.row,
            to.col,
            self.history.len()
        );

        self.emit(GameEvent::Moved { from, to });
        if self.is_solved() {
            debug!("goal reached at ({}, {})", to.row, to.col);
            self.emit(GameEvent::Solved);
        }
        true
    }

    /// Points the cannon, or lowers it again with `Direction::None`. Does
    /// nothing once the shells are gone.
    pub fn aim_cannon(&mut self, dir: Direction) -> bool {
        if self.tank.shells == 0 {
            return false;
        }
        self.tank.aim = dir;
        if dir.is_none() {
            self.emit(GameEvent::CannonDisarmed);
        } else {
            self.emit(GameEvent::CannonPrimed(dir));
        }
        true
    }

    /// Fires the primed cannon at the wall it points to. Returns false when
    /// nothing was fired.
    pub fn blast_wall(&mut self) -> bool {
        if self.tank.shells == 0 || !self.tank.is_armed() {
            return false;
        }
        let from = self.tank.pos;
        let toward = self.tank.aim;
        self.grid.open_wall(from, toward);
        self.tank.shells -= 1;
        self.tank.aim = Direction::None;
        debug_assert!(self.grid.is_consistent());
        trace!(
            "blasted {} wall of ({}, {}), {} shells left",
            toward.name(),
            from.row,
            from.col,
            self.tank.shells
        );

        self.emit(GameEvent::WallBlasted { from, toward });
        true
    }

    pub fn is_solved(&self) -> bool {
        self.tank.pos == self.goal
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn actor(&self) -> &Tank {
        &self.tank
    }

    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn move_history(&self) -> &[Pos] {
        &self.history
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn last_seal(&self) -> SealReport {
        self.seal
    }

    fn emit(&mut self, event: GameEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

/// Everything a fresh maze needs before it is swapped into the engine.
struct Level {
    grid: Grid,
    start: Pos,
    goal: Pos,
    seal: SealReport,
}

impl Level {
    fn build(rng: &mut impl Rng, rows: usize, cols: usize) -> Result<Self, MazeError> {
        let generation = generate_maze(rng, rows, cols)?;
        let grid = generation.grid;
        let cells = grid.len();
        if cells < 2 {
            return Err(MazeError::TooSmall { rows, cols });
        }

        let start_idx = rng.gen_range(0..cells);
        // Draw among the other cells so the goal never lands on the start.
        let mut goal_idx = rng.gen_range(0..cells - 1);
        if goal_idx >= start_idx {
            goal_idx += 1;
        }
        let (start, goal) = match (grid.pos_at(start_idx), grid.pos_at(goal_idx)) {
            (Some(start), Some(goal)) => (start, goal),
            _ => return Err(MazeError::TooSmall { rows, cols }),
        };

        debug!(
            "new {}x{} maze: start ({}, {}), goal ({}, {})",
            rows, cols, start.row, start.col, goal.row, goal.col
        );
        Ok(Self {
            grid,
            start,
            goal,
            seal: generation.seal,
        })
    }
}
