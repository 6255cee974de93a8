//! Recursive backtracker carving followed by passage sealing.

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::direction::Direction;
use crate::error::MazeError;
use crate::grid::{Grid, Pos};

/// Order in which a sealed cell gives up one of its open walls.
const SEAL_PRIORITY: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::West,
    Direction::East,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SealReport {
    pub attempts: usize,
    pub resealed: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub grid: Grid,
    /// Cells in the order they were carved into, start cell excluded.
    pub carved_path: Vec<Pos>,
    pub seal: SealReport,
}

/// Number of seal attempts made for a maze of the given size.
pub fn seal_count(rows: usize, cols: usize) -> usize {
    rows.saturating_mul(cols) / 4
}

pub fn generate_maze(
    rng: &mut impl Rng,
    rows: usize,
    cols: usize,
) -> Result<Generation, MazeError> {
    let mut grid = Grid::new(rows, cols)?;
    let carved_path = carve(&mut grid, rng);
    let seal = seal_passages(&mut grid, carved_path.clone(), seal_count(rows, cols), rng);
    debug!(
        "generated {}x{} maze: {} passages carved, {} resealed, {} discarded",
        rows,
        cols,
        carved_path.len(),
        seal.resealed,
        seal.discarded
    );
    Ok(Generation {
        grid,
        carved_path,
        seal,
    })
}

/// Carves a spanning tree into a fully walled grid and returns the cells in
/// carving order.
pub(crate) fn carve(grid: &mut Grid, rng: &mut impl Rng) -> Vec<Pos> {
    let mut path = Vec::with_capacity(grid.len().saturating_sub(1));
    let start = match grid.pos_at(rng.gen_range(0..grid.len())) {
        Some(pos) => pos,
        None => return path,
    };

    let mut stack = vec![start];
    grid.mark_visited(start);

    while let Some(&current) = stack.last() {
        let options = unvisited_neighbors(grid, current);
        match options.choose(rng) {
            Some(&(dir, next)) => {
                grid.open_wall(current, dir);
                grid.mark_visited(next);
                stack.push(next);
                path.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }

    grid.clear_visited();
    path
}

fn unvisited_neighbors(grid: &Grid, pos: Pos) -> Vec<(Direction, Pos)> {
    let mut options = Vec::with_capacity(4);
    for dir in Direction::CARDINALS {
        if let Some(next) = grid.neighbor(pos, dir) {
            if grid.cell(next).is_some_and(|c| !c.visited()) {
                options.push((dir, next));
            }
        }
    }
    options
}

/// Recloses one open wall on `count` randomly drawn path cells. A drawn cell
/// with nothing left to close is dropped from the candidates; the attempt
/// still counts.
pub(crate) fn seal_passages(
    grid: &mut Grid,
    mut candidates: Vec<Pos>,
    count: usize,
    rng: &mut impl Rng,
) -> SealReport {
    let mut report = SealReport::default();

    while report.attempts < count {
        if candidates.is_empty() {
            warn!(
                "ran out of sealable cells after {} of {} attempts",
                report.attempts, count
            );
            break;
        }
        let pick = rng.gen_range(0..candidates.len());
        let pos = candidates[pick];
        report.attempts += 1;

        let open = grid
            .cell(pos)
            .and_then(|cell| SEAL_PRIORITY.into_iter().find(|dir| cell.is_open(*dir)));
        match open {
            Some(dir) => {
                grid.close_wall(pos, dir);
                report.resealed += 1;
            }
            None => {
                candidates.retain(|p| *p != pos);
                report.discarded += 1;
            }
        }
    }

    report
}
