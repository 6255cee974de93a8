//! Maze generation and game state for a tank that blasts its way to the goal.
//!
//! A maze is carved as a spanning tree with a randomized depth-first search,
//! then a quarter of the cells get one passage resealed. The [`Engine`] owns
//! the resulting [`Grid`] together with the tank, the goal and the trail of
//! cells walked so far.

pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod generator;
pub mod grid;

pub use direction::Direction;
pub use engine::{Engine, GameEvent, Tank, STARTING_SHELLS};
pub use error::MazeError;
pub use generator::{generate_maze, Generation, SealReport};
pub use grid::{Cell, Grid, Pos};
