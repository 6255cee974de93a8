//! Startup settings read from the environment.

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLS: usize = 10;
/// Largest accepted row or column count; keeps the drawn board inside
/// terminal coordinates.
pub const MAX_DIMENSION: usize = 1000;

pub const ROWS_VAR: &str = "TANK_MAZE_ROWS";
pub const COLS_VAR: &str = "TANK_MAZE_COLS";
pub const SEED_VAR: &str = "TANK_MAZE_SEED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub rows: usize,
    pub cols: usize,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            seed: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Missing, unparsable, zero or
    /// oversized dimensions fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let rows = lookup(ROWS_VAR)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| (1..=MAX_DIMENSION).contains(v))
            .unwrap_or(DEFAULT_ROWS);
        let cols = lookup(COLS_VAR)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| (1..=MAX_DIMENSION).contains(v))
            .unwrap_or(DEFAULT_COLS);
        let seed = lookup(SEED_VAR).and_then(|v| v.trim().parse::<u64>().ok());
        Self { rows, cols, seed }
    }
}
