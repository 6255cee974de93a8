/// Errors raised when a maze cannot be built with the requested dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("maze dimensions must be positive, got {rows}x{cols}")]
    EmptyDimensions { rows: usize, cols: usize },

    #[error("maze dimensions {rows}x{cols} overflow the cell count")]
    TooLarge { rows: usize, cols: usize },

    #[error("a {rows}x{cols} maze has no room for a goal apart from the start")]
    TooSmall { rows: usize, cols: usize },
}
