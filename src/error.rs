//! Error taxonomy shared by the board model, the cascade engine and the search.

use thiserror::Error;

/// Errors surfaced by the crush engine.
///
/// Validation failures on inputs to the pure helpers are reported immediately;
/// they indicate a caller bug upstream (e.g. a harness offering an illegal move).
/// Dead ends reached during search are not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrushError {
    /// A mandatory input was missing or malformed.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The two tiles of a swap are not orthogonally adjacent.
    #[error("invalid move: ({x1}, {y1}) and ({x2}, {y2}) are not adjacent")]
    InvalidMove {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
    },
    /// Coordinates outside of the grid.
    #[error("coordinates ({x}, {y}) are outside of the {width}x{height} board")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    /// Nothing legal to play.
    #[error("no available move")]
    NoAvailableMove,
    /// A color value outside of the palette.
    #[error("color {0} is not part of the palette")]
    InvalidColor(u8),
    /// A raw direction code the harness encoding does not define.
    #[error("direction code {0} is not one of UP, DOWN, LEFT, RIGHT")]
    InvalidDirection(u8),
}

pub type Result<T> = std::result::Result<T, CrushError>;
