//! Board model for the tile-swap matching game.
//!
//! This module defines the game's fundamental components:
//! - `Color`: one entry of the fixed tile palette.
//! - `Tile`: a colored cell with positional identity.
//! - `Board`: a fixed-size grid of tiles, value-like snapshots with swap support.
//! - `Direction`, `DirectedMove`, `PlayerMove`: the two encodings of a swap move.
//!
//! Coordinates are `(x, y)` with `x` the column and `y` the row; `y = 0` is the
//! top row and gravity pulls tiles towards larger `y`.
use crate::error::{CrushError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Number of distinct tile colors. Valid colors are `0..PALETTE_SIZE`.
pub const PALETTE_SIZE: u8 = 7;

/// A tile color, always inside the fixed palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(u8);

impl Color {
    /// Creates a color from its palette index.
    ///
    /// # Errors
    /// Returns `CrushError::InvalidColor` if `value >= PALETTE_SIZE`.
    ///
    /// # Examples
    /// ```
    /// use crush_solver::engine::Color;
    /// assert_eq!(Color::new(6).unwrap().value(), 6);
    /// assert!(Color::new(7).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < PALETTE_SIZE {
            Ok(Color(value))
        } else {
            Err(CrushError::InvalidColor(value))
        }
    }

    /// Maps any index onto the palette by wrapping around.
    pub fn wrapping(index: usize) -> Self {
        Color((index % PALETTE_SIZE as usize) as u8)
    }

    /// Picks a uniformly random palette color.
    pub fn random(rng: &mut impl Rng) -> Self {
        Color(rng.gen_range(0..PALETTE_SIZE))
    }

    /// Palette index of the color.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Converts the color to its digit representation.
    pub fn to_char(self) -> char {
        char::from(b'0' + self.0)
    }

    /// Returns the ANSI background color code string for terminal output.
    fn to_ansi_color_code(self) -> &'static str {
        match self.0 {
            0 => "41",
            1 => "42",
            2 => "43",
            3 => "44",
            4 => "45",
            5 => "46",
            _ => "47",
        }
    }
}

/// A colored cell of a board.
///
/// `id` is the positional identity (`y * width + x`) of the cell the tile sits
/// on; it stays the same across board copies, so tiles can be tracked in sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    id: usize,
    x: usize,
    y: usize,
    color: Color,
}

impl Tile {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Returns true if the two tiles differ in exactly one coordinate by exactly 1.
    pub fn is_adjacent_to(&self, other: &Tile) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx + dy == 1
    }
}

/// Represents the game board as a fixed-size grid of colored cells.
///
/// Boards are value-like: [`Board::swap`] and the cascade functions return new
/// snapshots and never mutate their input. Every cell is always populated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl Board {
    /// Creates a board from an explicit color scheme, one row per entry (row 0 first).
    ///
    /// # Errors
    /// * `CrushError::Precondition` if the scheme has no rows, an empty first row,
    ///   or rows of different lengths.
    /// * `CrushError::InvalidColor` if a value is outside the palette.
    ///
    /// # Examples
    /// ```
    /// use crush_solver::engine::Board;
    /// let board = Board::from_scheme(&[[0u8, 1, 2], [3, 4, 5]]).unwrap();
    /// assert_eq!(board.width(), 3);
    /// assert_eq!(board.height(), 2);
    /// assert_eq!(board.tile_at(2, 1).unwrap().color().value(), 5);
    /// ```
    pub fn from_scheme<R: AsRef<[u8]>>(scheme: &[R]) -> Result<Self> {
        let height = scheme.len();
        let width = scheme.first().map_or(0, |row| row.as_ref().len());
        if height == 0 || width == 0 {
            return Err(CrushError::Precondition(
                "board scheme must have at least one row and one column".to_string(),
            ));
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in scheme.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(CrushError::Precondition(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            for &value in row {
                cells.push(Color::new(value)?);
            }
        }
        Ok(Board {
            width,
            height,
            cells,
        })
    }

    /// Creates a board with uniformly random colors drawn from `rng`.
    ///
    /// The board may contain runs; the harness is expected to settle it if needed.
    pub fn new_random(width: usize, height: usize, rng: &mut impl Rng) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CrushError::Precondition(
                "board dimensions must be positive".to_string(),
            ));
        }
        let cells = (0..width * height).map(|_| Color::random(rng)).collect();
        Ok(Board {
            width,
            height,
            cells,
        })
    }

    /// Creates a reproducible random board from `seed`.
    pub fn new_random_with_seed(width: usize, height: usize, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Board::new_random(width, height, &mut rng)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if `(x, y)` addresses a cell of this board.
    pub fn is_valid_coords(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Builds the `OutOfBounds` error for this board.
    pub(crate) fn out_of_bounds(&self, x: i64, y: i64) -> CrushError {
        CrushError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the tile at `(x, y)`.
    ///
    /// # Errors
    /// Returns `CrushError::OutOfBounds` if the coordinates are outside the grid.
    pub fn tile_at(&self, x: usize, y: usize) -> Result<Tile> {
        if !self.is_valid_coords(x as i64, y as i64) {
            return Err(self.out_of_bounds(x as i64, y as i64));
        }
        Ok(self.tile_unchecked(x, y))
    }

    /// Applies a swap: the two cells exchange colors, positions stay fixed.
    ///
    /// The input board is not modified; a new snapshot is returned. No matches
    /// are resolved here, see [`crate::cascade::resolve_cascade`].
    ///
    /// # Errors
    /// * `CrushError::OutOfBounds` if a tile of the move lies outside this board.
    /// * `CrushError::InvalidMove` if the tiles are not adjacent.
    pub fn swap(&self, mv: &PlayerMove) -> Result<Board> {
        let (a, b) = (mv.first(), mv.second());
        for tile in [a, b] {
            if !self.is_valid_coords(tile.x as i64, tile.y as i64) {
                return Err(self.out_of_bounds(tile.x as i64, tile.y as i64));
            }
        }
        if !a.is_adjacent_to(&b) {
            return Err(CrushError::InvalidMove {
                x1: a.x,
                y1: a.y,
                x2: b.x,
                y2: b.y,
            });
        }

        let mut next = self.clone();
        let (ia, ib) = (self.index(a.x, a.y), self.index(b.x, b.y));
        next.cells.swap(ia, ib);
        Ok(next)
    }

    /// Renders the board as digit rows, one line per row.
    pub fn to_scheme_string(&self) -> String {
        let mut output = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                output.push(self.color(x, y).to_char());
            }
            if y + 1 < self.height {
                output.push('\n');
            }
        }
        output
    }

    /// Generates a string representation of the board with optional highlighted cells.
    ///
    /// The output includes row and column numbers and uses ANSI escape codes for tile
    /// colors. Highlighted cells show their color digit, others show blanks.
    pub fn to_string_with_highlight(&self, highlight: &[(usize, usize)]) -> String {
        let mut output = String::new();

        output.push_str("  ");
        for x in 0..self.width {
            output.push_str(&format!("{:<2}", x));
        }
        output.push('\n');

        for y in 0..self.height {
            output.push_str(&format!("{:<2}", y));
            for x in 0..self.width {
                let color = self.color(x, y);
                let content = if highlight.contains(&(x, y)) {
                    format!("{} ", color.to_char())
                } else {
                    "  ".to_string()
                };
                output.push_str(&format!(
                    "\x1b[1;{};m{}\x1b[m",
                    color.to_ansi_color_code(),
                    content
                ));
            }
            if y + 1 < self.height {
                output.push('\n');
            }
        }

        output
    }

    #[inline]
    pub(crate) fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Color lookup for coordinates already known to be valid.
    #[inline]
    pub(crate) fn color(&self, x: usize, y: usize) -> Color {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub(crate) fn tile_unchecked(&self, x: usize, y: usize) -> Tile {
        Tile {
            id: self.index(x, y),
            x,
            y,
            color: self.color(x, y),
        }
    }

    pub(crate) fn cells(&self) -> &[Color] {
        &self.cells
    }

    /// Rebuilds a board from settled cells; used by the cascade once every hole is refilled.
    pub(crate) fn with_cells(&self, cells: Vec<Color>) -> Board {
        debug_assert_eq!(cells.len(), self.cells.len());
        Board {
            width: self.width,
            height: self.height,
            cells,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(&[]))
    }
}

/// Swap direction in the harness encoding.
///
/// The harness counts `y` upwards for directions: `Up` targets `(x, y + 1)` and
/// `Down` targets `(x, y - 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Decodes the harness integer code.
    ///
    /// # Errors
    /// Returns `CrushError::InvalidDirection` for codes other than 0..=3.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            2 => Ok(Direction::Left),
            3 => Ok(Direction::Right),
            other => Err(CrushError::InvalidDirection(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// `(dx, dy)` step for this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        };
        f.write_str(name)
    }
}

/// A move in the harness encoding: the tile at `(x, y)` is swapped with its
/// neighbour in `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DirectedMove {
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
}

impl DirectedMove {
    pub fn new(x: usize, y: usize, direction: Direction) -> Self {
        DirectedMove { x, y, direction }
    }

    /// Decodes the harness triple `[x, y, direction_code]`.
    pub fn from_raw(raw: [u8; 3]) -> Result<Self> {
        Ok(DirectedMove {
            x: raw[0] as usize,
            y: raw[1] as usize,
            direction: Direction::from_code(raw[2])?,
        })
    }

    /// Coordinates of the neighbour the move swaps with; may lie off the board.
    pub fn destination(&self) -> (i64, i64) {
        let (dx, dy) = self.direction.offset();
        (self.x as i64 + dx, self.y as i64 + dy)
    }

    /// Both cells of the move as an ordered pair, smaller `(y, x)` first.
    ///
    /// Two directed moves describing the same swap yield the same pair.
    pub fn cells(&self) -> ((i64, i64), (i64, i64)) {
        let origin = (self.x as i64, self.y as i64);
        let dest = self.destination();
        if (origin.1, origin.0) <= (dest.1, dest.0) {
            (origin, dest)
        } else {
            (dest, origin)
        }
    }
}

impl fmt::Display for DirectedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.direction)
    }
}

/// A proposed swap of two adjacent tiles.
///
/// The pair is unordered: tiles are stored with the smaller `(y, x)` first, so
/// two moves over the same cells compare equal regardless of construction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerMove {
    first: Tile,
    second: Tile,
}

impl PlayerMove {
    /// Creates a move from two tiles.
    ///
    /// # Errors
    /// Returns `CrushError::InvalidMove` if the tiles are not orthogonally adjacent.
    pub fn new(a: Tile, b: Tile) -> Result<Self> {
        if !a.is_adjacent_to(&b) {
            return Err(CrushError::InvalidMove {
                x1: a.x,
                y1: a.y,
                x2: b.x,
                y2: b.y,
            });
        }
        let (first, second) = if (a.y, a.x) <= (b.y, b.x) { (a, b) } else { (b, a) };
        Ok(PlayerMove { first, second })
    }

    /// Builds the move swapping `(x1, y1)` and `(x2, y2)` on `board`.
    pub fn between(board: &Board, x1: usize, y1: usize, x2: usize, y2: usize) -> Result<Self> {
        PlayerMove::new(board.tile_at(x1, y1)?, board.tile_at(x2, y2)?)
    }

    /// Resolves a harness move against `board`.
    ///
    /// # Errors
    /// Returns `CrushError::OutOfBounds` if either cell lies outside the board.
    pub fn from_directed(board: &Board, directed: &DirectedMove) -> Result<Self> {
        let (dx, dy) = directed.destination();
        if !board.is_valid_coords(dx, dy) {
            return Err(board.out_of_bounds(dx, dy));
        }
        PlayerMove::between(board, directed.x, directed.y, dx as usize, dy as usize)
    }

    pub fn first(&self) -> Tile {
        self.first
    }

    pub fn second(&self) -> Tile {
        self.second
    }

    /// Returns true if the move swaps two tiles of the same column.
    pub fn is_vertical(&self) -> bool {
        self.first.x == self.second.x
    }

    /// Converts the move to the harness triple, anchored on the first tile.
    pub fn to_directed(&self) -> DirectedMove {
        let direction = if self.is_vertical() {
            Direction::Up
        } else {
            Direction::Right
        };
        DirectedMove::new(self.first.x, self.first.y, direction)
    }

    /// The harness reply form `[x1, y1, x2, y2]`.
    pub fn to_coords(&self) -> [usize; 4] {
        [self.first.x, self.first.y, self.second.x, self.second.y]
    }
}

impl fmt::Display for PlayerMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) <-> ({}, {})",
            self.first.x, self.first.y, self.second.x, self.second.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str_array;

    fn no_move_board() -> Board {
        board_from_str_array(&[
            "0123456012",
            "1234560123",
            "2345601234",
            "3456012345",
            "4560123456",
            "5601234560",
            "0123456012",
            "1234560123",
            "2345601234",
            "3456012345",
        ])
        .unwrap()
    }

    #[test]
    fn test_color_palette_bounds() {
        for v in 0..PALETTE_SIZE {
            assert_eq!(Color::new(v).unwrap().value(), v);
        }
        assert_eq!(Color::new(PALETTE_SIZE), Err(CrushError::InvalidColor(7)));
        assert_eq!(Color::new(6).unwrap().to_char(), '6');
    }

    #[test]
    fn test_from_scheme_rejects_ragged_and_empty() {
        let empty: [[u8; 0]; 0] = [];
        assert!(matches!(
            Board::from_scheme(&empty),
            Err(CrushError::Precondition(_))
        ));
        let ragged: Vec<Vec<u8>> = vec![vec![0, 1, 2], vec![0, 1]];
        assert!(matches!(
            Board::from_scheme(&ragged),
            Err(CrushError::Precondition(_))
        ));
        assert_eq!(
            Board::from_scheme(&[[0u8, 9]]),
            Err(CrushError::InvalidColor(9))
        );
    }

    #[test]
    fn test_tile_identity_follows_cell() {
        let board = no_move_board();
        let tile = board.tile_at(4, 2).unwrap();
        assert_eq!(tile.id(), 24);
        assert_eq!((tile.x(), tile.y()), (4, 2));
        assert_eq!(tile.color().value(), 6);

        let copy = board.clone();
        assert_eq!(copy.tile_at(4, 2).unwrap(), tile);
    }

    #[test]
    fn test_tile_at_out_of_bounds() {
        let board = no_move_board();
        assert_eq!(
            board.tile_at(10, 0),
            Err(CrushError::OutOfBounds {
                x: 10,
                y: 0,
                width: 10,
                height: 10
            })
        );
        assert!(board.is_valid_coords(9, 9));
        assert!(!board.is_valid_coords(-1, 0));
        assert!(!board.is_valid_coords(0, -1));
        assert!(!board.is_valid_coords(0, 10));
    }

    #[test]
    fn test_swap_vertically() {
        let board = no_move_board();
        let mv = PlayerMove::between(&board, 2, 2, 2, 3).unwrap();
        let swapped = board.swap(&mv).unwrap();

        let upper = swapped.tile_at(2, 2).unwrap();
        let lower = swapped.tile_at(2, 3).unwrap();
        assert_eq!((upper.x(), upper.y()), (2, 2));
        assert_eq!((lower.x(), lower.y()), (2, 3));
        assert_eq!(upper.color(), board.tile_at(2, 3).unwrap().color());
        assert_eq!(lower.color(), board.tile_at(2, 2).unwrap().color());

        // The input snapshot is untouched.
        assert_eq!(board, no_move_board());
    }

    #[test]
    fn test_swap_is_its_own_inverse() {
        let board = Board::new_random_with_seed(10, 10, 42).unwrap();
        for y in 0..10 {
            for x in 0..9 {
                let mv = PlayerMove::between(&board, x, y, x + 1, y).unwrap();
                let twice = board.swap(&mv).unwrap().swap(&mv).unwrap();
                assert_eq!(twice, board);
            }
        }
    }

    #[test]
    fn test_move_rejects_non_adjacent_tiles() {
        let board = no_move_board();
        let a = board.tile_at(0, 0).unwrap();
        let diagonal = board.tile_at(1, 1).unwrap();
        assert_eq!(
            PlayerMove::new(a, diagonal),
            Err(CrushError::InvalidMove {
                x1: 0,
                y1: 0,
                x2: 1,
                y2: 1
            })
        );
        assert!(PlayerMove::new(a, a).is_err());
    }

    #[test]
    fn test_swap_rejects_move_from_larger_board() {
        let small = Board::from_scheme(&[[0u8, 1], [2, 3]]).unwrap();
        let big = no_move_board();
        let mv = PlayerMove::between(&big, 5, 5, 6, 5).unwrap();
        assert!(matches!(
            small.swap(&mv),
            Err(CrushError::OutOfBounds { x: 5, y: 5, .. })
        ));
    }

    #[test]
    fn test_move_is_unordered() {
        let board = no_move_board();
        let a = board.tile_at(3, 3).unwrap();
        let b = board.tile_at(3, 4).unwrap();
        assert_eq!(PlayerMove::new(a, b).unwrap(), PlayerMove::new(b, a).unwrap());
    }

    #[test]
    fn test_directed_move_conversions() {
        let board = no_move_board();

        let up = DirectedMove::new(3, 3, Direction::Up);
        let mv = PlayerMove::from_directed(&board, &up).unwrap();
        assert_eq!(mv.to_coords(), [3, 3, 3, 4]);
        assert_eq!(mv.to_directed(), up);

        let left = DirectedMove::new(3, 0, Direction::Left);
        let mv = PlayerMove::from_directed(&board, &left).unwrap();
        assert_eq!(mv.to_coords(), [2, 0, 3, 0]);
        assert_eq!(mv.to_directed(), DirectedMove::new(2, 0, Direction::Right));
        assert_eq!(mv.to_directed().cells(), left.cells());

        let down = DirectedMove::new(1, 1, Direction::Down);
        assert_eq!(
            PlayerMove::from_directed(&board, &down).unwrap().to_coords(),
            [1, 0, 1, 1]
        );

        let off_board = DirectedMove::new(0, 0, Direction::Down);
        assert!(matches!(
            PlayerMove::from_directed(&board, &off_board),
            Err(CrushError::OutOfBounds { x: 0, y: -1, .. })
        ));
    }

    #[test]
    fn test_direction_codes() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_code(dir.code()).unwrap(), dir);
        }
        assert_eq!(
            Direction::from_code(182),
            Err(CrushError::InvalidDirection(182))
        );
        assert_eq!(
            DirectedMove::from_raw([4, 2, 3]).unwrap(),
            DirectedMove::new(4, 2, Direction::Right)
        );
    }

    #[test]
    fn test_new_random_with_seed_determinism() {
        let b1 = Board::new_random_with_seed(10, 10, 123).unwrap();
        let b2 = Board::new_random_with_seed(10, 10, 123).unwrap();
        let b3 = Board::new_random_with_seed(10, 10, 124).unwrap();
        assert_eq!(b1, b2, "Boards with the same seed must be identical.");
        assert_ne!(b1, b3, "Boards with different seeds should differ.");
        assert!(Board::new_random_with_seed(0, 10, 1).is_err());
    }

    #[test]
    fn test_display_board_formatting() {
        let board = no_move_board();
        let display_str = format!("{}", board);
        assert!(
            display_str.contains("  0 1 2 3 4 5 6 7 8 9 "),
            "Missing or incorrect column numbers"
        );
        assert_eq!(display_str.trim().lines().count(), 11);
        assert_eq!(
            board.to_scheme_string().lines().next(),
            Some("0123456012")
        );
    }
}
