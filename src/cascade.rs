//! Match detection and cascade resolution.
//!
//! Everything here is a pure function of its inputs: boards go in, new board
//! snapshots come out. The only source of variation is the [`Refill`] used to
//! color the cells that open up at the top of a column after gravity.
use crate::engine::{Board, Color, Direction, PlayerMove, Tile};
use crate::error::Result;
use log::{trace, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Minimum run length that counts as a match.
pub const MIN_RUN: usize = 3;

/// Upper bound on remove/gravity/refill rounds for a single cascade.
pub const MAX_CASCADE_STEPS: usize = 100;

/// Source of fresh colors for refilled cells.
#[derive(Clone, Debug)]
pub enum Refill {
    /// Uniform palette colors from a seeded generator.
    Seeded(SmallRng),
    /// Color `(x + y) mod 7`; keeps fixture boards free of accidental runs.
    Diagonal,
}

impl Refill {
    pub fn seeded(seed: u64) -> Self {
        Refill::Seeded(SmallRng::seed_from_u64(seed))
    }

    pub fn diagonal() -> Self {
        Refill::Diagonal
    }

    /// Produces the color for the refilled cell `(x, y)`.
    pub fn next_color(&mut self, x: usize, y: usize) -> Color {
        match self {
            Refill::Seeded(rng) => Color::random(rng),
            Refill::Diagonal => Color::wrapping(x + y),
        }
    }
}

/// Recipe for building a fresh [`Refill`], so every resolution of the same
/// (board, move) pair sees the same colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefillPolicy {
    Seeded { seed: u64 },
    Diagonal,
}

impl RefillPolicy {
    pub fn refill(&self) -> Refill {
        match *self {
            RefillPolicy::Seeded { seed } => Refill::seeded(seed),
            RefillPolicy::Diagonal => Refill::diagonal(),
        }
    }
}

impl Default for RefillPolicy {
    fn default() -> Self {
        RefillPolicy::Seeded { seed: 0 }
    }
}

/// Result of resolving a move until the board is stable.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeOutcome {
    /// The settled board.
    pub board: Board,
    /// Tiles removed over all rounds.
    pub removed: usize,
    /// Number of rounds that removed at least one tile.
    pub steps: usize,
}

/// Marks every cell that belongs to a horizontal or vertical run of `MIN_RUN` or more.
fn match_mask(board: &Board) -> Vec<bool> {
    let (width, height) = (board.width(), board.height());
    let mut mask = vec![false; width * height];

    for y in 0..height {
        let mut start = 0;
        while start < width {
            let color = board.color(start, y);
            let mut end = start + 1;
            while end < width && board.color(end, y) == color {
                end += 1;
            }
            if end - start >= MIN_RUN {
                for x in start..end {
                    mask[board.index(x, y)] = true;
                }
            }
            start = end;
        }
    }

    for x in 0..width {
        let mut start = 0;
        while start < height {
            let color = board.color(x, start);
            let mut end = start + 1;
            while end < height && board.color(x, end) == color {
                end += 1;
            }
            if end - start >= MIN_RUN {
                for y in start..end {
                    mask[board.index(x, y)] = true;
                }
            }
            start = end;
        }
    }

    mask
}

/// Finds every tile that takes part in a run of 3 or more same-colored tiles.
///
/// Rows and columns are scanned independently and the results are unioned, so
/// a tile at the crossing of two runs appears once and a run longer than 3
/// contributes all of its members.
///
/// # Arguments
/// * `board`: The board to scan.
///
/// # Returns
/// The set of matched tiles; empty when the board holds no run.
pub fn find_matches(board: &Board) -> HashSet<Tile> {
    match_mask(board)
        .iter()
        .enumerate()
        .filter(|(_, matched)| **matched)
        .map(|(idx, _)| board.tile_unchecked(idx % board.width(), idx / board.width()))
        .collect()
}

/// Checks that `tile` addresses a cell of `board`.
fn ensure_on_board(board: &Board, tile: &Tile) -> Result<()> {
    if board.is_valid_coords(tile.x() as i64, tile.y() as i64) {
        Ok(())
    } else {
        Err(board.out_of_bounds(tile.x() as i64, tile.y() as i64))
    }
}

/// Walks from `tile` in `direction`, collecting tiles of the same color.
///
/// The walk takes at most `radius` steps and stops early at the board edge or
/// at the first tile of a different color. The starting tile is not included.
/// Colors are compared against the color `board` holds at the starting cell.
///
/// # Errors
/// Returns `CrushError::OutOfBounds` if `tile` is not on `board`.
pub fn find_in_direction_same_color_tiles(
    board: &Board,
    tile: &Tile,
    radius: usize,
    direction: Direction,
) -> Result<Vec<Tile>> {
    ensure_on_board(board, tile)?;
    let color = board.color(tile.x(), tile.y());
    let (dx, dy) = direction.offset();

    let mut found = Vec::new();
    let (mut x, mut y) = (tile.x() as i64, tile.y() as i64);
    for _ in 0..radius {
        x += dx;
        y += dy;
        if !board.is_valid_coords(x, y) {
            break;
        }
        let next = board.tile_unchecked(x as usize, y as usize);
        if next.color() != color {
            break;
        }
        found.push(next);
    }
    Ok(found)
}

/// Union of the four directional scans from `tile` with the same `radius`.
///
/// # Errors
/// Returns `CrushError::OutOfBounds` if `tile` is not on `board`.
pub fn find_adjacent_same_color_tiles(
    board: &Board,
    tile: &Tile,
    radius: usize,
) -> Result<HashSet<Tile>> {
    let mut found = HashSet::new();
    for direction in Direction::ALL {
        found.extend(find_in_direction_same_color_tiles(
            board, tile, radius, direction,
        )?);
    }
    Ok(found)
}

/// Returns the members of `tiles` that form a straight run of 3 or more
/// consecutive same-colored tiles made only of members of the set.
///
/// Used to estimate whether a cluster gathered by the directional scans would
/// crush on its own.
pub fn find_tiles_that_crush(tiles: &HashSet<Tile>) -> HashSet<Tile> {
    let by_cell: HashMap<(usize, usize), Tile> =
        tiles.iter().map(|t| ((t.x(), t.y()), *t)).collect();

    let same = |tile: &Tile, x: i64, y: i64| -> Option<Tile> {
        if x < 0 || y < 0 {
            return None;
        }
        by_cell
            .get(&(x as usize, y as usize))
            .filter(|other| other.color() == tile.color())
            .copied()
    };

    let mut crushing = HashSet::new();
    for tile in tiles {
        for (dx, dy) in [(1i64, 0i64), (0, 1)] {
            // Only start a run at its first member.
            if same(tile, tile.x() as i64 - dx, tile.y() as i64 - dy).is_some() {
                continue;
            }
            let mut run = vec![*tile];
            let (mut x, mut y) = (tile.x() as i64 + dx, tile.y() as i64 + dy);
            while let Some(next) = same(tile, x, y) {
                run.push(next);
                x += dx;
                y += dy;
            }
            if run.len() >= MIN_RUN {
                crushing.extend(run);
            }
        }
    }
    crushing
}

/// Returns true if the tile at `(x, y)` lies on a run of 3 or more.
///
/// Gathers the same-colored neighbours within reach of a run through the
/// tile and keeps the ones that crush together.
fn crushes_at(board: &Board, x: usize, y: usize) -> Result<bool> {
    let tile = board.tile_at(x, y)?;
    let mut cluster = find_adjacent_same_color_tiles(board, &tile, MIN_RUN - 1)?;
    cluster.insert(tile);
    Ok(find_tiles_that_crush(&cluster).contains(&tile))
}

/// Removes the masked cells, lets each column fall and refills the top.
fn collapse(board: &Board, mask: &[bool], refill: &mut Refill) -> Board {
    let (width, height) = (board.width(), board.height());
    let mut cells = board.cells().to_vec();

    for x in 0..width {
        let mut write = height;
        for y in (0..height).rev() {
            if !mask[board.index(x, y)] {
                write -= 1;
                cells[write * width + x] = board.color(x, y);
            }
        }
        for y in 0..write {
            cells[y * width + x] = refill.next_color(x, y);
        }
    }

    board.with_cells(cells)
}

/// Resolves pending runs on `board` until none remain.
///
/// Each round removes every matched tile, applies gravity per column and
/// refills the opened cells from `refill`. Stops after `MAX_CASCADE_STEPS`
/// rounds even if runs remain.
pub fn settle(board: &Board, refill: &mut Refill) -> CascadeOutcome {
    let mut current = board.clone();
    let mut removed = 0;
    let mut steps = 0;

    loop {
        let mask = match_mask(&current);
        let matched = mask.iter().filter(|&&m| m).count();
        if matched == 0 {
            break;
        }
        if steps == MAX_CASCADE_STEPS {
            warn!(
                "cascade stopped after {} steps with {} tiles still matched",
                steps, matched
            );
            break;
        }
        steps += 1;
        removed += matched;
        trace!("cascade step {}: removing {} tiles", steps, matched);
        current = collapse(&current, &mask, refill);
    }

    CascadeOutcome {
        board: current,
        removed,
        steps,
    }
}

/// Applies `mv` to `board` and resolves every resulting chain reaction.
///
/// This is the single move-application path of the search. The input board is
/// left untouched; the outcome is deterministic for a given refill state.
///
/// # Errors
/// Propagates `CrushError::OutOfBounds` / `CrushError::InvalidMove` from [`Board::swap`].
///
/// # Examples
/// ```
/// use crush_solver::cascade::{resolve_cascade, Refill};
/// use crush_solver::engine::{Board, PlayerMove};
///
/// let board = Board::from_scheme(&[[0u8, 0, 1, 0], [2, 3, 4, 5], [4, 5, 6, 2]]).unwrap();
/// let mv = PlayerMove::between(&board, 2, 0, 3, 0).unwrap();
/// let outcome = resolve_cascade(&board, &mv, &mut Refill::diagonal()).unwrap();
/// assert_eq!(outcome.removed, 3);
/// assert_eq!(outcome.steps, 1);
/// ```
pub fn resolve_cascade(board: &Board, mv: &PlayerMove, refill: &mut Refill) -> Result<CascadeOutcome> {
    let swapped = board.swap(mv)?;
    Ok(settle(&swapped, refill))
}

/// Enumerates every swap that creates a run through one of the swapped cells.
///
/// Runs are detected with the directional scans around each swapped cell.
///
/// Order: for `y` in `0..height`, for `x` in `0..width`, the vertical swap
/// `(x, y)-(x, y + 1)` then the horizontal swap `(x, y)-(x + 1, y)`. The
/// search relies on this order for tie-breaking. Swaps of two equally
/// colored tiles change nothing and are never listed.
pub fn available_moves(board: &Board) -> Vec<PlayerMove> {
    let (width, height) = (board.width(), board.height());
    let mut moves = Vec::new();

    for y in 0..height {
        for x in 0..width {
            for (x2, y2) in [(x, y + 1), (x + 1, y)] {
                if x2 >= width || y2 >= height {
                    continue;
                }
                let (a, b) = (board.tile_unchecked(x, y), board.tile_unchecked(x2, y2));
                if a.color() == b.color() {
                    continue;
                }
                let Ok(mv) = PlayerMove::new(a, b) else {
                    continue;
                };
                let Ok(swapped) = board.swap(&mv) else {
                    continue;
                };
                let crushes = |cx, cy| matches!(crushes_at(&swapped, cx, cy), Ok(true));
                if crushes(x, y) || crushes(x2, y2) {
                    moves.push(mv);
                }
            }
        }
    }

    moves
}
