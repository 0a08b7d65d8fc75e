//! Harness-facing move selection.
//!
//! The harness hands over its own list of legal moves in the directed
//! encoding. The player checks them against the board, regenerates the
//! engine's list of matching swaps, and searches the moves both agree on.

use crate::cascade::available_moves;
use crate::engine::{Board, DirectedMove, PlayerMove};
use crate::error::{CrushError, Result};
use crate::heuristics::HeuristicProfile;
use crate::solver::{search, SearchConfig};
use crate::time_control::TimeControl;
use log::{info, warn};

/// A search-driven player.
#[derive(Debug, Clone)]
pub struct MinMaxPlayer {
    config: SearchConfig,
    time: TimeControl,
}

impl MinMaxPlayer {
    pub fn new(config: SearchConfig) -> Self {
        MinMaxPlayer {
            config,
            time: TimeControl::new(),
        }
    }

    /// One-ply greedy player: best immediate score under the greedy profile.
    pub fn heuristic() -> Self {
        MinMaxPlayer::new(
            SearchConfig::default()
                .with_depth(1)
                .with_root_profile(HeuristicProfile::greedy())
                .with_deep_profile(HeuristicProfile::greedy()),
        )
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Chooses the move to play this turn.
    ///
    /// # Arguments
    /// * `available`: The harness's legal moves, in its directed encoding.
    /// * `board`: The current board.
    ///
    /// # Returns
    /// The chosen move, in the form the harness listed it.
    ///
    /// # Errors
    /// * `CrushError::OutOfBounds` if a harness move leaves the board.
    /// * `CrushError::NoAvailableMove` if neither the harness nor the engine has a move.
    pub fn select_move(&self, available: &[DirectedMove], board: &Board) -> Result<DirectedMove> {
        let offered = available
            .iter()
            .map(|dm| PlayerMove::from_directed(board, dm))
            .collect::<Result<Vec<_>>>()?;

        let candidates: Vec<PlayerMove> = available_moves(board)
            .into_iter()
            .filter(|mv| offered.contains(mv))
            .collect();

        if candidates.is_empty() {
            return match available.first() {
                Some(first) => {
                    warn!(
                        "none of the {} offered moves creates a match, playing {}",
                        available.len(),
                        first
                    );
                    Ok(*first)
                }
                None => Err(CrushError::NoAvailableMove),
            };
        }

        let outcome = search(board, &candidates, &self.config, &self.time)?;
        info!(
            "selected {} (score {:.2}, depth {}, {} nodes{})",
            outcome.best_move,
            outcome.score,
            outcome.completed_depth,
            outcome.nodes,
            if outcome.stopped { ", stopped early" } else { "" }
        );

        let chosen = available
            .iter()
            .zip(&offered)
            .find(|(_, mv)| **mv == outcome.best_move)
            .map(|(dm, _)| *dm)
            .unwrap_or_else(|| outcome.best_move.to_directed());
        Ok(chosen)
    }
}

impl Default for MinMaxPlayer {
    fn default() -> Self {
        MinMaxPlayer::new(SearchConfig::default())
    }
}
