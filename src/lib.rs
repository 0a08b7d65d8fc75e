//! # Crush Solver Library
//!
//! This library provides the game logic for a tile-swap matching game and a
//! minimax player with alpha-beta pruning that picks the swap with the best
//! material outlook against an adversarial opponent.
//!
//! It is used by two binaries:
//! - `select_move`: Reads a board file and prints the move the player would make.
//! - `self_play`: Lets two configured players alternate on a seeded random board.
//!
//! ## Modules
//! - `engine`: Board representation (`Board`, `Tile`, `Color`) and move encodings
//!   (`PlayerMove`, `DirectedMove`).
//! - `cascade`: Match detection, gravity, refill, cascade resolution and move enumeration.
//! - `heuristics`: Heuristic units, weight tiers and the slider-model engine combining them.
//! - `tree`: Arena storage for the search tree.
//! - `solver`: The configurable minimax / alpha-beta search.
//! - `player`: The harness-facing `select_move` entry point.
//! - `time_control`: Soft per-move time budget.
//! - `config`: TOML player configuration.
//! - `error`: The `CrushError` taxonomy.
//! - `utils`: Parsing boards from rows of digits.

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod player;
pub mod solver;
pub mod time_control;
pub mod tree;
pub mod utils;

pub use error::{CrushError, Result};
