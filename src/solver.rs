//! Minimax search with alpha-beta pruning over cascade-resolved successors.
//!
//! Every ply is one player's turn. A node's value is the signed heuristic score
//! of the move that produced it plus the best value among its children, so
//! material gained along a line accumulates: the maximizing player's moves
//! count positively, the opponent's negatively.
//!
//! One search component covers every player preset; depth, heuristic
//! profiles, pruning, the time budget and root parallelism all come from
//! [`SearchConfig`].

use crate::cascade::{available_moves, RefillPolicy};
use crate::engine::{Board, PlayerMove};
use crate::error::{CrushError, Result};
use crate::heuristics::{evaluate_move, HeuristicProfile};
use crate::time_control::{should_check_time, TimeControl};
use crate::tree::{NodeId, SearchTree, ROOT};
use log::{debug, trace};
use rayon::prelude::*;
use std::time::Duration;

/// Configuration of one search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Plies to look ahead, including the root move.
    pub depth: usize,
    /// Nodes at this tree depth or deeper drop their children once evaluated.
    pub retain_depth: usize,
    /// Alpha-beta pruning on/off.
    pub pruning: bool,
    /// Search the root moves on the rayon pool.
    pub parallel: bool,
    /// Penalty per remaining ply for the player stuck without a move.
    pub dead_end_penalty: f64,
    /// Soft wall-clock budget; enables iterative deepening.
    pub time_budget: Option<Duration>,
    /// How refilled cells are colored while resolving successors.
    pub refill: RefillPolicy,
    /// Heuristics scoring the root moves.
    pub root_profile: HeuristicProfile,
    /// Heuristics scoring every deeper move.
    pub deep_profile: HeuristicProfile,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            retain_depth: 2,
            pruning: true,
            parallel: false,
            dead_end_penalty: 12.0,
            time_budget: None,
            refill: RefillPolicy::default(),
            root_profile: HeuristicProfile::balanced(),
            deep_profile: HeuristicProfile::candies_only(),
        }
    }
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_retain_depth(mut self, retain_depth: usize) -> Self {
        self.retain_depth = retain_depth;
        self
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_dead_end_penalty(mut self, penalty: f64) -> Self {
        self.dead_end_penalty = penalty;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_refill(mut self, refill: RefillPolicy) -> Self {
        self.refill = refill;
        self
    }

    pub fn with_root_profile(mut self, profile: HeuristicProfile) -> Self {
        self.root_profile = profile;
        self
    }

    pub fn with_deep_profile(mut self, profile: HeuristicProfile) -> Self {
        self.deep_profile = profile;
        self
    }

    /// Checks that the configuration can drive a search.
    ///
    /// # Errors
    /// Returns `CrushError::Precondition` for a zero depth, a negative or
    /// non-finite penalty, or an invalid profile scale.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(CrushError::Precondition(
                "search depth must be at least 1".to_string(),
            ));
        }
        if !self.dead_end_penalty.is_finite() || self.dead_end_penalty < 0.0 {
            return Err(CrushError::Precondition(format!(
                "dead-end penalty must be a finite non-negative number, got {}",
                self.dead_end_penalty
            )));
        }
        self.root_profile.validate()?;
        self.deep_profile.validate()
    }
}

/// Result of a search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Best root move; the first one in enumeration order on ties.
    pub best_move: PlayerMove,
    /// Value of `best_move`.
    pub score: f64,
    /// Root moves with the values of the last completed iteration. With
    /// pruning, a move that lost may carry an upper bound rather than its exact value.
    pub root_scores: Vec<(PlayerMove, f64)>,
    /// Nodes visited over all iterations.
    pub nodes: u64,
    /// Largest arena size reached by any single tree.
    pub peak_tree_len: usize,
    /// Depth of the iteration that produced the answer.
    pub completed_depth: usize,
    /// True if the time budget or an external stop cut the search short.
    pub stopped: bool,
}

/// Values gathered for the root moves of one iteration.
struct RootResult {
    scores: Vec<(PlayerMove, f64)>,
    best: usize,
    nodes: u64,
    peak_tree_len: usize,
}

/// Per-thread search state.
struct Searcher<'a> {
    config: &'a SearchConfig,
    time: &'a TimeControl,
    interruptible: bool,
    nodes: u64,
}

impl<'a> Searcher<'a> {
    fn new(config: &'a SearchConfig, time: &'a TimeControl, interruptible: bool) -> Self {
        Searcher {
            config,
            time,
            interruptible,
            nodes: 0,
        }
    }

    fn should_stop(&self) -> bool {
        self.interruptible
            && (self.time.is_stopped() || (should_check_time(self.nodes) && self.time.check_time()))
    }

    fn profile_for(&self, depth: usize) -> &HeuristicProfile {
        if depth == 0 {
            &self.config.root_profile
        } else {
            &self.config.deep_profile
        }
    }

    /// Generates one child per move, each holding its settled board and raw score.
    fn expand(
        &self,
        tree: &mut SearchTree,
        id: NodeId,
        board: &Board,
        moves: &[PlayerMove],
    ) -> Result<Vec<NodeId>> {
        let profile = self.profile_for(tree.node(id)?.depth());
        let mut children = Vec::with_capacity(moves.len());
        for mv in moves {
            let (raw, outcome) = evaluate_move(board, *mv, profile, &self.config.refill)?;
            children.push(tree.add_child(id, outcome.board, *mv, raw)?);
        }
        Ok(children)
    }

    /// Scores `id` with `remaining` plies left inside the window `(alpha, beta)`.
    ///
    /// `maximizing` tells whether the player to move at `id` is the root player.
    /// Returns `None` if the search was interrupted.
    fn alphabeta(
        &mut self,
        tree: &mut SearchTree,
        id: NodeId,
        remaining: usize,
        maximizing: bool,
        alpha: f64,
        beta: f64,
    ) -> Result<Option<f64>> {
        if self.should_stop() {
            return Ok(None);
        }
        self.nodes += 1;

        let node = tree.node(id)?;
        let base = match node.mv() {
            None => 0.0,
            // The opponent of the player to move made this move.
            Some(_) if maximizing => -node.baseline(),
            Some(_) => node.baseline(),
        };
        let depth = node.depth();

        let board = tree.take_board(id)?;
        if remaining == 0 {
            tree.set_evaluation(id, base)?;
            return Ok(Some(base));
        }

        let moves = available_moves(&board);
        if moves.is_empty() {
            // Worse for whoever made the move that left no reply.
            let penalty = self.config.dead_end_penalty * remaining as f64;
            let value = if maximizing { base + penalty } else { base - penalty };
            tree.set_evaluation(id, value)?;
            return Ok(Some(value));
        }

        let children = self.expand(tree, id, &board, &moves)?;
        drop(board);

        // Children values are relative to this node's baseline.
        let lo = alpha - base;
        let hi = beta - base;
        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for (i, &child) in children.iter().enumerate() {
            let (a, b) = match (self.config.pruning, maximizing) {
                (false, _) => (f64::NEG_INFINITY, f64::INFINITY),
                (true, true) => (lo.max(best), hi),
                (true, false) => (lo, hi.min(best)),
            };
            let value = match self.alphabeta(tree, child, remaining - 1, !maximizing, a, b)? {
                Some(value) => value,
                None => return Ok(None),
            };
            best = if maximizing {
                best.max(value)
            } else {
                best.min(value)
            };

            let cutoff = if maximizing { best >= hi } else { best <= lo };
            if self.config.pruning && cutoff {
                for &skipped in &children[i + 1..] {
                    tree.mark_pruned(skipped)?;
                }
                break;
            }
        }

        let value = base + best;
        tree.set_evaluation(id, value)?;
        if depth >= self.config.retain_depth {
            tree.release_subtree(id)?;
        }
        Ok(Some(value))
    }
}

/// Index of the strictly greatest score, first one on ties.
fn pick_best(scores: &[(PlayerMove, f64)]) -> usize {
    let mut best = 0;
    for (i, (_, score)) in scores.iter().enumerate().skip(1) {
        if *score > scores[best].1 {
            best = i;
        }
    }
    best
}

/// Searches the root moves one after another, sharing the alpha bound between them.
fn search_sequential(
    board: &Board,
    moves: &[PlayerMove],
    depth: usize,
    config: &SearchConfig,
    time: &TimeControl,
    interruptible: bool,
) -> Result<Option<RootResult>> {
    let mut searcher = Searcher::new(config, time, interruptible);
    let mut tree = SearchTree::new(board.clone());
    let root_board = tree.take_board(ROOT)?;
    let children = searcher.expand(&mut tree, ROOT, &root_board, moves)?;
    drop(root_board);

    let mut scores = Vec::with_capacity(children.len());
    let mut best = f64::NEG_INFINITY;
    for (&child, &mv) in children.iter().zip(moves) {
        let alpha = if config.pruning {
            best
        } else {
            f64::NEG_INFINITY
        };
        let value =
            match searcher.alphabeta(&mut tree, child, depth - 1, false, alpha, f64::INFINITY)? {
                Some(value) => value,
                None => return Ok(None),
            };
        best = best.max(value);
        trace!("depth {} root move {} scored {:.2}", depth, mv, value);
        scores.push((mv, value));
    }
    tree.set_evaluation(ROOT, best)?;

    let best = pick_best(&scores);
    Ok(Some(RootResult {
        scores,
        best,
        nodes: searcher.nodes + 1,
        peak_tree_len: tree.peak_len(),
    }))
}

/// Searches every root move in its own detached tree on the rayon pool.
///
/// Each subtree gets the full window, so the root moves carry exact values.
fn search_parallel(
    board: &Board,
    moves: &[PlayerMove],
    depth: usize,
    config: &SearchConfig,
    time: &TimeControl,
    interruptible: bool,
) -> Result<Option<RootResult>> {
    let results: Vec<(PlayerMove, Option<f64>, u64, usize)> = moves
        .par_iter()
        .map(|mv| -> Result<(PlayerMove, Option<f64>, u64, usize)> {
            let mut searcher = Searcher::new(config, time, interruptible);
            let (raw, outcome) =
                evaluate_move(board, *mv, &config.root_profile, &config.refill)?;
            let mut tree = SearchTree::detached(outcome.board, *mv, raw, 1);
            let value = searcher.alphabeta(
                &mut tree,
                ROOT,
                depth - 1,
                false,
                f64::NEG_INFINITY,
                f64::INFINITY,
            )?;
            Ok((*mv, value, searcher.nodes, tree.peak_len()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut scores = Vec::with_capacity(results.len());
    let mut nodes = 1;
    let mut peak_tree_len = 0;
    for (mv, value, subtree_nodes, peak) in results {
        nodes += subtree_nodes;
        peak_tree_len = peak_tree_len.max(peak);
        match value {
            Some(value) => {
                trace!("depth {} root move {} scored {:.2}", depth, mv, value);
                scores.push((mv, value));
            }
            None => return Ok(None),
        }
    }

    let best = pick_best(&scores);
    Ok(Some(RootResult {
        scores,
        best,
        nodes,
        peak_tree_len: peak_tree_len + moves.len(),
    }))
}

/// Picks the best of `moves` on `board`.
///
/// Without a time budget this is a single search to `config.depth`. With a
/// budget the search deepens from 1 to `config.depth`; the depth-1 iteration
/// always completes, and an iteration cut short by the clock (or by
/// [`TimeControl::stop`]) is discarded in favour of the last completed one.
/// The deadline is `config.time_budget`, measured from the call.
///
/// # Arguments
/// * `board`: Position to move from.
/// * `moves`: Root moves to consider, in tie-break order.
/// * `config`: Search parameters.
/// * `time`: Stop flag shared with whoever may end the search; restarted here.
///
/// # Errors
/// * `CrushError::NoAvailableMove` if `moves` is empty.
/// * `CrushError::Precondition` if `config` does not validate.
/// * Swap validation errors if a move does not fit `board`.
pub fn search(
    board: &Board,
    moves: &[PlayerMove],
    config: &SearchConfig,
    time: &TimeControl,
) -> Result<SearchOutcome> {
    config.validate()?;
    if moves.is_empty() {
        return Err(CrushError::NoAvailableMove);
    }
    time.start(config.time_budget);

    let first_depth = if config.time_budget.is_some() {
        1
    } else {
        config.depth
    };

    let mut completed: Option<(usize, RootResult)> = None;
    let mut nodes = 0;
    let mut peak_tree_len = 0;
    let mut stopped = false;

    for depth in first_depth..=config.depth {
        // The first iteration must produce an answer.
        let interruptible = completed.is_some();
        let result = if config.parallel {
            search_parallel(board, moves, depth, config, time, interruptible)?
        } else {
            search_sequential(board, moves, depth, config, time, interruptible)?
        };

        match result {
            Some(result) => {
                nodes += result.nodes;
                peak_tree_len = peak_tree_len.max(result.peak_tree_len);
                let (mv, score) = result.scores[result.best];
                debug!(
                    "depth {} complete: best {} ({:.2}), {} nodes, {:?} elapsed",
                    depth,
                    mv,
                    score,
                    result.nodes,
                    time.elapsed()
                );
                completed = Some((depth, result));
            }
            None => {
                debug!("depth {} interrupted after {:?}", depth, time.elapsed());
                stopped = true;
                break;
            }
        }
    }

    let (completed_depth, result) = completed.ok_or(CrushError::NoAvailableMove)?;
    let (best_move, score) = result.scores[result.best];
    Ok(SearchOutcome {
        best_move,
        score,
        root_scores: result.scores,
        nodes,
        peak_tree_len,
        completed_depth,
        stopped,
    })
}
