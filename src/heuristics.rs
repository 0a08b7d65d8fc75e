//! Heuristic evaluation of a single move.
//!
//! A [`MoveContext`] resolves the move once; [`Heuristic`] units read from it
//! and a [`HeuristicsEngine`] folds their scores into one value using the
//! slider model: every [`WeightTier`] maps to `(level / 5)^scale`, and the
//! engine sums its units' scores scaled by those factors.
use crate::cascade::{resolve_cascade, CascadeOutcome, Refill, RefillPolicy};
use crate::engine::{Board, PlayerMove};
use crate::error::{CrushError, Result};
use serde::{Deserialize, Serialize};

/// Points per tile removed by the cascade.
pub const POINTS_PER_CANDY: f64 = 10.0;
/// Points per extra cascade round beyond the first.
pub const POINTS_PER_CHAIN_STEP: f64 = 25.0;
/// Every heuristic stays within `0.0..=MAX_BOUNDED_SCORE` except `CandiesRemoved`,
/// which grows with the size of the cascade.
pub const MAX_BOUNDED_SCORE: f64 = 100.0;

/// The closed set of available heuristics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Tiles removed over the whole cascade, 10 points each.
    CandiesRemoved,
    /// Row of the upper swapped tile, scaled to `0..100` by the board height.
    DistanceFromTop,
    /// Extra cascade rounds triggered by the move, 25 points each, capped at 100.
    ChainReaction,
}

impl HeuristicKind {
    pub fn name(self) -> &'static str {
        match self {
            HeuristicKind::CandiesRemoved => "candies_removed",
            HeuristicKind::DistanceFromTop => "distance_from_top",
            HeuristicKind::ChainReaction => "chain_reaction",
        }
    }
}

/// Priority class of a heuristic inside an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl WeightTier {
    /// Ordinal level, 1 for `VeryLow` up to 5 for `VeryHigh`.
    pub fn level(self) -> u8 {
        match self {
            WeightTier::VeryLow => 1,
            WeightTier::Low => 2,
            WeightTier::Medium => 3,
            WeightTier::High => 4,
            WeightTier::VeryHigh => 5,
        }
    }
}

/// The non-linear tier weighting: `factor(tier) = (level(tier) / 5)^scale`.
///
/// `VeryHigh` always weighs 1, so a top-tier heuristic contributes its raw
/// score. Larger scales shrink the lower tiers faster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderModel {
    scale: f64,
}

impl SliderModel {
    /// Creates a model with the given scale constant.
    ///
    /// # Errors
    /// Returns `CrushError::Precondition` if `scale` is not a finite positive number.
    pub fn new(scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CrushError::Precondition(format!(
                "slider scale must be a finite positive number, got {}",
                scale
            )));
        }
        Ok(SliderModel { scale })
    }

    pub fn factor(&self, tier: WeightTier) -> f64 {
        (f64::from(tier.level()) / f64::from(WeightTier::VeryHigh.level())).powf(self.scale)
    }
}

/// A move resolved against a board, shared by every heuristic evaluating it.
#[derive(Clone, Debug)]
pub struct MoveContext<'a> {
    board: &'a Board,
    mv: PlayerMove,
    outcome: CascadeOutcome,
}

impl<'a> MoveContext<'a> {
    /// Resolves `mv` on `board` with `refill` and keeps the outcome.
    ///
    /// # Errors
    /// Propagates swap validation errors from [`resolve_cascade`].
    pub fn new(board: &'a Board, mv: PlayerMove, refill: &mut Refill) -> Result<Self> {
        let outcome = resolve_cascade(board, &mv, refill)?;
        Ok(MoveContext { board, mv, outcome })
    }

    pub fn board(&self) -> &Board {
        self.board
    }

    pub fn mv(&self) -> &PlayerMove {
        &self.mv
    }

    pub fn outcome(&self) -> &CascadeOutcome {
        &self.outcome
    }

    /// Consumes the context, handing the settled successor to the caller.
    pub fn into_outcome(self) -> CascadeOutcome {
        self.outcome
    }
}

/// A heuristic bound to one resolved move.
#[derive(Clone, Copy, Debug)]
pub struct Heuristic<'a> {
    kind: HeuristicKind,
    ctx: &'a MoveContext<'a>,
}

impl<'a> Heuristic<'a> {
    pub fn new(kind: HeuristicKind, ctx: &'a MoveContext<'a>) -> Self {
        Heuristic { kind, ctx }
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Scores the bound move. Deterministic for a given context.
    pub fn evaluate(&self) -> f64 {
        let outcome = self.ctx.outcome();
        match self.kind {
            HeuristicKind::CandiesRemoved => outcome.removed as f64 * POINTS_PER_CANDY,
            HeuristicKind::DistanceFromTop => {
                let mv = self.ctx.mv();
                let top = mv.first().y().min(mv.second().y());
                MAX_BOUNDED_SCORE * top as f64 / self.ctx.board().height() as f64
            }
            HeuristicKind::ChainReaction => {
                let extra = outcome.steps.saturating_sub(1) as f64;
                (extra * POINTS_PER_CHAIN_STEP).min(MAX_BOUNDED_SCORE)
            }
        }
    }
}

/// Combines weighted heuristics into one comparable score.
#[derive(Clone, Debug)]
pub struct HeuristicsEngine<'a> {
    model: SliderModel,
    units: Vec<(Heuristic<'a>, WeightTier)>,
}

impl<'a> HeuristicsEngine<'a> {
    pub fn new(model: SliderModel) -> Self {
        HeuristicsEngine {
            model,
            units: Vec::new(),
        }
    }

    /// Registers a heuristic under a tier.
    pub fn add(&mut self, heuristic: Heuristic<'a>, tier: WeightTier) -> &mut Self {
        self.units.push((heuristic, tier));
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Returns `Σ factor(tier) * score` over all units, 0 with no units.
    pub fn evaluate(&self) -> f64 {
        self.units
            .iter()
            .map(|(heuristic, tier)| self.model.factor(*tier) * heuristic.evaluate())
            .sum()
    }
}

/// One `(heuristic, tier)` entry of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub kind: HeuristicKind,
    pub tier: WeightTier,
}

/// A reusable heuristic set: slider scale plus weighted heuristics.
///
/// Profiles are plain data so they can be loaded from configuration; an
/// engine is built from one per evaluated move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeuristicProfile {
    pub scale: f64,
    pub entries: Vec<ProfileEntry>,
}

impl HeuristicProfile {
    pub fn new(scale: f64) -> Self {
        HeuristicProfile {
            scale,
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, kind: HeuristicKind, tier: WeightTier) -> Self {
        self.entries.push(ProfileEntry { kind, tier });
        self
    }

    /// Cheap profile for deep plies: material only.
    pub fn candies_only() -> Self {
        HeuristicProfile::new(1.0).with(HeuristicKind::CandiesRemoved, WeightTier::VeryHigh)
    }

    /// Root-ply profile: material first, board position as a minor signal.
    pub fn balanced() -> Self {
        HeuristicProfile::new(1.7)
            .with(HeuristicKind::CandiesRemoved, WeightTier::VeryHigh)
            .with(HeuristicKind::DistanceFromTop, WeightTier::VeryLow)
    }

    /// Profile of the one-ply greedy player.
    pub fn greedy() -> Self {
        HeuristicProfile::new(2.0)
            .with(HeuristicKind::CandiesRemoved, WeightTier::VeryHigh)
            .with(HeuristicKind::DistanceFromTop, WeightTier::VeryLow)
    }

    /// Checks the scale constant.
    pub fn validate(&self) -> Result<()> {
        SliderModel::new(self.scale).map(|_| ())
    }

    /// Builds an engine evaluating `ctx` with this profile's entries.
    pub fn engine<'a>(&self, ctx: &'a MoveContext<'a>) -> Result<HeuristicsEngine<'a>> {
        let mut engine = HeuristicsEngine::new(SliderModel::new(self.scale)?);
        for entry in &self.entries {
            engine.add(Heuristic::new(entry.kind, ctx), entry.tier);
        }
        Ok(engine)
    }

    /// Scores a resolved move with this profile.
    pub fn evaluate(&self, ctx: &MoveContext<'_>) -> Result<f64> {
        Ok(self.engine(ctx)?.evaluate())
    }
}

impl Default for HeuristicProfile {
    fn default() -> Self {
        HeuristicProfile::balanced()
    }
}

/// Resolves `mv` with a fresh refill built from `policy` and scores it with `profile`.
///
/// Returns the score together with the settled successor board.
pub fn evaluate_move(
    board: &Board,
    mv: PlayerMove,
    profile: &HeuristicProfile,
    policy: &RefillPolicy,
) -> Result<(f64, CascadeOutcome)> {
    let mut refill = policy.refill();
    let ctx = MoveContext::new(board, mv, &mut refill)?;
    let score = profile.evaluate(&ctx)?;
    Ok((score, ctx.into_outcome()))
}
