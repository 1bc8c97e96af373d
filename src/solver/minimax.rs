//! Alpha-beta minimax over decision states
//!
//! Values are integers in {-1, 0, +1} from a fixed perspective player (the
//! first mover at the root); the mover at each node is the phase's
//! priority holder, so the search maximizes when that player is the
//! perspective and minimizes otherwise. Consecutive nodes can share a
//! mover (several actions in one main phase), which is why this is framed
//! as max/min against a fixed perspective rather than strict negamax —
//! the two are equivalent, this one without per-edge negation bookkeeping.
//!
//! A fingerprint path-set turns revisits on the current line into
//! non-progress draws. Values influenced by such a draw (or by the depth
//! cap) are path-dependent and therefore never stored in the caches.

use crate::game::actions::{self, Action};
use crate::game::fingerprint::{board_fingerprint, fingerprint};
use crate::game::state::{GameState, Outcome};
use crate::solver::dominance::DominanceTable;
use crate::solver::heuristics;
use crate::solver::tt::{Bound, TTEntry, TranspositionTable};
use crate::solver::SearchLimits;
use crate::{Result, SolverError};

pub(crate) struct SearchContext<'a> {
    pub tt: &'a mut TranspositionTable,
    pub dominance: &'a mut DominanceTable,
    pub limits: SearchLimits,
    /// Player whose perspective all values are from
    pub perspective: u8,
    pub nodes: u64,
    path: Vec<u64>,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        tt: &'a mut TranspositionTable,
        dominance: &'a mut DominanceTable,
        limits: SearchLimits,
        perspective: u8,
    ) -> Self {
        SearchContext {
            tt,
            dominance,
            limits,
            perspective,
            nodes: 0,
            path: Vec::new(),
        }
    }

    fn outcome_value(&self, outcome: Outcome) -> i8 {
        match outcome {
            Outcome::Winner(p) if p == self.perspective => 1,
            Outcome::Winner(_) => -1,
            Outcome::Draw => 0,
        }
    }

    fn charge_node(&mut self) -> Result<()> {
        self.nodes += 1;
        if let Some(budget) = self.limits.node_budget {
            if self.nodes > budget {
                return Err(SolverError::BudgetExceeded { nodes: self.nodes });
            }
        }
        Ok(())
    }
}

/// Actions of a decision state in static heuristic order.
pub(crate) fn ordered_actions(state: &GameState) -> Vec<Action> {
    let mut actions = actions::legal_actions(state);
    actions.sort_by_key(|a| actions::order_key(state, a));
    actions
}

/// Search a decision state. Returns `(value, pure)`: `pure` is false when
/// the value was shaped by an on-path repetition draw or a depth cutoff
/// and must not be cached.
pub(crate) fn minimax(
    ctx: &mut SearchContext,
    state: &GameState,
    depth: u32,
    mut alpha: i8,
    mut beta: i8,
) -> Result<(i8, bool)> {
    if let Some(outcome) = state.outcome {
        return Ok((ctx.outcome_value(outcome), true));
    }
    if state.turn > ctx.limits.turn_cap {
        // Draw by turn cap; turn counts are not part of the fingerprint,
        // so this value is not cacheable.
        return Ok((0, false));
    }
    if depth > ctx.limits.max_depth {
        // Last-resort cutoff: the grinding detector decides what is
        // mathematically forced, everything else is a conservative draw.
        // Either way the value is depth-dependent and never cached.
        return Ok((heuristics::evaluate_at_depth_cap(state, ctx.perspective), false));
    }

    let key = fingerprint(state);
    if let Some(entry) = ctx.tt.get(key) {
        match entry.bound {
            Bound::Exact => return Ok((entry.value, true)),
            Bound::Lower if entry.value >= beta => return Ok((entry.value, true)),
            Bound::Upper if entry.value <= alpha => return Ok((entry.value, true)),
            _ => {}
        }
    }

    let mover = actions::priority_player(state);
    let maximizing = mover == ctx.perspective;
    let board_key = board_fingerprint(state);
    let my_life = state.player(ctx.perspective).life;
    let opp_life = state.player(GameState::opponent(ctx.perspective)).life;
    if let Some(value) = ctx.dominance.check(board_key, my_life, opp_life) {
        return Ok((value, true));
    }

    if ctx.path.contains(&key) {
        // Revisiting a position on the current line is non-progress.
        return Ok((0, false));
    }

    let actions = ordered_actions(state);
    if actions.is_empty() {
        return Err(SolverError::InvariantViolation(format!(
            "no legal actions in non-terminal {} phase",
            state.phase
        )));
    }

    ctx.path.push(key);
    let original_alpha = alpha;
    let original_beta = beta;
    let mut best: i8 = if maximizing { -2 } else { 2 };
    let mut pure = true;
    let mut error = None;

    for action in &actions {
        if let Err(e) = ctx.charge_node() {
            error = Some(e);
            break;
        }
        let child = match actions::apply_unchecked(state, action) {
            Ok(child) => child,
            Err(e) => {
                error = Some(e);
                break;
            }
        };
        let (value, child_pure) = match minimax(ctx, &child, depth + 1, alpha, beta) {
            Ok(r) => r,
            Err(e) => {
                error = Some(e);
                break;
            }
        };
        pure &= child_pure;
        if maximizing {
            best = best.max(value);
            alpha = alpha.max(value);
        } else {
            best = best.min(value);
            beta = beta.min(value);
        }
        if alpha >= beta {
            break;
        }
    }
    ctx.path.pop();

    if let Some(e) = error {
        return Err(e);
    }

    if pure {
        let bound = if best <= original_alpha {
            Bound::Upper
        } else if best >= original_beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        ctx.tt.put(
            key,
            TTEntry {
                value: best,
                bound,
                depth,
            },
        );
        if bound == Bound::Exact {
            ctx.dominance.store(board_key, my_life, opp_life, best);
        }
    }
    Ok((best, pure))
}

/// Root search: scans the root actions so that a budget blowout still
/// yields the best bound found so far. Returns `(value, best_action,
/// complete)`.
pub(crate) fn search_root(
    ctx: &mut SearchContext,
    state: &GameState,
) -> Result<(i8, Option<Action>, bool)> {
    if let Some(outcome) = state.outcome {
        return Ok((ctx.outcome_value(outcome), None, true));
    }
    let mut alpha: i8 = -2;
    let beta: i8 = 2;
    let mut best: i8 = -2;
    let mut best_action = None;

    for action in ordered_actions(state) {
        if let Err(e) = ctx.charge_node() {
            return partial(best, best_action, e);
        }
        let child = actions::apply_unchecked(state, &action)?;
        let (value, _) = match minimax(ctx, &child, 1, alpha, beta) {
            Ok(r) => r,
            Err(e @ SolverError::BudgetExceeded { .. }) => {
                return partial(best, best_action, e)
            }
            Err(e) => return Err(e),
        };
        if value > best || best_action.is_none() {
            best = value;
            best_action = Some(action);
        }
        alpha = alpha.max(value);
        if alpha >= beta {
            break;
        }
    }
    Ok((best, best_action, true))
}

fn partial(
    best: i8,
    best_action: Option<Action>,
    err: SolverError,
) -> Result<(i8, Option<Action>, bool)> {
    match err {
        SolverError::BudgetExceeded { .. } => Ok((best.max(-1), best_action, false)),
        other => Err(other),
    }
}
