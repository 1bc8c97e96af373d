//! Search facade: solve, goldfish, payoff matrix
//!
//! A `Solver` owns its transposition and dominance tables. Cached values
//! are relative to the perspective of the first mover of the solve that
//! produced them, so one `Solver` instance serves one matchup/first-mover
//! pair; the free functions below create solvers as needed.

pub mod dominance;
pub mod heuristics;
pub mod minimax;
pub mod snapshot;
pub mod tt;

use crate::core::CardId;
use crate::game::actions::{self, Action};
use crate::game::fingerprint::fingerprint;
use crate::game::state::{GameState, Outcome};
use crate::solver::dominance::DominanceTable;
use crate::solver::minimax::{minimax, ordered_actions, search_root, SearchContext};
use crate::solver::tt::TranspositionTable;
use crate::Result;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Ply cap; past it the grinding detectors decide or call it a draw
    pub max_depth: u32,
    /// Player-turn cap; a game outlasting it is a draw
    pub turn_cap: u32,
    /// Optional node budget; exhausting it yields a partial result
    pub node_budget: Option<u64>,
    pub tt_capacity: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_depth: 500,
            turn_cap: 100,
            node_budget: None,
            tt_capacity: 1 << 22,
        }
    }
}

/// Result of solving one matchup
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Game value in {-1, 0, +1} from the first mover's perspective
    pub value: i8,
    /// Optimal line as (state fingerprint, action) pairs; empty when the
    /// result is only a partial bound
    pub principal_variation: Vec<(u64, Action)>,
    pub nodes: u64,
    /// False when the node budget ran out and `value` is a bound, not a
    /// proven value
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct GoldfishReport {
    /// Goldfisher's own turn on which the opponent dies, if a kill exists
    /// within the horizon
    pub kill_turn: Option<u32>,
    pub line: Vec<(u64, Action)>,
}

pub struct Solver {
    pub tt: TranspositionTable,
    pub dominance: DominanceTable,
    pub limits: SearchLimits,
}

impl Solver {
    pub fn new(limits: SearchLimits) -> Self {
        Solver {
            tt: TranspositionTable::new(limits.tt_capacity),
            dominance: DominanceTable::new(),
            limits,
        }
    }

    /// Solve a matchup: game value from the first mover's perspective plus
    /// the principal variation.
    pub fn solve(&mut self, hand0: &[CardId], hand1: &[CardId], first: u8) -> Result<SolveReport> {
        let state = GameState::new(hand0, hand1, first)?;
        let state = actions::advance(state)?;
        let mut ctx = SearchContext::new(&mut self.tt, &mut self.dominance, self.limits, first);

        let (value, _, complete) = search_root(&mut ctx, &state)?;
        let principal_variation = if complete {
            principal_variation(&mut ctx, &state)?
        } else {
            Vec::new()
        };
        Ok(SolveReport {
            value,
            principal_variation,
            nodes: ctx.nodes,
            complete,
        })
    }
}

const PV_STEP_CAP: usize = 600;

/// Replay best-play from the root, consulting the warm caches for each
/// candidate. Stops at a terminal, a repetition of the line (a draw), or
/// the step cap.
fn principal_variation(
    ctx: &mut SearchContext,
    root: &GameState,
) -> Result<Vec<(u64, Action)>> {
    let mut line = Vec::new();
    let mut on_line: Vec<u64> = Vec::new();
    let mut state = root.clone();

    while line.len() < PV_STEP_CAP {
        if state.is_over() || state.turn > ctx.limits.turn_cap {
            break;
        }
        let fp = fingerprint(&state);
        if on_line.contains(&fp) {
            break;
        }
        on_line.push(fp);

        let maximizing = actions::priority_player(&state) == ctx.perspective;
        let mut best: Option<(i8, Action, GameState)> = None;
        for action in ordered_actions(&state) {
            let child = actions::apply_unchecked(&state, &action)?;
            let (value, _) = minimax(ctx, &child, 1, -2, 2)?;
            let better = match &best {
                None => true,
                Some((v, _, _)) => {
                    if maximizing {
                        value > *v
                    } else {
                        value < *v
                    }
                }
            };
            if better {
                best = Some((value, action, child));
            }
        }
        let Some((_, action, child)) = best else {
            break;
        };
        line.push((fp, action));
        state = child;
    }
    Ok(line)
}

fn goldfish_turns(turn: u32) -> u32 {
    // The goldfisher is player 0 on the play; their turns are the odd
    // global turns.
    (turn + 1) / 2
}

/// One-sided play against an inert opponent: find the earliest kill.
///
/// The opponent has no cards and every choice it faces is a forced pass,
/// so this is a single-agent shortest-path search over the goldfisher's
/// decisions, memoized on the state fingerprint. The kill turn counts the
/// goldfisher's own turns.
pub fn goldfish(hand: &[CardId], max_turns: u32) -> Result<GoldfishReport> {
    let state = GameState::new(hand, &[], 0)?;
    let state = actions::advance(state)?;
    let mut memo: FxHashMap<u64, Option<u32>> = FxHashMap::default();

    let relative = kill_search(&state, max_turns, &mut memo)?;
    let kill_turn = relative.map(|t| t + goldfish_turns(state.turn));
    let line = if kill_turn.is_some() {
        kill_line(state, max_turns, &mut memo)?
    } else {
        Vec::new()
    };
    Ok(GoldfishReport { kill_turn, line })
}

/// Minimal additional goldfisher turns until the kill, relative to the
/// given state; `None` when no kill exists within the horizon.
fn kill_search(
    state: &GameState,
    max_turns: u32,
    memo: &mut FxHashMap<u64, Option<u32>>,
) -> Result<Option<u32>> {
    if let Some(outcome) = state.outcome {
        return Ok(match outcome {
            Outcome::Winner(0) => Some(0),
            _ => None,
        });
    }
    if goldfish_turns(state.turn) > max_turns {
        return Ok(None);
    }
    if actions::priority_player(state) == 1 {
        let child = actions::apply_unchecked(state, &Action::Pass)?;
        let crossings = goldfish_turns(child.turn) - goldfish_turns(state.turn);
        return Ok(kill_search(&child, max_turns, memo)?.map(|t| t + crossings));
    }

    let key = fingerprint(state);
    if let Some(cached) = memo.get(&key) {
        return Ok(*cached);
    }
    // In-progress marker: a line that loops back here makes no progress.
    memo.insert(key, None);

    let mut best: Option<u32> = None;
    for action in ordered_actions(state) {
        let child = actions::apply_unchecked(state, &action)?;
        let crossings = goldfish_turns(child.turn) - goldfish_turns(state.turn);
        if let Some(t) = kill_search(&child, max_turns, memo)? {
            let total = t + crossings;
            best = Some(best.map_or(total, |b| b.min(total)));
        }
    }
    memo.insert(key, best);
    Ok(best)
}

fn kill_line(
    mut state: GameState,
    max_turns: u32,
    memo: &mut FxHashMap<u64, Option<u32>>,
) -> Result<Vec<(u64, Action)>> {
    let mut line = Vec::new();
    while !state.is_over() && line.len() < PV_STEP_CAP {
        if actions::priority_player(&state) == 1 {
            state = actions::apply_unchecked(&state, &Action::Pass)?;
            continue;
        }
        let fp = fingerprint(&state);
        let mut best: Option<(u32, Action, GameState)> = None;
        for action in ordered_actions(&state) {
            let child = actions::apply_unchecked(&state, &action)?;
            let crossings = goldfish_turns(child.turn) - goldfish_turns(state.turn);
            let value = if child.outcome == Some(Outcome::Winner(0)) {
                Some(crossings)
            } else {
                kill_search(&child, max_turns, memo)?.map(|t| t + crossings)
            };
            if let Some(total) = value {
                if best.as_ref().map_or(true, |(b, _, _)| total < *b) {
                    best = Some((total, action, child));
                }
            }
        }
        let Some((_, action, child)) = best else {
            break;
        };
        line.push((fp, action));
        state = child;
    }
    Ok(line)
}

/// The |D| x |D| matrix of solved values: entry (i, j) is deck i's value
/// on the play plus its value on the draw against deck j, in [-2, +2].
/// Antisymmetric by construction; consumed by the external Nash layer.
pub fn payoff_matrix(decks: &[&[CardId]], limits: SearchLimits) -> Result<Vec<Vec<i32>>> {
    let n = decks.len();
    let mut matrix = vec![vec![0i32; n]; n];
    for i in 0..n {
        for j in i..n {
            let play = Solver::new(limits).solve(decks[i], decks[j], 0)?.value as i32;
            let on_draw = -(Solver::new(limits).solve(decks[i], decks[j], 1)?.value as i32);
            matrix[i][j] = play + on_draw;
            if i != j {
                matrix[j][i] = -(play + on_draw);
            }
        }
    }
    Ok(matrix)
}
