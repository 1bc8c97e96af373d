//! Combat damage resolution
//!
//! Runs once per combat from the `CombatDamage` phase, after every
//! gang-blocked attacker's damage order has been fixed. Damage within a
//! step is simultaneous: all assignments are marked first, then lethality
//! is swept. A first-strike step precedes the normal step when any
//! combatant has first or double strike; a creature killed in the
//! first-strike step deals no normal damage, and an attacker whose
//! blockers all died in it reaches the defending player only with trample.

use crate::catalog;
use crate::catalog::GameEvent;
use crate::core::Keyword;
use crate::game::state::{GameState, Outcome};

#[derive(Clone, Copy, PartialEq)]
enum Step {
    FirstStrike,
    Normal,
}

fn deals_in(perm_fs: bool, perm_ds: bool, step: Step) -> bool {
    match step {
        Step::FirstStrike => perm_fs || perm_ds,
        Step::Normal => !perm_fs || perm_ds,
    }
}

/// True when the pending combat needs the extra first-strike damage step.
fn has_first_strike_step(state: &GameState) -> bool {
    let attacker_p = state.active;
    let defender_p = GameState::opponent(attacker_p);
    for &att in &state.combat.attackers {
        let a = &state.player(attacker_p).battlefield[att as usize];
        if a.has_keyword(Keyword::FirstStrike) || a.has_keyword(Keyword::DoubleStrike) {
            return true;
        }
        for &b in state.combat.blockers_of(att) {
            let blocker = &state.player(defender_p).battlefield[b as usize];
            if blocker.has_keyword(Keyword::FirstStrike)
                || blocker.has_keyword(Keyword::DoubleStrike)
            {
                return true;
            }
        }
    }
    false
}

/// Resolve all combat damage and its consequences. Leaves dead creatures
/// removed, triggers fired, and the winner set when lethal; the caller
/// advances the phase.
pub fn resolve_combat_damage(state: GameState) -> GameState {
    let mut state = state;
    let attacker_p = state.active;
    let defender_p = GameState::opponent(attacker_p);

    let mut dead_attackers: Vec<u8> = Vec::new();
    let mut dead_blockers: Vec<u8> = Vec::new();

    if has_first_strike_step(&state) {
        state = damage_step(
            state,
            Step::FirstStrike,
            &mut dead_attackers,
            &mut dead_blockers,
        );
        if state.is_over() {
            return state;
        }
    }
    state = damage_step(state, Step::Normal, &mut dead_attackers, &mut dead_blockers);
    if state.is_over() {
        return state;
    }

    // Move the dead off the battlefield, highest index first so earlier
    // indices stay valid, and fire death triggers; active player's side
    // first per the canonical trigger order.
    dead_attackers.sort_unstable();
    dead_blockers.sort_unstable();
    for &idx in dead_attackers.iter().rev() {
        state = bury(state, attacker_p, idx as usize);
        if state.is_over() {
            return state;
        }
    }
    for &idx in dead_blockers.iter().rev() {
        state = bury(state, defender_p, idx as usize);
        if state.is_over() {
            return state;
        }
    }
    state
}

fn bury(mut state: GameState, player: u8, idx: usize) -> GameState {
    let perm = state.players[player as usize].battlefield.remove(idx);
    let power = perm.power();
    if !perm.card.is_token() {
        state.players[player as usize].graveyard.push(perm.card);
    }
    catalog::on_event(
        state,
        GameEvent::Died {
            player,
            card: perm.card,
            power,
        },
    )
}

fn damage_step(
    mut state: GameState,
    step: Step,
    dead_attackers: &mut Vec<u8>,
    dead_blockers: &mut Vec<u8>,
) -> GameState {
    let attacker_p = state.active;
    let defender_p = GameState::opponent(attacker_p);
    let attackers: Vec<u8> = state.combat.attackers.to_vec();

    let mut deathtouched_attackers: Vec<u8> = Vec::new();
    let mut deathtouched_blockers: Vec<u8> = Vec::new();
    let mut lifelink: [i32; 2] = [0, 0];
    let mut player_damage_sources: Vec<u8> = Vec::new();
    let mut defender_damage: i32 = 0;

    for &att in &attackers {
        if dead_attackers.contains(&att) {
            continue;
        }
        let (a_power, a_fs, a_ds, a_dt, a_trample, a_ll) = {
            let a = &state.player(attacker_p).battlefield[att as usize];
            (
                a.power(),
                a.has_keyword(Keyword::FirstStrike),
                a.has_keyword(Keyword::DoubleStrike),
                a.has_keyword(Keyword::Deathtouch),
                a.has_keyword(Keyword::Trample),
                a.has_keyword(Keyword::Lifelink),
            )
        };
        let a_deals = deals_in(a_fs, a_ds, step);

        let assigned_blockers: Vec<u8> = state
            .combat
            .blockers_of(att)
            .iter()
            .copied()
            .collect();
        let live_blockers: Vec<u8> = assigned_blockers
            .iter()
            .copied()
            .filter(|b| !dead_blockers.contains(b))
            .collect();

        if assigned_blockers.is_empty() {
            // Unblocked: power to the defending player.
            if a_deals && a_power > 0 {
                defender_damage += a_power;
                if a_ll {
                    lifelink[attacker_p as usize] += a_power;
                }
                player_damage_sources.push(att);
            }
            continue;
        }

        if live_blockers.is_empty() {
            // All blockers died in the first-strike step: only trample
            // damage carries through to the player.
            if a_deals && a_trample && a_power > 0 {
                defender_damage += a_power;
                if a_ll {
                    lifelink[attacker_p as usize] += a_power;
                }
                player_damage_sources.push(att);
            }
            continue;
        }

        // Attacker's damage across its blockers, lethal-first in the
        // assigned order.
        if a_deals && a_power > 0 {
            let mut remaining = a_power;
            let last = *live_blockers.last().unwrap();
            for &b in &live_blockers {
                if remaining == 0 {
                    break;
                }
                let lethal = {
                    let blocker = &state.player(defender_p).battlefield[b as usize];
                    if a_dt {
                        1
                    } else {
                        (blocker.toughness() - blocker.damage).max(1)
                    }
                };
                let assign = if b == last && !a_trample {
                    remaining
                } else {
                    remaining.min(lethal)
                };
                state.players[defender_p as usize].battlefield[b as usize].damage += assign;
                if a_dt && assign > 0 {
                    deathtouched_blockers.push(b);
                }
                if a_ll {
                    lifelink[attacker_p as usize] += assign;
                }
                remaining -= assign;
            }
            if a_trample && remaining > 0 {
                defender_damage += remaining;
                if a_ll {
                    lifelink[attacker_p as usize] += remaining;
                }
                player_damage_sources.push(att);
            }
        }

        // Each surviving blocker strikes the attacker back.
        for &b in &live_blockers {
            let (b_power, b_fs, b_ds, b_dt, b_ll) = {
                let blocker = &state.player(defender_p).battlefield[b as usize];
                (
                    blocker.power(),
                    blocker.has_keyword(Keyword::FirstStrike),
                    blocker.has_keyword(Keyword::DoubleStrike),
                    blocker.has_keyword(Keyword::Deathtouch),
                    blocker.has_keyword(Keyword::Lifelink),
                )
            };
            if deals_in(b_fs, b_ds, step) && b_power > 0 {
                state.players[attacker_p as usize].battlefield[att as usize].damage += b_power;
                if b_dt {
                    deathtouched_attackers.push(att);
                }
                if b_ll {
                    lifelink[defender_p as usize] += b_power;
                }
            }
        }
    }

    state.players[defender_p as usize].life -= defender_damage;
    state.players[attacker_p as usize].life += lifelink[attacker_p as usize];
    state.players[defender_p as usize].life += lifelink[defender_p as usize];

    // A player at zero from combat damage loses before death triggers see
    // the board.
    if state.players[defender_p as usize].life <= 0 {
        state.outcome = Some(Outcome::Winner(attacker_p));
        return state;
    }

    for att in player_damage_sources {
        state = catalog::on_event(
            state,
            GameEvent::DealtCombatDamageToPlayer {
                player: attacker_p,
                perm: att as usize,
            },
        );
    }

    // Sweep lethality for this step.
    for &att in &attackers {
        if dead_attackers.contains(&att) {
            continue;
        }
        let a = &state.player(attacker_p).battlefield[att as usize];
        if a.damage >= a.toughness() || (a.damage > 0 && deathtouched_attackers.contains(&att)) {
            dead_attackers.push(att);
        }
    }
    let defender_count = state.player(defender_p).battlefield.len();
    for b in 0..defender_count as u8 {
        if dead_blockers.contains(&b) {
            continue;
        }
        let perm = &state.player(defender_p).battlefield[b as usize];
        if !perm.is_creature() {
            continue;
        }
        if perm.damage > 0
            && (perm.damage >= perm.toughness() || deathtouched_blockers.contains(&b))
        {
            dead_blockers.push(b);
        }
    }

    state
}
