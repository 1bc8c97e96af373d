//! Per-card behavior hooks
//!
//! The rules engine is card-agnostic: everything a card does beyond its
//! static record flows through the three hooks here, dispatched on
//! `CardId`. Hooks take the state by value and return the successor; the
//! engine owns ordering (active player first, then permanent index
//! ascending) and state-based sweeps. Adding a card means a record in
//! `core::card` plus match arms here.

use crate::core::{CardId, Keyword, ManaCost};
use crate::game::actions::{Ability, Action};
use crate::game::phase::Phase;
use crate::game::state::{GameState, Outcome, Permanent};
use smallvec::SmallVec;

/// Events the engine announces to card hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    EnteredBattlefield { player: u8, perm: usize },
    Upkeep { player: u8, perm: usize },
    BeginCombat { player: u8, perm: usize },
    DealtCombatDamageToPlayer { player: u8, perm: usize },
    Died { player: u8, card: CardId, power: i32 },
}

/// Actions a card contributes from hand. At most one per card: a land drop
/// or a cast with its canonical payment.
pub fn play_actions(state: &GameState, player: u8, hand_idx: usize) -> Option<Action> {
    if state.active != player || !state.phase.is_main() {
        return None;
    }
    let card = state.player(player).hand[hand_idx];
    if card.is_land() {
        if state.land_played {
            return None;
        }
        return Some(Action::PlayLand {
            hand: hand_idx as u8,
        });
    }

    let payment = state.canonical_payment(player, &card.data().cost)?;
    // Scythe Tiger's trigger sacrifices a land; casting it with nothing to
    // sacrifice just kills it, which is never a line worth exploring.
    if card == CardId::ScytheTiger
        && !state
            .player(player)
            .battlefield
            .iter()
            .any(|p| p.card.is_land())
    {
        return None;
    }
    Some(Action::CastCreature {
        hand: hand_idx as u8,
        payment,
    })
}

/// Payment for Mutavault's `{1}` that never taps the vault itself.
fn animation_payment(state: &GameState, player: u8, perm_idx: usize) -> Option<SmallVec<[u8; 4]>> {
    let battlefield = &state.player(player).battlefield;
    for pass in 0..2 {
        for (i, perm) in battlefield.iter().enumerate() {
            if i == perm_idx || perm.tapped || !perm.is_mana_source() {
                continue;
            }
            if perm.is_creature() && perm.entered_this_turn {
                continue;
            }
            let colorless = perm.mana_color() == Some(crate::core::Color::Colorless);
            if (pass == 0) == colorless {
                let mut payment = SmallVec::new();
                payment.push(i as u8);
                return Some(payment);
            }
        }
    }
    None
}

/// Distinct own-creature targets, lowest index per signature. Shroud
/// refuses targeting even from its own controller.
fn creature_targets(state: &GameState, player: u8) -> Vec<u8> {
    let mut seen = Vec::new();
    let mut targets = Vec::new();
    for (i, perm) in state.player(player).creatures() {
        if perm.has_keyword(Keyword::Shroud) {
            continue;
        }
        let sig = perm.signature();
        if !seen.contains(&sig) {
            seen.push(sig);
            targets.push(i as u8);
        }
    }
    targets
}

/// Activated-ability actions a permanent contributes in the current phase.
pub fn battlefield_actions(state: &GameState, player: u8, perm_idx: usize) -> Vec<Action> {
    let perm = &state.player(player).battlefield[perm_idx];
    let defender = GameState::opponent(state.active);
    let own_main = state.active == player && state.phase.is_main();
    let mut actions = Vec::new();

    match perm.card {
        CardId::Mutavault => {
            // {1}: becomes a 2/2 creature until end of turn. Offered in the
            // controller's main phases and while choosing blocks.
            let window = own_main || (player == defender && state.phase == Phase::DeclareBlockers);
            if window && !perm.animated && !perm.tapped {
                if let Some(payment) = animation_payment(state, player, perm_idx) {
                    actions.push(Action::Activate {
                        permanent: perm_idx as u8,
                        ability: Ability::Animate,
                        payment,
                    });
                }
            }
        }
        CardId::Pendelhaven => {
            // T: a 1/1 gets +1/+2 until end of turn; the interesting window
            // is right before blocks are declared.
            if player == defender && state.phase == Phase::DeclareBlockers && !perm.tapped {
                for target in creature_targets(state, player) {
                    let t = &state.player(player).battlefield[target as usize];
                    if t.power() == 1 && t.toughness() == 1 {
                        actions.push(Action::Activate {
                            permanent: perm_idx as u8,
                            ability: Ability::Pump { target },
                            payment: SmallVec::new(),
                        });
                    }
                }
            }
        }
        CardId::Hammerheim => {
            // T: target a creature. Worthless on its own, but it turns on
            // valiant triggers.
            let window = own_main
                || (state.active == player && state.phase == Phase::DeclareAttackers)
                || (player == defender && state.phase == Phase::DeclareBlockers);
            if window && !perm.tapped {
                for target in creature_targets(state, player) {
                    actions.push(Action::Activate {
                        permanent: perm_idx as u8,
                        ability: Ability::TargetCreature { target },
                        payment: SmallVec::new(),
                    });
                }
            }
        }
        _ => {}
    }
    actions
}

/// A permanent became the target of an ability its controller owns.
pub fn become_target(mut state: GameState, player: u8, perm_idx: usize) -> GameState {
    let perm = &mut state.players[player as usize].battlefield[perm_idx];
    // Valiant: first time each turn, a +1/+1 counter.
    if perm.card == CardId::HeartfireHero {
        if !perm.targeted_this_turn {
            perm.targeted_this_turn = true;
            perm.plus_counters += 1;
        }
    }
    state
}

/// Level up Student of Warfare as long as white mana is open. The
/// reference solver makes level-up automatic rather than a choice: paying
/// W for a level is never wrong for these decks, and it removes a whole
/// tier of branching.
fn auto_level(mut state: GameState, player: u8, perm_idx: usize) -> GameState {
    loop {
        let source = state
            .player(player)
            .battlefield
            .iter()
            .position(|p| {
                !p.tapped
                    && p.mana_color() == Some(crate::core::Color::White)
                    && !(p.is_creature() && p.entered_this_turn)
            });
        let Some(source) = source else {
            return state;
        };
        let field = &mut state.players[player as usize].battlefield;
        field[source].tapped = true;
        field[perm_idx].level += 1;
    }
}

/// Triggered effects. Returns the transformed state; the engine has
/// already decided firing order.
pub fn on_event(mut state: GameState, event: GameEvent) -> GameState {
    match event {
        GameEvent::EnteredBattlefield { player, perm } => {
            match state.player(player).battlefield[perm].card {
                CardId::SleepCursedFaerie => {
                    // Enters tapped with three stun counters.
                    let p = &mut state.players[player as usize].battlefield[perm];
                    p.tapped = true;
                    p.stun_counters = 3;
                    state
                }
                CardId::ScytheTiger => {
                    // Sacrifice a land. The cast is only offered with a
                    // land on the battlefield, so one is always there.
                    let land = state
                        .player(player)
                        .battlefield
                        .iter()
                        .position(|p| p.card.is_land())
                        .expect("play_actions guarantees a land to sacrifice");
                    let card = state.players[player as usize].battlefield.remove(land).card;
                    state.players[player as usize].graveyard.push(card);
                    state
                }
                _ => state,
            }
        }
        GameEvent::Upkeep { player, perm } => {
            match state.player(player).battlefield[perm].card {
                CardId::Thallid => {
                    // A spore counter each upkeep; three buy a Saproling.
                    // Token creation is automatic at three, as in the
                    // reference, to keep the branching down.
                    let p = &mut state.players[player as usize].battlefield[perm];
                    p.spore_counters += 1;
                    if p.spore_counters >= 3 {
                        p.spore_counters -= 3;
                        state.players[player as usize]
                            .battlefield
                            .push(Permanent::new(CardId::Saproling));
                    }
                    state
                }
                CardId::StudentOfWarfare => auto_level(state, player, perm),
                _ => state,
            }
        }
        GameEvent::BeginCombat { player, perm } => {
            match state.player(player).battlefield[perm].card {
                // A land drop after upkeep can open more white mana.
                CardId::StudentOfWarfare => auto_level(state, player, perm),
                _ => state,
            }
        }
        GameEvent::DealtCombatDamageToPlayer { player, perm } => {
            match state.player(player).battlefield[perm].card {
                CardId::StromkirkNoble => {
                    state.players[player as usize].battlefield[perm].plus_counters += 1;
                    state
                }
                _ => state,
            }
        }
        GameEvent::Died { player, card, power } => match card {
            CardId::HeartfireHero => {
                // Deals damage equal to its power to the opponent.
                let opponent = GameState::opponent(player);
                state.players[opponent as usize].life -= power;
                if state.players[opponent as usize].life <= 0 {
                    state.outcome = Some(Outcome::Winner(player));
                }
                state
            }
            _ => state,
        },
    }
}

/// Cost of the spell a cast action would put on the battlefield; used by
/// the move-ordering heuristic.
pub fn cast_cost(state: &GameState, player: u8, hand_idx: usize) -> ManaCost {
    state.player(player).hand[hand_idx].data().cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;

    fn on_field(state: &mut GameState, player: usize, card: CardId) -> usize {
        let mut perm = Permanent::new(card);
        perm.entered_this_turn = false;
        state.players[player].battlefield.push(perm);
        state.players[player].battlefield.len() - 1
    }

    #[test]
    fn test_faerie_enters_tapped_and_stunned() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        state.players[0].battlefield.push(Permanent::new(CardId::SleepCursedFaerie));
        state.players[0].dealt = 1;
        let state = on_event(state, GameEvent::EnteredBattlefield { player: 0, perm: 0 });
        let faerie = &state.players[0].battlefield[0];
        assert!(faerie.tapped);
        assert_eq!(faerie.stun_counters, 3);
    }

    #[test]
    fn test_tiger_sacrifices_a_land() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        on_field(&mut state, 0, CardId::Forest);
        state.players[0].battlefield.push(Permanent::new(CardId::ScytheTiger));
        state.players[0].dealt = 2;
        let state = on_event(state, GameEvent::EnteredBattlefield { player: 0, perm: 1 });
        assert_eq!(state.players[0].battlefield.len(), 1);
        assert_eq!(state.players[0].battlefield[0].card, CardId::ScytheTiger);
        assert_eq!(state.players[0].graveyard.as_slice(), &[CardId::Forest]);
    }

    #[test]
    fn test_thallid_spores_into_saproling() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        let idx = on_field(&mut state, 0, CardId::Thallid);
        state.players[0].dealt = 1;
        state.players[0].battlefield[idx].spore_counters = 2;
        let state = on_event(state, GameEvent::Upkeep { player: 0, perm: idx });
        assert_eq!(state.players[0].battlefield[idx].spore_counters, 0);
        assert_eq!(state.players[0].battlefield.len(), 2);
        assert_eq!(state.players[0].battlefield[1].card, CardId::Saproling);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_student_auto_levels_with_open_white() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        on_field(&mut state, 0, CardId::Plains);
        let student = on_field(&mut state, 0, CardId::StudentOfWarfare);
        state.players[0].dealt = 2;
        let state = on_event(state, GameEvent::Upkeep { player: 0, perm: student });
        assert_eq!(state.players[0].battlefield[student].level, 1);
        assert!(state.players[0].battlefield[0].tapped);
    }

    #[test]
    fn test_valiant_once_per_turn() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        let hero = on_field(&mut state, 0, CardId::HeartfireHero);
        state.players[0].dealt = 1;
        let state = become_target(state, 0, hero);
        assert_eq!(state.players[0].battlefield[hero].plus_counters, 1);
        let state = become_target(state, 0, hero);
        assert_eq!(state.players[0].battlefield[hero].plus_counters, 1);
    }

    #[test]
    fn test_hero_burst_can_win() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        state.players[1].life = 2;
        let state = on_event(
            state,
            GameEvent::Died {
                player: 0,
                card: CardId::HeartfireHero,
                power: 2,
            },
        );
        assert_eq!(state.outcome, Some(Outcome::Winner(0)));
    }

    #[test]
    fn test_animation_payment_skips_self() {
        let mut state = GameState::new(&[], &[], 0).unwrap();
        let vault = on_field(&mut state, 0, CardId::Mutavault);
        state.players[0].dealt = 1;
        assert!(animation_payment(&state, 0, vault).is_none());

        on_field(&mut state, 0, CardId::Mutavault);
        state.players[0].dealt = 2;
        let payment = animation_payment(&state, 0, vault).unwrap();
        assert_eq!(payment.as_slice(), &[1]);
    }
}
