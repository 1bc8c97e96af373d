//! Canonical state fingerprints
//!
//! The transposition table, repetition detection, and snapshot records are
//! all keyed on a stable `u64` digest of the gameplay-relevant state.
//! Battlefields and hands are unordered multisets, so their encodings are
//! sorted before mixing; the turn counter is deliberately excluded (the
//! outcome of a position does not depend on how many turns it took to
//! reach it, and excluding it multiplies cache hits). The dominance table
//! uses the life-independent variant.

use crate::core::CardId;
use crate::game::state::{GameState, Permanent};

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn clamp_u64(value: i32, bits: u32) -> u64 {
    let max = (1u64 << bits) - 1;
    (value.max(0) as u64).min(max)
}

/// Pack a permanent's full tracked state into one word.
fn encode_permanent(perm: &Permanent) -> u64 {
    let mut w: u64 = perm.card.ordinal() as u64;
    w = (w << 1) | perm.tapped as u64;
    w = (w << 1) | perm.entered_this_turn as u64;
    w = (w << 1) | perm.animated as u64;
    w = (w << 1) | perm.attacking as u64;
    w = (w << 1) | perm.combat_trigger_used as u64;
    w = (w << 1) | perm.targeted_this_turn as u64;
    w = (w << 6) | clamp_u64(perm.damage, 6);
    w = (w << 6) | (perm.plus_counters as u64).min(63);
    w = (w << 4) | (perm.level as u64).min(15);
    w = (w << 2) | (perm.stun_counters as u64).min(3);
    w = (w << 2) | (perm.spore_counters as u64).min(3);
    w = (w << 3) | clamp_u64(perm.pump_power, 3);
    w = (w << 3) | clamp_u64(perm.pump_toughness, 3);
    splitmix64(w)
}

#[inline]
fn fold(acc: &mut u64, token: u64) {
    *acc = splitmix64(acc.rotate_left(13) ^ token);
}

fn fold_sorted(acc: &mut u64, mut tokens: Vec<u64>) {
    tokens.sort_unstable();
    fold(acc, tokens.len() as u64);
    for t in tokens {
        fold(acc, t);
    }
}

fn fingerprint_impl(state: &GameState, include_life: bool) -> u64 {
    let mut acc: u64 = 0xB0A2_1D5E_3CB0_0001;

    fold(&mut acc, state.active as u64);
    fold(&mut acc, state.phase.ordinal() as u64);
    fold(&mut acc, state.land_played as u64);
    if include_life {
        for p in &state.players {
            fold(&mut acc, p.life as i64 as u64);
        }
    }

    for p in &state.players {
        let hand: Vec<u64> = p.hand.iter().map(|c| c.ordinal() as u64).collect();
        fold_sorted(&mut acc, hand);

        let field: Vec<u64> = p.battlefield.iter().map(encode_permanent).collect();
        fold_sorted(&mut acc, field);

        let grave: Vec<u64> = p
            .graveyard
            .iter()
            .map(|c: &CardId| c.ordinal() as u64)
            .collect();
        fold_sorted(&mut acc, grave);

        fold(&mut acc, p.library as u64);
    }

    // Combat assignments are canonicalized through permanent encodings, not
    // raw indices, so two states that differ only by battlefield ordering
    // hash identically.
    let attacker_field = &state.player(state.active).battlefield;
    let defender_field = &state.player(GameState::opponent(state.active)).battlefield;
    let blocks: Vec<u64> = state
        .combat
        .blocks
        .iter()
        .map(|b| {
            let mut t = encode_permanent(&attacker_field[b.attacker as usize]);
            t = splitmix64(t ^ (b.ordered as u64) << 63);
            for &blocker in &b.blockers {
                t = splitmix64(t.rotate_left(7) ^ encode_permanent(&defender_field[blocker as usize]));
            }
            t
        })
        .collect();
    fold_sorted(&mut acc, blocks);

    acc
}

/// Canonical fingerprint of the full state (transposition key).
pub fn fingerprint(state: &GameState) -> u64 {
    fingerprint_impl(state, true)
}

/// Fingerprint with life totals excluded, for life-pair dominance checks.
pub fn board_fingerprint(state: &GameState) -> u64 {
    fingerprint_impl(state, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;

    fn sample() -> GameState {
        GameState::new(
            &[CardId::Plains, CardId::StudentOfWarfare],
            &[CardId::Island, CardId::SleepCursedFaerie],
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint(&sample()), fingerprint(&sample()));
    }

    #[test]
    fn test_battlefield_order_normalized() {
        let mut a = sample();
        let mut b = sample();
        let mut plains = Permanent::new(CardId::Plains);
        plains.entered_this_turn = false;
        let student = Permanent::new(CardId::StudentOfWarfare);

        a.players[0].battlefield.push(plains.clone());
        a.players[0].battlefield.push(student.clone());
        b.players[0].battlefield.push(student);
        b.players[0].battlefield.push(plains);
        a.players[0].hand.clear();
        b.players[0].hand.clear();

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_life_changes_fingerprint_but_not_board() {
        let mut a = sample();
        let b = sample();
        a.players[1].life -= 3;
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(board_fingerprint(&a), board_fingerprint(&b));
    }

    #[test]
    fn test_turn_counter_excluded() {
        let mut a = sample();
        let b = sample();
        a.turn += 4;
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_tracked_flags_distinguish_states() {
        let mut a = sample();
        let mut b = sample();
        a.players[0].battlefield.push(Permanent::new(CardId::StudentOfWarfare));
        b.players[0].battlefield.push(Permanent::new(CardId::StudentOfWarfare));
        a.players[0].hand.clear();
        b.players[0].hand.clear();
        b.players[0].battlefield[0].level = 3;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
