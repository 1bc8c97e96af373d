//! Grinding-position detector
//!
//! Some matchups never converge by raw search: a Thallid making a token
//! every third upkeep against a vanilla creature loops practically
//! forever. When the search exhausts its depth budget, this detector
//! converts positions whose outcome is mathematically forced into exact
//! values and everything else into a conservative draw. It only decides
//! once both hands are empty — with cards left to deploy, or with a
//! lethal race still live above the cap, nothing is provably settled,
//! which is why it runs solely at the last-resort cutoff and its results
//! are never cached.

use crate::core::CardId;
use crate::game::state::{GameState, PlayerState};

fn has_token_generator(player: &PlayerState) -> bool {
    player
        .battlefield
        .iter()
        .any(|p| p.card == CardId::Thallid)
}

/// Can any creature on this side outgrow a fixed-size board? Counter and
/// level mechanics all qualify.
fn can_grow(player: &PlayerState) -> bool {
    player.battlefield.iter().any(|p| {
        p.is_creature()
            && matches!(
                p.card,
                CardId::StudentOfWarfare
                    | CardId::StromkirkNoble
                    | CardId::HeartfireHero
                    | CardId::LuminarchAspirant
            )
    })
}

fn has_creatures(player: &PlayerState) -> bool {
    player.creatures().any(|(_, p)| p.power() > 0)
}

/// Exhausted the depth budget: decide what can be decided, call the rest
/// a draw. Never returns `None`.
pub fn evaluate_at_depth_cap(state: &GameState, perspective: u8) -> i8 {
    if !state.players[0].hand.is_empty() || !state.players[1].hand.is_empty() {
        return 0;
    }
    let p0 = &state.players[0];
    let p1 = &state.players[1];
    let p0_creatures = has_creatures(p0);
    let p1_creatures = has_creatures(p1);

    // Creatures against an empty board grind out a win eventually.
    if p0_creatures && !p1_creatures {
        return if perspective == 0 { 1 } else { -1 };
    }
    if p1_creatures && !p0_creatures {
        return if perspective == 1 { 1 } else { -1 };
    }

    let p0_gen = has_token_generator(p0);
    let p1_gen = has_token_generator(p1);
    let p0_grows = can_grow(p0);
    let p1_grows = can_grow(p1);

    // A token generator buries a static board.
    if p1_gen && !p0_gen && !p0_grows {
        return if perspective == 1 { 1 } else { -1 };
    }
    if p0_gen && !p1_gen && !p1_grows {
        return if perspective == 0 { 1 } else { -1 };
    }

    // A grower outpaces linear tokens.
    if p0_grows && !p0_gen && p1_gen && !p1_grows {
        return if perspective == 0 { 1 } else { -1 };
    }
    if p1_grows && !p1_gen && p0_gen && !p0_grows {
        return if perspective == 1 { 1 } else { -1 };
    }

    0
}
