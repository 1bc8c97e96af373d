//! Match state: players, permanents, combat scratch
//!
//! The state is a plain value: successors are produced by cloning, and all
//! cross-references (combat assignments, payment tap-sets) are stable
//! indices into the owning player's battlefield, never pointers.

use crate::core::{CardId, Color, Keyword, ManaCost, ManaPool};
use crate::game::phase::Phase;
use crate::{Result, SolverError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub const STARTING_LIFE: i32 = 20;

/// A card on the battlefield plus its per-instance tracking state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permanent {
    pub card: CardId,
    pub tapped: bool,
    pub entered_this_turn: bool,
    /// Creature-land is currently a creature (Mutavault)
    pub animated: bool,
    pub attacking: bool,
    /// Damage marked this turn
    pub damage: i32,
    pub plus_counters: u8,
    /// Level counters (Student of Warfare)
    pub level: u8,
    pub stun_counters: u8,
    pub spore_counters: u8,
    /// Until-end-of-turn pump (Pendelhaven)
    pub pump_power: i32,
    pub pump_toughness: i32,
    pub combat_trigger_used: bool,
    pub targeted_this_turn: bool,
}

impl Permanent {
    pub fn new(card: CardId) -> Self {
        Permanent {
            card,
            tapped: false,
            entered_this_turn: true,
            animated: false,
            attacking: false,
            damage: 0,
            plus_counters: 0,
            level: 0,
            stun_counters: 0,
            spore_counters: 0,
            pump_power: 0,
            pump_toughness: 0,
            combat_trigger_used: false,
            targeted_this_turn: false,
        }
    }

    /// Is this permanent a creature right now?
    pub fn is_creature(&self) -> bool {
        self.card.is_creature_card() || (self.card == CardId::Mutavault && self.animated)
    }

    fn level_stats(&self) -> (i32, i32) {
        // Student of Warfare: 1/1, 3/3 first strike at level 2, 4/4 double
        // strike at level 7.
        if self.level >= 7 {
            (4, 4)
        } else if self.level >= 2 {
            (3, 3)
        } else {
            (1, 1)
        }
    }

    pub fn power(&self) -> i32 {
        let base = match self.card {
            CardId::StudentOfWarfare => self.level_stats().0,
            CardId::Mutavault if self.animated => self.card.data().power,
            CardId::Mutavault => 0,
            _ => self.card.data().power,
        };
        base + self.plus_counters as i32 + self.pump_power
    }

    pub fn toughness(&self) -> i32 {
        let base = match self.card {
            CardId::StudentOfWarfare => self.level_stats().1,
            CardId::Mutavault if self.animated => self.card.data().toughness,
            CardId::Mutavault => 0,
            _ => self.card.data().toughness,
        };
        base + self.plus_counters as i32 + self.pump_toughness
    }

    pub fn has_keyword(&self, kw: Keyword) -> bool {
        match (self.card, kw) {
            (CardId::StudentOfWarfare, Keyword::FirstStrike) => self.level >= 2,
            (CardId::StudentOfWarfare, Keyword::DoubleStrike) => self.level >= 7,
            _ => self.card.has_keyword(kw),
        }
    }

    pub fn has_flying(&self) -> bool {
        self.has_keyword(Keyword::Flying)
    }

    pub fn is_mana_source(&self) -> bool {
        self.card.data().mana_color.is_some()
    }

    pub fn mana_color(&self) -> Option<Color> {
        self.card.data().mana_color
    }

    /// Can this permanent be declared as an attacker?
    pub fn can_attack(&self) -> bool {
        self.is_creature()
            && !self.tapped
            && !self.attacking
            && self.stun_counters == 0
            && (!self.entered_this_turn || self.has_keyword(Keyword::Haste))
    }

    /// Can this permanent block the given attacker?
    pub fn can_block(&self, attacker: &Permanent) -> bool {
        if !self.is_creature() || self.tapped || self.stun_counters > 0 {
            return false;
        }
        if attacker.has_flying() && !self.has_flying() && !self.has_keyword(Keyword::Reach) {
            return false;
        }
        for subtype in attacker.card.data().cant_be_blocked_by {
            if self.card.has_subtype(subtype) {
                return false;
            }
        }
        true
    }

    /// Signature used to deduplicate interchangeable permanents when
    /// enumerating attack and block choices.
    pub fn signature(&self) -> (CardId, i32, i32, u8, u8, bool) {
        (
            self.card,
            self.power(),
            self.toughness(),
            self.plus_counters,
            self.level,
            self.animated,
        )
    }
}

/// One side of the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub life: i32,
    pub hand: SmallVec<[CardId; 3]>,
    pub battlefield: SmallVec<[Permanent; 4]>,
    pub graveyard: SmallVec<[CardId; 4]>,
    /// Remaining undrawn cards; zero for standard 3CB
    pub library: u8,
    /// Cards dealt at game start, for the conservation invariant
    pub dealt: u8,
}

impl PlayerState {
    fn new(hand: &[CardId]) -> Self {
        PlayerState {
            life: STARTING_LIFE,
            hand: hand.iter().copied().collect(),
            battlefield: SmallVec::new(),
            graveyard: SmallVec::new(),
            library: 0,
            dealt: hand.len() as u8,
        }
    }

    pub fn creatures(&self) -> impl Iterator<Item = (usize, &Permanent)> {
        self.battlefield
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_creature())
    }
}

/// A blocked attacker and its blockers, in damage-assignment order once
/// `ordered` is set (automatic for single blocks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub attacker: u8,
    pub blockers: SmallVec<[u8; 2]>,
    pub ordered: bool,
}

/// Combat scratch: exists only during the combat phases, cleared at end of
/// combat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Attacking permanent indices, ascending
    pub attackers: SmallVec<[u8; 4]>,
    pub blocks: SmallVec<[Block; 4]>,
}

impl CombatState {
    pub fn blockers_of(&self, attacker: u8) -> &[u8] {
        self.blocks
            .iter()
            .find(|b| b.attacker == attacker)
            .map(|b| b.blockers.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_blocked(&self, attacker: u8) -> bool {
        !self.blockers_of(attacker).is_empty()
    }

    pub fn clear(&mut self) {
        self.attackers.clear();
        self.blocks.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(u8),
    Draw,
}

/// Complete match state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: [PlayerState; 2],
    /// Whose turn it is (0 or 1)
    pub active: u8,
    /// Who took the first turn of the game
    pub first: u8,
    pub phase: Phase,
    /// Increments on every player turn
    pub turn: u32,
    pub land_played: bool,
    pub combat: CombatState,
    /// Whether draw steps are live (any library started non-empty)
    pub draws: bool,
    pub outcome: Option<Outcome>,
}

impl GameState {
    /// Deal a new game. Hands are one to three cards each; the game starts
    /// at the first mover's untap step.
    pub fn new(hand0: &[CardId], hand1: &[CardId], first: u8) -> Result<Self> {
        if hand0.len() > 3 || hand1.len() > 3 {
            return Err(SolverError::InvariantViolation(format!(
                "hands are at most three cards, got {} and {}",
                hand0.len(),
                hand1.len()
            )));
        }
        if first > 1 {
            return Err(SolverError::InvariantViolation(format!(
                "first mover must be 0 or 1, got {first}"
            )));
        }
        Ok(GameState {
            players: [PlayerState::new(hand0), PlayerState::new(hand1)],
            active: first,
            first,
            phase: Phase::Untap,
            turn: 1,
            land_played: false,
            combat: CombatState::default(),
            draws: false,
            outcome: None,
        })
    }

    pub fn opponent(player: u8) -> u8 {
        1 - player
    }

    pub fn player(&self, idx: u8) -> &PlayerState {
        &self.players[idx as usize]
    }

    pub fn player_mut(&mut self, idx: u8) -> &mut PlayerState {
        &mut self.players[idx as usize]
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Untapped mana available to a player, by color. Creature lands with
    /// summoning sickness cannot be tapped.
    pub fn available_mana(&self, player: u8) -> ManaPool {
        let mut pool = ManaPool::new();
        for perm in &self.player(player).battlefield {
            if perm.tapped {
                continue;
            }
            if perm.is_creature() && perm.entered_this_turn {
                continue;
            }
            if let Some(color) = perm.mana_color() {
                pool.add(color, 1);
            }
        }
        pool
    }

    fn can_tap_for_mana(&self, perm: &Permanent) -> bool {
        !perm.tapped
            && perm.is_mana_source()
            && !(perm.is_creature() && perm.entered_this_turn)
    }

    /// Deterministic choice of sources to tap for a cost: colored
    /// requirements from matching sources in battlefield order, then the
    /// generic part, colorless producers first. Returns `None` when the
    /// cost cannot be paid.
    pub fn canonical_payment(&self, player: u8, cost: &ManaCost) -> Option<SmallVec<[u8; 4]>> {
        if !self.available_mana(player).can_pay(cost) {
            return None;
        }
        let battlefield = &self.player(player).battlefield;
        let mut chosen: SmallVec<[u8; 4]> = SmallVec::new();

        for color in [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green] {
            let mut needed = cost.colored(color);
            for (i, perm) in battlefield.iter().enumerate() {
                if needed == 0 {
                    break;
                }
                if self.can_tap_for_mana(perm)
                    && perm.mana_color() == Some(color)
                    && !chosen.contains(&(i as u8))
                {
                    chosen.push(i as u8);
                    needed -= 1;
                }
            }
            if needed > 0 {
                return None;
            }
        }

        let mut generic = cost.generic;
        for pass in 0..2 {
            for (i, perm) in battlefield.iter().enumerate() {
                if generic == 0 {
                    break;
                }
                let colorless = perm.mana_color() == Some(Color::Colorless);
                if (pass == 0) != colorless {
                    continue;
                }
                if self.can_tap_for_mana(perm) && !chosen.contains(&(i as u8)) {
                    chosen.push(i as u8);
                    generic -= 1;
                }
            }
        }
        if generic > 0 {
            return None;
        }
        Some(chosen)
    }

    pub fn tap_payment(&mut self, player: u8, payment: &[u8]) {
        for &idx in payment {
            self.players[player as usize].battlefield[idx as usize].tapped = true;
        }
    }

    /// Check the structural invariants of §3: card conservation (tokens
    /// exempt), combat references in range, non-negative damage.
    pub fn validate(&self) -> Result<()> {
        for (idx, p) in self.players.iter().enumerate() {
            let on_field = p.battlefield.iter().filter(|perm| !perm.card.is_token()).count();
            let in_grave = p.graveyard.iter().filter(|c| !c.is_token()).count();
            let total = p.hand.len() + on_field + in_grave + p.library as usize;
            if total != p.dealt as usize {
                return Err(SolverError::InvariantViolation(format!(
                    "player {idx}: {} cards accounted for, {} dealt",
                    total, p.dealt
                )));
            }
            for perm in &p.battlefield {
                if perm.damage < 0 {
                    return Err(SolverError::InvariantViolation(format!(
                        "player {idx}: negative damage on {}",
                        perm.card
                    )));
                }
            }
        }
        let attacker_count = self.player(self.active).battlefield.len();
        let defender_count = self
            .player(GameState::opponent(self.active))
            .battlefield
            .len();
        for &a in &self.combat.attackers {
            if a as usize >= attacker_count {
                return Err(SolverError::InvariantViolation(format!(
                    "dangling attacker index {a}"
                )));
            }
        }
        for block in &self.combat.blocks {
            if block.attacker as usize >= attacker_count {
                return Err(SolverError::InvariantViolation(format!(
                    "dangling blocked-attacker index {}",
                    block.attacker
                )));
            }
            for &b in &block.blockers {
                if b as usize >= defender_count {
                    return Err(SolverError::InvariantViolation(format!(
                        "dangling blocker index {b}"
                    )));
                }
            }
        }
        Ok(())
    }
}
