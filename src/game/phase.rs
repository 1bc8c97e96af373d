//! Turn phases
//!
//! A turn walks the phases in order. Automatic phases are resolved by the
//! engine without a decision point; `Main1`, `Main2`, `DeclareAttackers`,
//! `DeclareBlockers` (and `CombatDamage` while a gang-blocked attacker's
//! damage order is unassigned) present choices. `Main2` is reached only
//! when attackers were declared; an attack-less combat collapses straight
//! to `End`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndOfCombat,
    Main2,
    End,
}

impl Phase {
    /// The next phase within the same turn; `None` after `End`.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Untap => Some(Phase::Upkeep),
            Phase::Upkeep => Some(Phase::Draw),
            Phase::Draw => Some(Phase::Main1),
            Phase::Main1 => Some(Phase::BeginCombat),
            Phase::BeginCombat => Some(Phase::DeclareAttackers),
            Phase::DeclareAttackers => Some(Phase::DeclareBlockers),
            Phase::DeclareBlockers => Some(Phase::CombatDamage),
            Phase::CombatDamage => Some(Phase::EndOfCombat),
            Phase::EndOfCombat => Some(Phase::Main2),
            Phase::Main2 => Some(Phase::End),
            Phase::End => None,
        }
    }

    pub fn is_main(self) -> bool {
        matches!(self, Phase::Main1 | Phase::Main2)
    }

    /// Phases where the engine stops and asks the priority holder for an
    /// action. `CombatDamage` is conditional: it only holds priority while
    /// a multi-blocked attacker's damage order is unassigned.
    pub fn is_decision(self) -> bool {
        matches!(
            self,
            Phase::Main1
                | Phase::Main2
                | Phase::BeginCombat
                | Phase::DeclareAttackers
                | Phase::DeclareBlockers
                | Phase::CombatDamage
        )
    }

    pub(crate) fn ordinal(self) -> u8 {
        match self {
            Phase::Untap => 0,
            Phase::Upkeep => 1,
            Phase::Draw => 2,
            Phase::Main1 => 3,
            Phase::BeginCombat => 4,
            Phase::DeclareAttackers => 5,
            Phase::DeclareBlockers => 6,
            Phase::CombatDamage => 7,
            Phase::EndOfCombat => 8,
            Phase::Main2 => 9,
            Phase::End => 10,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Untap => "untap",
            Phase::Upkeep => "upkeep",
            Phase::Draw => "draw",
            Phase::Main1 => "main1",
            Phase::BeginCombat => "beginning of combat",
            Phase::DeclareAttackers => "declare attackers",
            Phase::DeclareBlockers => "declare blockers",
            Phase::CombatDamage => "combat damage",
            Phase::EndOfCombat => "end of combat",
            Phase::Main2 => "main2",
            Phase::End => "end",
        };
        write!(f, "{name}")
    }
}
