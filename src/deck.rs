//! Deck registry
//!
//! Short names for the known 3CB decks. A deck uses up to three of its
//! slots; adding one is a new entry here, nothing else.

use crate::core::CardId;
use crate::{Result, SolverError};

#[derive(Debug, Clone, Copy)]
pub struct DeckEntry {
    pub name: &'static str,
    pub label: &'static str,
    pub cards: &'static [CardId],
}

pub const DECKS: &[DeckEntry] = &[
    DeckEntry {
        name: "student",
        label: "Plains + Student of Warfare",
        cards: &[CardId::Plains, CardId::StudentOfWarfare],
    },
    DeckEntry {
        name: "scf",
        label: "Island + Sleep-Cursed Faerie",
        cards: &[CardId::Island, CardId::SleepCursedFaerie],
    },
    DeckEntry {
        name: "tiger",
        label: "Forest + Scythe Tiger",
        cards: &[CardId::Forest, CardId::ScytheTiger],
    },
    DeckEntry {
        name: "noble",
        label: "Mountain + Stromkirk Noble",
        cards: &[CardId::Mountain, CardId::StromkirkNoble],
    },
    DeckEntry {
        name: "hero",
        label: "Mountain + Hammerheim + Heartfire Hero",
        cards: &[CardId::Mountain, CardId::Hammerheim, CardId::HeartfireHero],
    },
    DeckEntry {
        name: "mutavault",
        label: "Mutavault + Mutavault",
        cards: &[CardId::Mutavault, CardId::Mutavault],
    },
    DeckEntry {
        name: "aspirant",
        label: "Plains + Plains + Luminarch Aspirant",
        cards: &[CardId::Plains, CardId::Plains, CardId::LuminarchAspirant],
    },
    DeckEntry {
        name: "thallid",
        label: "Pendelhaven + Thallid",
        cards: &[CardId::Pendelhaven, CardId::Thallid],
    },
];

pub fn find(name: &str) -> Result<&'static DeckEntry> {
    DECKS
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| SolverError::UnknownDeck(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(find("student").unwrap().cards.len(), 2);
        assert_eq!(find("HERO").unwrap().cards.len(), 3);
        assert!(matches!(find("storm"), Err(SolverError::UnknownDeck(_))));
    }

    #[test]
    fn test_decks_fit_three_slots() {
        for deck in DECKS {
            assert!(!deck.cards.is_empty() && deck.cards.len() <= 3, "{}", deck.name);
        }
    }
}
