//! Core card and mana types

pub mod card;
pub mod mana;

pub use card::{catalog_hash, CardData, CardId, CardType, Keyword};
pub use mana::{Color, ManaCost, ManaPool};
