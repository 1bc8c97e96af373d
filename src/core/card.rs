//! Static card records
//!
//! The catalog is a closed set: every card is a `CardId` variant with a
//! `&'static CardData` record describing its printed attributes. Per-card
//! behavior (play actions, activated abilities, triggers) lives in the
//! `catalog` module, keyed on `CardId`, so adding a card means adding a
//! record here and its hooks there.

use crate::core::mana::{Color, ManaCost};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Land,
    Creature,
}

/// Combat-relevant keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Trample,
    Haste,
    Vigilance,
    Lifelink,
    Shroud,
}

/// Every card the solver knows about
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CardId {
    // Lands
    Plains,
    Island,
    Forest,
    Mountain,
    Hammerheim,
    Pendelhaven,
    Mutavault,
    DryadArbor,
    // Creatures
    StudentOfWarfare,
    SleepCursedFaerie,
    ScytheTiger,
    StromkirkNoble,
    HeartfireHero,
    LuminarchAspirant,
    Thallid,
    VampireOfTheDireMoon,
    ChargingBadger,
    RagingGoblin,
    GiantSpider,
    // Tokens
    Saproling,
}

/// Static printed attributes of a card
#[derive(Debug)]
pub struct CardData {
    pub name: &'static str,
    pub cost: ManaCost,
    pub types: &'static [CardType],
    pub subtypes: &'static [&'static str],
    pub power: i32,
    pub toughness: i32,
    pub keywords: &'static [Keyword],
    /// Color of mana this permanent taps for, if it is a mana source
    pub mana_color: Option<Color>,
    /// Blockers with any of these subtypes cannot block this creature
    pub cant_be_blocked_by: &'static [&'static str],
    /// Changeling-style: counts as every creature type
    pub all_creature_types: bool,
    pub token: bool,
}

impl CardData {
    const fn land(name: &'static str, color: Color) -> Self {
        CardData {
            name,
            cost: ManaCost::FREE,
            types: &[CardType::Land],
            subtypes: &[],
            power: 0,
            toughness: 0,
            keywords: &[],
            mana_color: Some(color),
            cant_be_blocked_by: &[],
            all_creature_types: false,
            token: false,
        }
    }

    const fn creature(
        name: &'static str,
        cost: ManaCost,
        power: i32,
        toughness: i32,
        subtypes: &'static [&'static str],
        keywords: &'static [Keyword],
    ) -> Self {
        CardData {
            name,
            cost,
            types: &[CardType::Creature],
            subtypes,
            power,
            toughness,
            keywords,
            mana_color: None,
            cant_be_blocked_by: &[],
            all_creature_types: false,
            token: false,
        }
    }
}

static PLAINS: CardData = CardData::land("Plains", Color::White);
static ISLAND: CardData = CardData::land("Island", Color::Blue);
static FOREST: CardData = CardData::land("Forest", Color::Green);
static MOUNTAIN: CardData = CardData::land("Mountain", Color::Red);
static HAMMERHEIM: CardData = CardData::land("Hammerheim", Color::Red);
static PENDELHAVEN: CardData = CardData::land("Pendelhaven", Color::Green);

// Mutavault taps for generic mana and animates into a 2/2 with every
// creature type; the animated stats live here, the animation flag on the
// permanent.
static MUTAVAULT: CardData = CardData {
    name: "Mutavault",
    cost: ManaCost::FREE,
    types: &[CardType::Land],
    subtypes: &[],
    power: 2,
    toughness: 2,
    keywords: &[],
    mana_color: Some(Color::Colorless),
    cant_be_blocked_by: &[],
    all_creature_types: true,
    token: false,
};

// Dryad Arbor is a land and a creature at all times.
static DRYAD_ARBOR: CardData = CardData {
    name: "Dryad Arbor",
    cost: ManaCost::FREE,
    types: &[CardType::Land, CardType::Creature],
    subtypes: &["Forest", "Dryad"],
    power: 1,
    toughness: 1,
    keywords: &[],
    mana_color: Some(Color::Green),
    cant_be_blocked_by: &[],
    all_creature_types: false,
    token: false,
};

static STUDENT_OF_WARFARE: CardData = CardData::creature(
    "Student of Warfare",
    ManaCost::W,
    1,
    1,
    &["Human", "Knight"],
    &[],
);

static SLEEP_CURSED_FAERIE: CardData = CardData::creature(
    "Sleep-Cursed Faerie",
    ManaCost::U,
    3,
    3,
    &["Faerie", "Wizard"],
    &[Keyword::Flying],
);

static SCYTHE_TIGER: CardData = CardData::creature(
    "Scythe Tiger",
    ManaCost::G,
    3,
    2,
    &["Cat"],
    &[Keyword::Shroud],
);

static STROMKIRK_NOBLE: CardData = CardData {
    name: "Stromkirk Noble",
    cost: ManaCost::R,
    types: &[CardType::Creature],
    subtypes: &["Vampire", "Noble"],
    power: 1,
    toughness: 1,
    keywords: &[],
    mana_color: None,
    cant_be_blocked_by: &["Human"],
    all_creature_types: false,
    token: false,
};

static HEARTFIRE_HERO: CardData = CardData::creature(
    "Heartfire Hero",
    ManaCost::R,
    1,
    1,
    &["Mouse", "Soldier"],
    &[],
);

static LUMINARCH_ASPIRANT: CardData = CardData::creature(
    "Luminarch Aspirant",
    ManaCost::ONE_W,
    1,
    1,
    &["Human", "Cleric"],
    &[],
);

static THALLID: CardData =
    CardData::creature("Thallid", ManaCost::G, 1, 1, &["Fungus"], &[]);

static VAMPIRE_OF_THE_DIRE_MOON: CardData = CardData::creature(
    "Vampire of the Dire Moon",
    ManaCost::B,
    1,
    1,
    &["Vampire"],
    &[Keyword::Deathtouch, Keyword::Lifelink],
);

static CHARGING_BADGER: CardData = CardData::creature(
    "Charging Badger",
    ManaCost::G,
    1,
    1,
    &["Badger"],
    &[Keyword::Trample],
);

static RAGING_GOBLIN: CardData = CardData::creature(
    "Raging Goblin",
    ManaCost::R,
    1,
    1,
    &["Goblin", "Berserker"],
    &[Keyword::Haste],
);

static GIANT_SPIDER: CardData = CardData::creature(
    "Giant Spider",
    ManaCost::new(3, 0, 0, 0, 0, 1),
    2,
    4,
    &["Spider"],
    &[Keyword::Reach],
);

static SAPROLING: CardData = CardData {
    name: "Saproling",
    cost: ManaCost::FREE,
    types: &[CardType::Creature],
    subtypes: &["Saproling"],
    power: 1,
    toughness: 1,
    keywords: &[],
    mana_color: None,
    cant_be_blocked_by: &[],
    all_creature_types: false,
    token: true,
};

impl CardId {
    pub const ALL: &'static [CardId] = &[
        CardId::Plains,
        CardId::Island,
        CardId::Forest,
        CardId::Mountain,
        CardId::Hammerheim,
        CardId::Pendelhaven,
        CardId::Mutavault,
        CardId::DryadArbor,
        CardId::StudentOfWarfare,
        CardId::SleepCursedFaerie,
        CardId::ScytheTiger,
        CardId::StromkirkNoble,
        CardId::HeartfireHero,
        CardId::LuminarchAspirant,
        CardId::Thallid,
        CardId::VampireOfTheDireMoon,
        CardId::ChargingBadger,
        CardId::RagingGoblin,
        CardId::GiantSpider,
        CardId::Saproling,
    ];

    pub fn data(self) -> &'static CardData {
        match self {
            CardId::Plains => &PLAINS,
            CardId::Island => &ISLAND,
            CardId::Forest => &FOREST,
            CardId::Mountain => &MOUNTAIN,
            CardId::Hammerheim => &HAMMERHEIM,
            CardId::Pendelhaven => &PENDELHAVEN,
            CardId::Mutavault => &MUTAVAULT,
            CardId::DryadArbor => &DRYAD_ARBOR,
            CardId::StudentOfWarfare => &STUDENT_OF_WARFARE,
            CardId::SleepCursedFaerie => &SLEEP_CURSED_FAERIE,
            CardId::ScytheTiger => &SCYTHE_TIGER,
            CardId::StromkirkNoble => &STROMKIRK_NOBLE,
            CardId::HeartfireHero => &HEARTFIRE_HERO,
            CardId::LuminarchAspirant => &LUMINARCH_ASPIRANT,
            CardId::Thallid => &THALLID,
            CardId::VampireOfTheDireMoon => &VAMPIRE_OF_THE_DIRE_MOON,
            CardId::ChargingBadger => &CHARGING_BADGER,
            CardId::RagingGoblin => &RAGING_GOBLIN,
            CardId::GiantSpider => &GIANT_SPIDER,
            CardId::Saproling => &SAPROLING,
        }
    }

    pub fn name(self) -> &'static str {
        self.data().name
    }

    pub fn is_land(self) -> bool {
        self.data().types.contains(&CardType::Land)
    }

    /// True for cards that are creatures as printed (Mutavault only counts
    /// once animated, which is per-permanent state).
    pub fn is_creature_card(self) -> bool {
        self.data().types.contains(&CardType::Creature)
    }

    pub fn is_token(self) -> bool {
        self.data().token
    }

    pub fn has_keyword(self, kw: Keyword) -> bool {
        self.data().keywords.contains(&kw)
    }

    pub fn has_subtype(self, subtype: &str) -> bool {
        self.data().all_creature_types || self.data().subtypes.contains(&subtype)
    }

    /// Find a card by its printed name (case-insensitive)
    pub fn by_name(name: &str) -> Option<CardId> {
        CardId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }

    /// Stable ordinal used by the fingerprint encoder
    pub(crate) fn ordinal(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stable fingerprint over the whole catalog, folded in id order.
///
/// Snapshot files carry this hash; a loader seeing a different value must
/// discard the snapshot, since fingerprints baked into it were computed
/// against different card records.
pub fn catalog_hash() -> u64 {
    let mut acc: u64 = 0xC3A5_C85C_97CB_3127;
    for (i, id) in CardId::ALL.iter().enumerate() {
        let d = id.data();
        let mut word: u64 = (i as u64) << 56;
        word |= (d.cost.cmc() as u64) << 48;
        word |= ((d.power as u8) as u64) << 40;
        word |= ((d.toughness as u8) as u64) << 32;
        word |= (d.types.len() as u64) << 28;
        word |= (d.keywords.len() as u64) << 24;
        word |= (d.token as u64) << 23;
        word |= (d.all_creature_types as u64) << 22;
        for b in d.name.bytes() {
            word = word.rotate_left(7) ^ (b as u64);
        }
        acc = splitmix64(acc ^ word).rotate_left(13) ^ acc;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(CardId::by_name("Plains"), Some(CardId::Plains));
        assert_eq!(CardId::by_name("scythe tiger"), Some(CardId::ScytheTiger));
        assert_eq!(CardId::by_name("Black Lotus"), None);
    }

    #[test]
    fn test_type_predicates() {
        assert!(CardId::Plains.is_land());
        assert!(!CardId::Plains.is_creature_card());
        assert!(CardId::DryadArbor.is_land());
        assert!(CardId::DryadArbor.is_creature_card());
        assert!(CardId::Mutavault.is_land());
        assert!(!CardId::Mutavault.is_creature_card());
        assert!(CardId::Saproling.is_token());
    }

    #[test]
    fn test_keywords_and_subtypes() {
        assert!(CardId::SleepCursedFaerie.has_keyword(Keyword::Flying));
        assert!(CardId::VampireOfTheDireMoon.has_keyword(Keyword::Deathtouch));
        assert!(CardId::StudentOfWarfare.has_subtype("Human"));
        // Mutavault counts as every creature type
        assert!(CardId::Mutavault.has_subtype("Human"));
        assert!(!CardId::Saproling.has_subtype("Human"));
    }

    #[test]
    fn test_catalog_hash_stable() {
        assert_eq!(catalog_hash(), catalog_hash());
        assert_ne!(catalog_hash(), 0);
    }

    #[test]
    fn test_ordinals_unique() {
        let mut seen = std::collections::HashSet::new();
        for id in CardId::ALL {
            assert!(seen.insert(id.ordinal()));
        }
    }
}
