//! Mana colors, costs, and availability accounting
//!
//! There is no floating mana in 3CB play: a cost is paid by tapping sources
//! within the resolution of a single cast or activation, so `ManaPool` only
//! exists transiently while a payment is being checked or made.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "W"),
            Color::Blue => write!(f, "U"),
            Color::Black => write!(f, "B"),
            Color::Red => write!(f, "R"),
            Color::Green => write!(f, "G"),
            Color::Colorless => write!(f, "C"),
        }
    }
}

/// A mana cost (e.g. "1W" = 1 generic + 1 white)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
}

impl ManaCost {
    pub const FREE: ManaCost = ManaCost::new(0, 0, 0, 0, 0, 0);
    pub const W: ManaCost = ManaCost::new(0, 1, 0, 0, 0, 0);
    pub const U: ManaCost = ManaCost::new(0, 0, 1, 0, 0, 0);
    pub const B: ManaCost = ManaCost::new(0, 0, 0, 1, 0, 0);
    pub const R: ManaCost = ManaCost::new(0, 0, 0, 0, 1, 0);
    pub const G: ManaCost = ManaCost::new(0, 0, 0, 0, 0, 1);
    pub const ONE: ManaCost = ManaCost::new(1, 0, 0, 0, 0, 0);
    pub const ONE_W: ManaCost = ManaCost::new(1, 1, 0, 0, 0, 0);

    pub const fn new(generic: u8, white: u8, blue: u8, black: u8, red: u8, green: u8) -> Self {
        ManaCost {
            generic,
            white,
            blue,
            black,
            red,
            green,
        }
    }

    /// Total converted mana cost
    pub fn cmc(&self) -> u8 {
        self.generic + self.white + self.blue + self.black + self.red + self.green
    }

    pub fn colored(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => 0,
        }
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cmc() == 0 {
            return write!(f, "0");
        }
        if self.generic > 0 {
            write!(f, "{}", self.generic)?;
        }
        for (count, sym) in [
            (self.white, 'W'),
            (self.blue, 'U'),
            (self.black, 'B'),
            (self.red, 'R'),
            (self.green, 'G'),
        ] {
            for _ in 0..count {
                write!(f, "{sym}")?;
            }
        }
        Ok(())
    }
}

/// Transient per-payment mana accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, color: Color, amount: u8) {
        match color {
            Color::White => self.white += amount,
            Color::Blue => self.blue += amount,
            Color::Black => self.black += amount,
            Color::Red => self.red += amount,
            Color::Green => self.green += amount,
            Color::Colorless => self.colorless += amount,
        }
    }

    pub fn of(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    pub fn total(&self) -> u8 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless
    }

    /// Check whether this pool covers a cost: every colored requirement must
    /// be met by that color, and the total must cover the generic part too.
    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        if self.white < cost.white
            || self.blue < cost.blue
            || self.black < cost.black
            || self.red < cost.red
            || self.green < cost.green
        {
            return false;
        }
        self.total() >= cost.cmc()
    }
}
