//! Perfect-play solver for Three Card Blind
//!
//! Both players' decks are fully revealed, so the game is one of perfect
//! information and small state: exhaustive adversarial search yields the
//! exact game value. The crate is split into the deterministic rules
//! engine (`game`), the card catalog and its behavior hooks (`core`,
//! `catalog`), and the alpha-beta search with transposition and dominance
//! caching (`solver`).

pub mod catalog;
pub mod core;
pub mod deck;
pub mod error;
pub mod game;
pub mod solver;

pub use error::{Result, SolverError};
