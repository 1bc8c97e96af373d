//! Game state, rules engine, and phase machine

pub mod actions;
pub mod combat;
pub mod fingerprint;
pub mod phase;
pub mod state;

pub use actions::{
    advance, apply, describe_action, legal_actions, priority_player, Ability, Action,
};
pub use fingerprint::{board_fingerprint, fingerprint};
pub use phase::Phase;
pub use state::{CombatState, GameState, Outcome, Permanent, PlayerState};
