//! Lockstep battle synchronization for the link cable protocol.
//!
//! Both peers run a full local simulation; nothing here resolves moves or
//! damage. This crate keeps the two simulations in agreement:
//!
//! ```text
//! linkcable-protocol (wire format)
//!        │
//!        ▼
//! linkcable-battle (rng + ordering + turn sync) ← THIS CRATE
//!        │
//!        └─> linkcable-client (connection + session driver)
//! ```
//!
//! # Main Types
//!
//! - [`BattleRng`] - the shared deterministic generator; only its seed ever
//!   crosses the wire
//! - [`ClientId`] - which of the two peers this process is
//! - [`Choice`] / [`ChoiceTable`] - per-turn committed actions per battler slot
//! - [`TurnSync`] - assembles the outbound turn bundle and consumes the
//!   inbound one

pub mod choice;
pub mod order;
pub mod rng;
pub mod sync;

pub use choice::{Action, Choice, ChoiceTable};
pub use order::{
    BATTLER_SLOTS, ClientId, battler_order, remap_target, target_order, with_battler_order,
};
pub use rng::BattleRng;
pub use sync::{LinkCaps, MECHANIC_UNUSED, SwitchEvent, TurnEvent, TurnSync};
