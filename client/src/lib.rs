//! Async link cable client.
//!
//! Ties the wire protocol, the lockstep battle engine, and the roster
//! codec to a real transport:
//!
//! - [`Connection`] - framed records over a byte stream, poll-driven
//!   receive, immediate send
//! - [`handshake`] - `find`/`found` matchmaking against the relay server
//! - [`BattleSession`] - drives a [`linkcable_battle::TurnSync`] over a
//!   connection, with the cooperative wait loops and post-battle party
//!   restoration
//! - [`mixer`] - the four-phase record-mixing exchange

pub mod connection;
pub mod handshake;
pub mod mixer;
pub mod session;

pub use connection::{Connection, LinkError};
pub use handshake::{MatchInfo, PeerProfile, TrainerProfile, find_match};
pub use mixer::{MixPhase, RecordMixFeature, RecordMixRegistry, mix_records};
pub use session::{BattleSession, NoUi, WaitUi};
