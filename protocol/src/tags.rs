//! Message tag atoms known to the core protocol.
//!
//! The first field of every record is a tag atom interpreted by the
//! consuming session. Record-mixing features add their own tags at
//! registration time; everything else lives here.

/// Matchmaking request, client to server.
pub const FIND: &str = "find";
/// Matchmaking response, server to client. Carries the assigned client id.
pub const FOUND: &str = "found";
/// Reserved: reclassifies a record as a disconnect notice.
pub const DISCONNECT: &str = "disconnect";

/// Per-turn bundle: seed, mechanic toggle, then one choice per battler.
pub const BATTLE_DATA: &str = "battle_data";
/// Sub-tag of `battle_data`: the authoritative turn seed.
pub const SEED: &str = "seed";
/// Sub-tag of `battle_data`: shared once-per-battle mechanic toggle.
pub const MECHANIC: &str = "mechanic";
/// Sub-tag of `battle_data`: one battler's committed action.
pub const CHOICE: &str = "choice";

/// Out-of-band replacement choice for a fainted battler.
pub const SWITCH: &str = "switch";
/// Out-of-band surrender; ends the battle in the receiver's favor.
pub const FORFEIT: &str = "forfeit";
