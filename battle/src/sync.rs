//! Per-turn lockstep exchange.
//!
//! Each turn, both peers assemble one `battle_data` record (turn seed,
//! mechanic toggle, one choice per local battler slot) and block until the
//! matching record from the other side arrives. The combat engine makes
//! the decisions; this module only transports them and keeps the shared
//! RNG agreed.

use std::collections::VecDeque;

use linkcable_protocol::{ProtocolError, Record, RecordWriter, tags};

use crate::choice::{Choice, ChoiceTable};
use crate::order::{self, ClientId, remap_target};
use crate::rng::BattleRng;

/// Sentinel for "no battler used the shared mechanic this turn".
pub const MECHANIC_UNUSED: i64 = -1;

/// Host capabilities resolved once at session start, instead of being
/// re-detected at every call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCaps {
    /// Does this session run two battler slots per side?
    pub double_battle: bool,
    /// When false, move lists are snapshotted and restored after battle,
    /// so move-copying effects cannot leak across online sessions.
    pub preserve_moves: bool,
}

/// Outcome of dispatching one record during the turn-data wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// Every expected remote slot is filled; the turn can resolve.
    Complete,
    /// The peer surrendered. The battle ends in our favor immediately.
    Forfeit,
}

/// Outcome of dispatching one record during a remote-switch wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEvent {
    /// The peer's replacement party slot for its fainted battler.
    Switch(i64),
    Forfeit,
}

/// Turn-level synchronization state for one battle session.
pub struct TurnSync {
    client_id: ClientId,
    caps: LinkCaps,
    rng: BattleRng,
    local_mechanic: i64,
    remote_mechanic: i64,
}

impl TurnSync {
    pub fn new(client_id: ClientId, caps: LinkCaps, seed: u32) -> Self {
        Self {
            client_id,
            caps,
            rng: BattleRng::new(Some(seed)),
            local_mechanic: MECHANIC_UNUSED,
            remote_mechanic: MECHANIC_UNUSED,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn caps(&self) -> LinkCaps {
        self.caps
    }

    /// The shared generator. The combat engine draws every battle random
    /// from here; no other source stays in lockstep.
    pub fn rng(&mut self) -> &mut BattleRng {
        &mut self.rng
    }

    /// Active battler slots owned by this peer, canonical order.
    pub fn local_slots(&self) -> &'static [usize] {
        order::local_slots(self.caps.double_battle)
    }

    /// Active battler slots owned by the other peer.
    pub fn remote_slots(&self) -> &'static [usize] {
        order::remote_slots(self.caps.double_battle)
    }

    pub fn slot_count(&self) -> usize {
        if self.caps.double_battle { 4 } else { 2 }
    }

    /// Record which local battler (if any) invoked the shared mechanic.
    pub fn set_local_mechanic(&mut self, slot: i64) {
        self.local_mechanic = slot;
    }

    pub fn local_mechanic(&self) -> i64 {
        self.local_mechanic
    }

    /// The peer's mechanic slot, already in our point of view.
    pub fn remote_mechanic(&self) -> i64 {
        self.remote_mechanic
    }

    /// True once every local slot has a committed choice: the send point
    /// for this turn's outbound bundle.
    pub fn ready_to_send(&self, choices: &ChoiceTable) -> bool {
        self.local_slots().iter().all(|&slot| choices.is_filled(slot))
    }

    /// Assemble the outbound `battle_data` bundle.
    ///
    /// The seed is reasserted to the generator immediately before being
    /// written, so the transmitted value matches the state the receiver
    /// regenerates no matter how many draws have happened since.
    pub fn write_turn_data(&mut self, writer: &mut RecordWriter, choices: &mut ChoiceTable) {
        let seed = self.rng.seed();
        self.rng.reseed(Some(seed));

        writer.sym(tags::BATTLE_DATA);
        writer.sym(tags::SEED);
        writer.int(i64::from(seed));

        writer.sym(tags::MECHANIC);
        let mut mechanic = self.local_mechanic;
        if mechanic >= 0 {
            // Flip the slot's side bit so "self" and "other" invert in
            // transit.
            mechanic ^= 1;
        }
        writer.int(mechanic);

        for &slot in self.local_slots() {
            let choice = choices
                .get_mut(slot)
                .expect("local choice locked in before the send point");
            if !self.caps.double_battle && choice.target == -1 {
                // Letting the receiving peer's RNG resolve the sentinel
                // would desync; 1v1 has exactly one possible target.
                choice.target = self.remote_slots()[0] as i64;
            }
            writer.sym(tags::CHOICE);
            let mut wire = *choice;
            wire.target = remap_target(self.client_id, choice.target);
            wire.write(writer);
        }
    }

    /// Dispatch one record received while waiting for the peer's turn
    /// bundle. Only `battle_data` and an unsolicited `forfeit` are legal
    /// here; anything else is a contract mismatch.
    pub fn apply_wait_record(
        &mut self,
        choices: &mut ChoiceTable,
        record: &mut Record,
    ) -> Result<TurnEvent, ProtocolError> {
        let tag = record.sym()?;
        match tag.as_str() {
            tags::FORFEIT => Ok(TurnEvent::Forfeit),
            tags::BATTLE_DATA => {
                let mut pending: VecDeque<usize> =
                    self.remote_slots().iter().copied().collect();
                while !pending.is_empty() {
                    let sub = record.sym()?;
                    match sub.as_str() {
                        tags::SEED => {
                            let seed = record.int()?;
                            let seed =
                                u32::try_from(seed).map_err(|_| ProtocolError::FieldType {
                                    expected: "32-bit seed",
                                    found: seed.to_string(),
                                })?;
                            // Client 0's seed is authoritative; client 1
                            // adopts it, client 0 ignores the echo.
                            if self.client_id == ClientId::One {
                                self.rng.reseed(Some(seed));
                            }
                        }
                        tags::MECHANIC => {
                            self.remote_mechanic = record.int()?;
                        }
                        tags::CHOICE => {
                            let slot = pending.pop_front().unwrap();
                            choices.set(slot, Choice::parse(record)?);
                        }
                        _ => return Err(ProtocolError::UnknownTag(sub)),
                    }
                }
                Ok(TurnEvent::Complete)
            }
            _ => Err(ProtocolError::UnknownTag(tag)),
        }
    }

    /// Dispatch one record received while waiting for the peer's
    /// replacement choice for its fainted battler.
    pub fn apply_switch_record(record: &mut Record) -> Result<SwitchEvent, ProtocolError> {
        let tag = record.sym()?;
        match tag.as_str() {
            tags::FORFEIT => Ok(SwitchEvent::Forfeit),
            tags::SWITCH => Ok(SwitchEvent::Switch(record.int()?)),
            _ => Err(ProtocolError::UnknownTag(tag)),
        }
    }

    /// Our replacement choice for our own fainted battler, transmitted so
    /// the remote simulation stays informed.
    pub fn write_switch(writer: &mut RecordWriter, party_slot: i64) {
        writer.sym(tags::SWITCH);
        writer.int(party_slot);
    }

    pub fn write_forfeit(writer: &mut RecordWriter) {
        writer.sym(tags::FORFEIT);
    }
}
