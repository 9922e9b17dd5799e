//! Drives one lockstep battle over a connection.
//!
//! The combat engine owns turn resolution; this module owns the waits.
//! Every wait is a cooperative loop: poll the connection once, tick the
//! UI hook (spinner redraw, cancel gesture), sleep a frame, repeat. A
//! confirmed cancel is a voluntary disconnect, indistinguishable to the
//! caller from the peer vanishing.

use std::time::Duration;

use linkcable_battle::{ChoiceTable, ClientId, LinkCaps, SwitchEvent, TurnEvent, TurnSync};
use linkcable_team::{Monster, PartySnapshot};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::{Connection, LinkError};

/// Tick interval for the cooperative wait loops.
pub const FRAME: Duration = Duration::from_millis(16);

/// Hook into whatever the host shows while a wait loop spins.
pub trait WaitUi {
    /// Called once per tick; `frame` drives the spinner animation.
    fn tick(&mut self, frame: u64);

    /// True when the player confirmed abandoning the link.
    fn cancelled(&mut self) -> bool {
        false
    }
}

/// Headless waits: no spinner, never cancels.
pub struct NoUi;

impl WaitUi for NoUi {
    fn tick(&mut self, _frame: u64) {}
}

/// One networked battle from the `found` handshake to party restoration.
pub struct BattleSession<S> {
    connection: Connection<S>,
    sync: TurnSync,
    local_snapshot: PartySnapshot,
    peer_snapshot: PartySnapshot,
    frame: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> BattleSession<S> {
    /// Snapshots both parties up front; battles mutate freely afterwards
    /// and [`BattleSession::restore_parties`] undoes all of it.
    pub fn new(
        connection: Connection<S>,
        client_id: ClientId,
        caps: LinkCaps,
        seed: u32,
        local_party: &[Monster],
        peer_party: &[Monster],
    ) -> Self {
        Self {
            connection,
            sync: TurnSync::new(client_id, caps, seed),
            local_snapshot: PartySnapshot::capture(local_party, caps.preserve_moves),
            peer_snapshot: PartySnapshot::capture(peer_party, caps.preserve_moves),
            frame: 0,
        }
    }

    pub fn sync(&mut self) -> &mut TurnSync {
        &mut self.sync
    }

    pub fn connection(&mut self) -> &mut Connection<S> {
        &mut self.connection
    }

    /// Send this turn's committed choices and wait for the peer's bundle.
    ///
    /// Callers lock in every local slot first ([`TurnSync::ready_to_send`]
    /// is the gate). On [`TurnEvent::Forfeit`] the battle ends in our
    /// favor immediately.
    pub async fn exchange_turn(
        &mut self,
        choices: &mut ChoiceTable,
        ui: &mut dyn WaitUi,
    ) -> Result<TurnEvent, LinkError> {
        debug_assert!(self.sync.ready_to_send(choices));
        let sync = &mut self.sync;
        self.connection
            .send(|w| sync.write_turn_data(w, choices))
            .await?;

        loop {
            self.tick(ui)?;
            let mut outcome = None;
            let sync = &mut self.sync;
            self.connection.poll_receive(|record| {
                outcome = Some(sync.apply_wait_record(choices, record)?);
                Ok(())
            })?;
            match outcome {
                Some(TurnEvent::Forfeit) => {
                    tracing::info!("peer forfeited");
                    return Ok(TurnEvent::Forfeit);
                }
                Some(TurnEvent::Complete) => return Ok(TurnEvent::Complete),
                None => tokio::time::sleep(FRAME).await,
            }
        }
    }

    /// Wait for the peer's replacement choice for its own fainted
    /// battler. Only the owning side knows the answer, so there is
    /// nothing to show locally but the spinner.
    pub async fn await_remote_switch(
        &mut self,
        ui: &mut dyn WaitUi,
    ) -> Result<SwitchEvent, LinkError> {
        loop {
            self.tick(ui)?;
            let mut outcome = None;
            self.connection.poll_receive(|record| {
                outcome = Some(TurnSync::apply_switch_record(record)?);
                Ok(())
            })?;
            match outcome {
                Some(SwitchEvent::Forfeit) => {
                    tracing::info!("peer forfeited during switch wait");
                    return Ok(SwitchEvent::Forfeit);
                }
                Some(event) => return Ok(event),
                None => tokio::time::sleep(FRAME).await,
            }
        }
    }

    /// Transmit our replacement for our own fainted battler so the
    /// remote simulation stays informed. Forced switches never wait for
    /// an acknowledgement; voluntary mid-turn switches travel inside the
    /// normal turn bundle instead and must not be sent here.
    pub async fn send_switch(&mut self, party_slot: i64) -> Result<(), LinkError> {
        self.connection
            .send(|w| TurnSync::write_switch(w, party_slot))
            .await
    }

    /// Surrender. The peer's bundle for this turn may already be in
    /// flight; discard it unseen so the close-out reads clean.
    pub async fn forfeit(&mut self) -> Result<(), LinkError> {
        self.connection.send(TurnSync::write_forfeit).await?;
        self.connection.discard(1);
        Ok(())
    }

    /// Undo everything the battle did to both parties. Runs on every
    /// exit path: win, loss, forfeit, disconnect, protocol error.
    pub fn restore_parties(&self, local_party: &mut [Monster], peer_party: &mut [Monster]) {
        self.local_snapshot.restore(local_party);
        self.peer_snapshot.restore(peer_party);
    }

    fn tick(&mut self, ui: &mut dyn WaitUi) -> Result<(), LinkError> {
        ui.tick(self.frame);
        self.frame += 1;
        if ui.cancelled() {
            tracing::info!("player abandoned the link");
            return Err(LinkError::Disconnected {
                reason: "disconnected".to_string(),
            });
        }
        Ok(())
    }
}
