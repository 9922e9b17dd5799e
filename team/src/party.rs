//! Count-prefixed roster serialization and pre-battle state capture.

use linkcable_protocol::{ProtocolError, Record, RecordWriter};
use serde::{Deserialize, Serialize};

use crate::monster::{Monster, MoveSlot};

pub fn write_party(writer: &mut RecordWriter, party: &[Monster]) {
    writer.int(party.len() as i64);
    for monster in party {
        monster.write(writer);
    }
}

pub fn parse_party(record: &mut Record) -> Result<Vec<Monster>, ProtocolError> {
    let count = record.int()?;
    let mut party = Vec::new();
    for _ in 0..count {
        party.push(Monster::parse(record)?);
    }
    Ok(party)
}

/// Pre-battle capture of the party state a battle is allowed to mutate.
///
/// Nothing a battle does to a party persists: held items are consumed,
/// forms change, move-copying effects overwrite move lists. Both peers
/// restore from this snapshot on every exit path, so only explicit trade
/// and record-mix flows persist mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    items: Vec<Option<String>>,
    forms: Vec<i64>,
    /// Captured only when the session does not preserve moves across
    /// battles (move copying disabled online).
    moves: Option<Vec<Vec<MoveSlot>>>,
}

impl PartySnapshot {
    pub fn capture(party: &[Monster], preserve_moves: bool) -> Self {
        Self {
            items: party.iter().map(|m| m.item.clone()).collect(),
            forms: party.iter().map(|m| m.form).collect(),
            moves: if preserve_moves {
                None
            } else {
                Some(party.iter().map(|m| m.moves.clone()).collect())
            },
        }
    }

    /// Put back everything captured. Extra party members (gained mid
    /// battle is impossible, but defensive slicing is free) are left
    /// untouched.
    pub fn restore(&self, party: &mut [Monster]) {
        for (i, monster) in party.iter_mut().enumerate() {
            if let Some(item) = self.items.get(i) {
                monster.item = item.clone();
            }
            if let Some(&form) = self.forms.get(i) {
                monster.form = form;
            }
            if let Some(moves) = &self.moves
                && let Some(slots) = moves.get(i)
            {
                monster.moves = slots.clone();
            }
        }
    }
}
