//! Per-turn committed actions, one per battler slot.

use linkcable_protocol::{ProtocolError, Record, RecordWriter};

/// What a battler was committed to do this turn. Transported, never
/// decided, by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// No action locked in yet (never sent for a local slot).
    #[default]
    None,
    /// Use the move in the chosen slot; a slot of -1 is Struggle.
    UseMove,
    /// Switch to the chosen party slot.
    Switch,
    /// Use an item.
    Item,
    /// Flee. Online this is a forfeit and is transported out of band.
    Run,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "none",
            Action::UseMove => "move",
            Action::Switch => "switch",
            Action::Item => "item",
            Action::Run => "run",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "none" => Ok(Action::None),
            "move" => Ok(Action::UseMove),
            "switch" => Ok(Action::Switch),
            "item" => Ok(Action::Item),
            "run" => Ok(Action::Run),
            _ => Err(ProtocolError::FieldType {
                expected: "action",
                found: s.to_string(),
            }),
        }
    }
}

/// One battler slot's choice for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Choice {
    pub action: Action,
    /// Move slot or party slot, depending on `action`. -1 under
    /// `UseMove` means Struggle.
    pub index: i64,
    /// Whether the combat engine must resolve a move object for this
    /// choice. Absent on the wire when false.
    pub needs_move: bool,
    /// Target battler slot in the POV of whichever peer holds this
    /// choice. -1 is the "let the engine's RNG pick" sentinel.
    pub target: i64,
}

impl Choice {
    /// Append this choice's fields after a `choice` sub-tag.
    pub fn write(&self, writer: &mut RecordWriter) {
        writer.sym(self.action.as_str());
        writer.int(self.index);
        writer.opt_bool(if self.needs_move { Some(true) } else { None });
        writer.int(self.target);
    }

    /// Consume one choice's fields following a `choice` sub-tag.
    pub fn parse(record: &mut Record) -> Result<Self, ProtocolError> {
        let action = Action::parse(&record.sym()?)?;
        let index = record.int()?;
        let needs_move = record.opt_bool()?.unwrap_or(false);
        let target = record.int()?;
        Ok(Self {
            action,
            index,
            needs_move,
            target,
        })
    }
}

/// The turn's choices, indexed by battler slot.
///
/// Local slots are filled from local input before serialization; remote
/// slots are only ever filled by decoding an incoming record.
#[derive(Debug, Clone, Default)]
pub struct ChoiceTable {
    slots: Vec<Option<Choice>>,
}

impl ChoiceTable {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn set(&mut self, slot: usize, choice: Choice) {
        self.slots[slot] = Some(choice);
    }

    pub fn get(&self, slot: usize) -> Option<&Choice> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Choice> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn is_filled(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    /// Wipe every slot at the start of a new turn.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}
