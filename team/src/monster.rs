//! One battling entity as a flat, positional field list.
//!
//! Stats derived from these fields are recomputed locally after parsing;
//! calculated values are never transmitted.

use linkcable_protocol::{ProtocolError, Record, RecordWriter};
use serde::{Deserialize, Serialize};

pub const STAT_COUNT: usize = 6;

/// Original-trainer block carried with each entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub gender: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub id: String,
    pub pp_ups: i64,
}

/// A battling entity. The session treats this as an opaque serializable
/// record; only the combat engine assigns meaning to the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub species: String,
    pub level: i64,
    pub personal_id: i64,
    pub owner: Owner,
    pub exp: i64,
    pub form: i64,
    pub item: Option<String>,
    pub moves: Vec<MoveSlot>,
    pub first_moves: Vec<String>,
    pub gender: i64,
    pub shiny: Option<bool>,
    pub ability: Option<String>,
    pub nature: Option<String>,
    pub ivs: [i64; STAT_COUNT],
    pub evs: [i64; STAT_COUNT],
    pub happiness: i64,
    pub name: String,
    pub ball: String,
    /// Fused second entity, if any (bool-prefixed recursive group).
    pub fused: Option<Box<Monster>>,
}

impl Monster {
    pub fn write(&self, writer: &mut RecordWriter) {
        writer.sym(&self.species);
        writer.int(self.level);
        writer.int(self.personal_id);
        writer.int(self.owner.id);
        writer.str(&self.owner.name);
        writer.int(self.owner.gender);
        writer.int(self.exp);
        writer.int(self.form);
        writer.opt_sym(self.item.as_deref());
        writer.int(self.moves.len() as i64);
        for slot in &self.moves {
            writer.sym(&slot.id);
            writer.int(slot.pp_ups);
        }
        writer.int(self.first_moves.len() as i64);
        for id in &self.first_moves {
            writer.sym(id);
        }
        writer.int(self.gender);
        writer.opt_bool(self.shiny);
        writer.opt_sym(self.ability.as_deref());
        writer.opt_sym(self.nature.as_deref());
        for i in 0..STAT_COUNT {
            writer.int(self.ivs[i]);
            writer.int(self.evs[i]);
        }
        writer.int(self.happiness);
        writer.str(&self.name);
        writer.sym(&self.ball);
        writer.bool(self.fused.is_some());
        if let Some(fused) = &self.fused {
            fused.write(writer);
        }
    }

    pub fn parse(record: &mut Record) -> Result<Self, ProtocolError> {
        let species = record.sym()?;
        let level = record.int()?;
        let personal_id = record.int()?;
        let owner = Owner {
            id: record.int()?,
            name: record.str()?,
            gender: record.int()?,
        };
        let exp = record.int()?;
        let form = record.int()?;
        let item = record.opt_sym()?;
        let mut moves = Vec::new();
        for _ in 0..record.int()? {
            moves.push(MoveSlot {
                id: record.sym()?,
                pp_ups: record.int()?,
            });
        }
        let mut first_moves = Vec::new();
        for _ in 0..record.int()? {
            first_moves.push(record.sym()?);
        }
        let gender = record.int()?;
        let shiny = record.opt_bool()?;
        let ability = record.opt_sym()?;
        let nature = record.opt_sym()?;
        let mut ivs = [0; STAT_COUNT];
        let mut evs = [0; STAT_COUNT];
        for i in 0..STAT_COUNT {
            ivs[i] = record.int()?;
            evs[i] = record.int()?;
        }
        let happiness = record.int()?;
        let name = record.str()?;
        let ball = record.sym()?;
        let fused = if record.bool()? {
            Some(Box::new(Monster::parse(record)?))
        } else {
            None
        };
        Ok(Self {
            species,
            level,
            personal_id,
            owner,
            exp,
            form,
            item,
            moves,
            first_moves,
            gender,
            shiny,
            ability,
            nature,
            ivs,
            evs,
            happiness,
            name,
            ball,
            fused,
        })
    }
}

#[cfg(test)]
pub(crate) fn sample(species: &str) -> Monster {
    Monster {
        species: species.to_string(),
        level: 50,
        personal_id: 0x1234_5678,
        owner: Owner {
            id: 41_126,
            name: "May".to_string(),
            gender: 1,
        },
        exp: 125_000,
        form: 0,
        item: Some("LEFTOVERS".to_string()),
        moves: vec![
            MoveSlot {
                id: "TACKLE".to_string(),
                pp_ups: 3,
            },
            MoveSlot {
                id: "PROTECT".to_string(),
                pp_ups: 0,
            },
        ],
        first_moves: vec!["TACKLE".to_string()],
        gender: 0,
        shiny: None,
        ability: Some("OVERGROW".to_string()),
        nature: Some("ADAMANT".to_string()),
        ivs: [31, 31, 31, 0, 31, 31],
        evs: [252, 252, 4, 0, 0, 0],
        happiness: 255,
        name: "Sprout".to_string(),
        ball: "POKEBALL".to_string(),
        fused: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let monster = sample("TREECKO");
        let mut writer = RecordWriter::new();
        monster.write(&mut writer);
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        assert_eq!(Monster::parse(&mut record).unwrap(), monster);
        assert!(record.is_empty());
    }

    #[test]
    fn test_round_trip_with_fusion_and_absent_optionals() {
        let mut monster = sample("ZEKROM");
        monster.item = None;
        monster.ability = None;
        monster.shiny = Some(true);
        monster.fused = Some(Box::new(sample("RESHIRAM")));

        let mut writer = RecordWriter::new();
        monster.write(&mut writer);
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        let parsed = Monster::parse(&mut record).unwrap();
        assert_eq!(parsed, monster);
        assert_eq!(parsed.fused.unwrap().species, "RESHIRAM");
    }

    #[test]
    fn test_escaped_nickname_survives() {
        let mut monster = sample("SNORLAX");
        monster.name = "Big, Lazy\\One".to_string();
        let mut writer = RecordWriter::new();
        monster.write(&mut writer);
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        assert_eq!(Monster::parse(&mut record).unwrap().name, monster.name);
    }

    #[test]
    fn test_truncated_record_is_protocol_error() {
        let monster = sample("MUDKIP");
        let mut writer = RecordWriter::new();
        monster.write(&mut writer);
        let line = writer.line();
        let cut = &line[..line.len() / 2];

        let mut record = Record::parse(cut.trim_end());
        assert!(Monster::parse(&mut record).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let monster = sample("TORCHIC");
        let json = serde_json::to_string(&monster).unwrap();
        let back: Monster = serde_json::from_str(&json).unwrap();
        assert_eq!(back, monster);
    }
}
