//! Battle-rule clause serialization and the closed clause registry.
//!
//! A clause travels as one string field of the form
//! `Name;hint;value;hint;value;...` where each hint names the wire type
//! of the value that follows. Clause names are validated against a
//! registry of known constructors at parse time; an unknown name is a
//! protocol error rather than a silently dropped rule.

use linkcable_protocol::{ProtocolError, Record, RecordWriter};
use serde::{Deserialize, Serialize};

/// One typed clause argument with its wire hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClauseArg {
    Int(i64),
    Bool(bool),
    Str(String),
    Sym(String),
}

impl ClauseArg {
    fn hint(&self) -> &'static str {
        match self {
            ClauseArg::Int(_) => "int",
            ClauseArg::Bool(_) => "bool",
            ClauseArg::Str(_) => "str",
            ClauseArg::Sym(_) => "sym",
        }
    }

    fn encode(&self, out: &mut String) {
        match self {
            ClauseArg::Int(v) => out.push_str(&v.to_string()),
            ClauseArg::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            ClauseArg::Str(v) | ClauseArg::Sym(v) => out.push_str(v),
        }
    }

    fn decode(hint: &str, value: &str) -> Result<Self, ProtocolError> {
        match hint {
            "int" => value
                .parse()
                .map(ClauseArg::Int)
                .map_err(|_| ProtocolError::FieldType {
                    expected: "int",
                    found: value.to_string(),
                }),
            "bool" => match value {
                "true" => Ok(ClauseArg::Bool(true)),
                "false" => Ok(ClauseArg::Bool(false)),
                _ => Err(ProtocolError::FieldType {
                    expected: "bool",
                    found: value.to_string(),
                }),
            },
            "str" => Ok(ClauseArg::Str(value.to_string())),
            "sym" => Ok(ClauseArg::Sym(value.to_string())),
            _ => Err(ProtocolError::FieldType {
                expected: "arg type hint",
                found: hint.to_string(),
            }),
        }
    }
}

/// A named rule clause in serialized form. Instantiation into a live
/// rule object is the registry's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub name: String,
    pub args: Vec<ClauseArg>,
}

impl Clause {
    pub fn new(name: &str, args: Vec<ClauseArg>) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }

    /// Semicolons are structural here; names and string arguments must
    /// not contain them.
    pub fn encode(&self) -> String {
        let mut out = self.name.clone();
        for arg in &self.args {
            out.push(';');
            out.push_str(arg.hint());
            out.push(';');
            arg.encode(&mut out);
        }
        out
    }

    pub fn decode(encoded: &str) -> Result<Self, ProtocolError> {
        let mut parts = encoded.split(';');
        let name = parts.next().unwrap_or_default().to_string();
        let mut args = Vec::new();
        while let Some(hint) = parts.next() {
            let value = parts.next().ok_or(ProtocolError::EndOfRecord {
                expected: "clause arg value",
            })?;
            args.push(ClauseArg::decode(hint, value)?);
        }
        Ok(Self { name, args })
    }
}

/// Closed allow-list of clause constructors, in registration order.
///
/// `C` is whatever the rule engine builds out of a clause. A parsed
/// clause whose name has no registered constructor is rejected.
pub struct ClauseRegistry<C> {
    entries: Vec<(String, Box<dyn Fn(&[ClauseArg]) -> C>)>,
}

impl<C> ClauseRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        name: &str,
        constructor: impl Fn(&[ClauseArg]) -> C + 'static,
    ) {
        self.entries.push((name.to_string(), Box::new(constructor)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn instantiate(&self, clause: &Clause) -> Result<C, ProtocolError> {
        self.entries
            .iter()
            .find(|(n, _)| *n == clause.name)
            .map(|(_, build)| build(&clause.args))
            .ok_or_else(|| ProtocolError::UnknownClause(clause.name.clone()))
    }

    fn validate(&self, clause: &Clause) -> Result<(), ProtocolError> {
        if self.contains(&clause.name) {
            Ok(())
        } else {
            Err(ProtocolError::UnknownClause(clause.name.clone()))
        }
    }
}

impl<C> Default for ClauseRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// One selectable battle format: name, blurb, team size bounds, and the
/// clause lists the rule engine applies at each scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    pub description: String,
    /// Team preview slot count, 0 when the format skips preview.
    pub team_preview: i64,
    pub min_size: i64,
    pub max_size: i64,
    pub level_adjustment: Option<Clause>,
    pub battle_clauses: Vec<Clause>,
    pub pokemon_clauses: Vec<Clause>,
    pub subset_clauses: Vec<Clause>,
    pub team_clauses: Vec<Clause>,
}

impl RuleSet {
    pub fn write(&self, writer: &mut RecordWriter) {
        writer.str(&self.name);
        writer.str(&self.description);
        writer.int(self.team_preview);
        writer.int(self.min_size);
        writer.int(self.max_size);
        writer.opt_str(self.level_adjustment.as_ref().map(Clause::encode).as_deref());
        for clauses in [
            &self.battle_clauses,
            &self.pokemon_clauses,
            &self.subset_clauses,
            &self.team_clauses,
        ] {
            writer.int(clauses.len() as i64);
            for clause in clauses.iter() {
                writer.str(&clause.encode());
            }
        }
    }

    pub fn parse<C>(
        record: &mut Record,
        registry: &ClauseRegistry<C>,
    ) -> Result<Self, ProtocolError> {
        let name = record.str()?;
        let description = record.str()?;
        let team_preview = record.int()?;
        let min_size = record.int()?;
        let max_size = record.int()?;
        let level_adjustment = match record.opt_str()? {
            Some(encoded) => {
                let clause = Clause::decode(&encoded)?;
                registry.validate(&clause)?;
                Some(clause)
            }
            None => None,
        };
        let mut lists: [Vec<Clause>; 4] = Default::default();
        for list in &mut lists {
            for _ in 0..record.int()? {
                let clause = Clause::decode(&record.str()?)?;
                registry.validate(&clause)?;
                list.push(clause);
            }
        }
        let [battle_clauses, pokemon_clauses, subset_clauses, team_clauses] = lists;
        Ok(Self {
            name,
            description,
            team_preview,
            min_size,
            max_size,
            level_adjustment,
            battle_clauses,
            pokemon_clauses,
            subset_clauses,
            team_clauses,
        })
    }
}

pub fn write_rule_sets(writer: &mut RecordWriter, rule_sets: &[RuleSet]) {
    writer.int(rule_sets.len() as i64);
    for rule_set in rule_sets {
        rule_set.write(writer);
    }
}

pub fn parse_rule_sets<C>(
    record: &mut Record,
    registry: &ClauseRegistry<C>,
) -> Result<Vec<RuleSet>, ProtocolError> {
    let count = record.int()?;
    let mut rule_sets = Vec::new();
    for _ in 0..count {
        rule_sets.push(RuleSet::parse(record, registry)?);
    }
    Ok(rule_sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Stand-in rule object for registry tests.
    #[derive(Debug, PartialEq)]
    enum TestRule {
        Sleep,
        LevelCap(i64),
        Banlist(Vec<String>),
    }

    fn registry() -> ClauseRegistry<TestRule> {
        let mut registry = ClauseRegistry::new();
        registry.register("SleepClause", |_| TestRule::Sleep);
        registry.register("LevelCap", |args| match args {
            [ClauseArg::Int(cap)] => TestRule::LevelCap(*cap),
            _ => TestRule::LevelCap(100),
        });
        registry.register("Banlist", |args| {
            TestRule::Banlist(
                args.iter()
                    .filter_map(|arg| match arg {
                        ClauseArg::Sym(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect(),
            )
        });
        registry
    }

    fn sample_rule_set() -> RuleSet {
        RuleSet {
            name: "Standard Singles".to_string(),
            description: "3v3 singles, standard clauses".to_string(),
            team_preview: 3,
            min_size: 3,
            max_size: 3,
            level_adjustment: Some(Clause::new("LevelCap", vec![ClauseArg::Int(50)])),
            battle_clauses: vec![Clause::new("SleepClause", vec![])],
            pokemon_clauses: vec![Clause::new(
                "Banlist",
                vec![
                    ClauseArg::Sym("MEWTWO".to_string()),
                    ClauseArg::Sym("MEW".to_string()),
                ],
            )],
            subset_clauses: vec![],
            team_clauses: vec![Clause::new(
                "SleepClause",
                vec![ClauseArg::Bool(true), ClauseArg::Str("note".to_string())],
            )],
        }
    }

    #[test]
    fn test_clause_encoding() {
        let clause = Clause::new("LevelCap", vec![ClauseArg::Int(50)]);
        assert_eq!(clause.encode(), "LevelCap;int;50");
        assert_eq!(Clause::decode("LevelCap;int;50").unwrap(), clause);
    }

    #[test]
    fn test_clause_without_args() {
        let clause = Clause::decode("SleepClause").unwrap();
        assert_eq!(clause.name, "SleepClause");
        assert!(clause.args.is_empty());
    }

    #[test]
    fn test_clause_bad_bool_value() {
        assert!(matches!(
            Clause::decode("SleepClause;bool;maybe"),
            Err(ProtocolError::FieldType { expected: "bool", .. })
        ));
    }

    #[test]
    fn test_clause_missing_value_after_hint() {
        assert!(Clause::decode("LevelCap;int").is_err());
    }

    #[test]
    fn test_rule_set_round_trip() {
        let rule_sets = vec![sample_rule_set()];
        let mut writer = RecordWriter::new();
        write_rule_sets(&mut writer, &rule_sets);
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        let parsed = parse_rule_sets(&mut record, &registry()).unwrap();
        assert_eq!(parsed, rule_sets);
        assert!(record.is_empty());
    }

    #[test]
    fn test_unknown_clause_is_rejected() {
        let mut rule_set = sample_rule_set();
        rule_set
            .battle_clauses
            .push(Clause::new("FutureClause", vec![]));
        let mut writer = RecordWriter::new();
        write_rule_sets(&mut writer, &[rule_set]);
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        assert!(matches!(
            parse_rule_sets(&mut record, &registry()),
            Err(ProtocolError::UnknownClause(name)) if name == "FutureClause"
        ));
    }

    #[test]
    fn test_instantiate_builds_rule_objects() {
        let registry = registry();
        let cap = registry
            .instantiate(&Clause::new("LevelCap", vec![ClauseArg::Int(50)]))
            .unwrap();
        assert_eq!(cap, TestRule::LevelCap(50));

        let err = registry.instantiate(&Clause::new("FutureClause", vec![]));
        assert!(matches!(err, Err(ProtocolError::UnknownClause(_))));
    }
}
