//! Roster and battle-rule serialization.
//!
//! Flattens a party of battling entities and a set of rule clauses into
//! protocol records and back. The entity field list belongs to the game's
//! own data model; the contract this crate owns is the *shape*:
//! count-prefixed repeated groups, empty-field optionals, bool-prefixed
//! nested groups, and recursion for fused entities.

pub mod monster;
pub mod party;
pub mod rules;

pub use monster::{Monster, MoveSlot, Owner};
pub use party::{PartySnapshot, parse_party, write_party};
pub use rules::{Clause, ClauseArg, ClauseRegistry, RuleSet, parse_rule_sets, write_rule_sets};
