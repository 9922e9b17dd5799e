//! Matchmaking: the `find` request and the `found` reply.
//!
//! The client announces itself and the peer id it is waiting for; once two
//! clients name each other the server pairs them and answers both with
//! `found`, the assigned client id, the other side's profile and party,
//! and the rule sets the server offers. Version mismatches and malformed
//! parties are server-side rejections that surface as disconnect notices.

use linkcable_battle::ClientId;
use linkcable_protocol::{PROTOCOL_VERSION, ProtocolError, Record, RecordWriter, tags};
use linkcable_team::{
    ClauseRegistry, Monster, RuleSet, parse_party, parse_rule_sets, write_party,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::{Connection, LinkError};
use crate::session::{FRAME, WaitUi};

/// The local trainer as announced to the server.
#[derive(Debug, Clone)]
pub struct TrainerProfile {
    pub name: String,
    /// Public (display) trainer id; the peer waits on this number.
    pub public_id: i64,
    pub trainer_type: String,
    pub win_text: String,
    pub lose_text: String,
}

/// The paired peer as reported by the server.
#[derive(Debug, Clone)]
pub struct PeerProfile {
    pub name: String,
    pub trainer_type: String,
    pub win_text: String,
    pub lose_text: String,
}

/// Everything a session needs, delivered by one `found` record.
pub struct MatchInfo {
    pub client_id: ClientId,
    pub peer: PeerProfile,
    pub peer_party: Vec<Monster>,
    pub rule_sets: Vec<RuleSet>,
}

pub fn write_find(
    writer: &mut RecordWriter,
    profile: &TrainerProfile,
    peer_id: i64,
    party: &[Monster],
) {
    writer.sym(tags::FIND);
    writer.str(PROTOCOL_VERSION);
    writer.int(peer_id);
    writer.str(&profile.name);
    writer.int(profile.public_id);
    writer.sym(&profile.trainer_type);
    writer.str(&profile.win_text);
    writer.str(&profile.lose_text);
    write_party(writer, party);
}

pub fn parse_found<C>(
    record: &mut Record,
    registry: &ClauseRegistry<C>,
) -> Result<MatchInfo, ProtocolError> {
    let tag = record.sym()?;
    if tag != tags::FOUND {
        return Err(ProtocolError::UnknownTag(tag));
    }
    let id = record.int()?;
    let client_id = ClientId::parse(id).ok_or_else(|| ProtocolError::FieldType {
        expected: "client id",
        found: id.to_string(),
    })?;
    let peer = PeerProfile {
        name: record.str()?,
        trainer_type: record.sym()?,
        win_text: record.str()?,
        lose_text: record.str()?,
    };
    let peer_party = parse_party(record)?;
    let rule_sets = parse_rule_sets(record, registry)?;
    Ok(MatchInfo {
        client_id,
        peer,
        peer_party,
        rule_sets,
    })
}

/// Announce ourselves and wait until the server pairs us.
///
/// Polls once per frame, ticking `ui` between polls; a confirmed cancel
/// abandons the search as a voluntary disconnect.
pub async fn find_match<S, C>(
    connection: &mut Connection<S>,
    profile: &TrainerProfile,
    peer_id: i64,
    party: &[Monster],
    registry: &ClauseRegistry<C>,
    ui: &mut dyn WaitUi,
) -> Result<MatchInfo, LinkError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    connection
        .send(|w| write_find(w, profile, peer_id, party))
        .await?;
    tracing::debug!(peer_id, "finding peer");

    let mut frame = 0;
    loop {
        ui.tick(frame);
        frame += 1;
        if ui.cancelled() {
            return Err(LinkError::Disconnected {
                reason: "disconnected".to_string(),
            });
        }
        let mut found = None;
        connection.poll_receive(|record| {
            found = Some(parse_found(record, registry)?);
            Ok(())
        })?;
        if let Some(info) = found {
            tracing::info!(
                client_id = info.client_id.index(),
                peer = info.peer.name,
                "matched"
            );
            return Ok(info);
        }
        tokio::time::sleep(FRAME).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::monster;

    fn no_clauses() -> ClauseRegistry<()> {
        ClauseRegistry::new()
    }

    fn profile() -> TrainerProfile {
        TrainerProfile {
            name: "May".to_string(),
            public_id: 41_126,
            trainer_type: "POKEMONTRAINER_May".to_string(),
            win_text: "I won!".to_string(),
            lose_text: "I lost...".to_string(),
        }
    }

    #[test]
    fn test_find_leads_with_tag_and_version() {
        let mut writer = RecordWriter::new();
        write_find(&mut writer, &profile(), 7, &[]);
        let line = writer.line();
        assert!(line.starts_with(&format!("find,{PROTOCOL_VERSION},7,May,41126,")));
    }

    #[test]
    fn test_found_round_trip() {
        // Assemble the reply the way the server does: our own announced
        // fields echoed back to the other client.
        let mut writer = RecordWriter::new();
        writer.sym(tags::FOUND);
        writer.int(1);
        let p = profile();
        writer.str(&p.name);
        writer.sym(&p.trainer_type);
        writer.str(&p.win_text);
        writer.str(&p.lose_text);
        write_party(&mut writer, &[monster("TREECKO")]);
        writer.int(0); // no rule sets
        let line = writer.line();

        let mut record = Record::parse(line.trim_end());
        let info = parse_found(&mut record, &no_clauses()).unwrap();
        assert!(record.is_empty());
        assert_eq!(info.client_id, ClientId::One);
        assert_eq!(info.peer.name, "May");
        assert_eq!(info.peer_party.len(), 1);
        assert!(info.rule_sets.is_empty());
    }

    #[test]
    fn test_found_rejects_wrong_tag() {
        let mut record = Record::parse("battle_data,1");
        assert!(matches!(
            parse_found(&mut record, &no_clauses()),
            Err(ProtocolError::UnknownTag(tag)) if tag == "battle_data"
        ));
    }

    #[test]
    fn test_found_rejects_bad_client_id() {
        let mut record = Record::parse("found,2,May,TYPE,w,l,0,0");
        assert!(matches!(
            parse_found(&mut record, &no_clauses()),
            Err(ProtocolError::FieldType { expected: "client id", .. })
        ));
    }
}
