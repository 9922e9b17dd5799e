//! Record mixing: a bulk data swap between the two peers.
//!
//! Features (secret bases, mail, trainer cards, ...) register with the
//! mixer; an exchange then runs four strict global phases over every
//! feature in registration order: prepare all, send all, receive all,
//! finalize all. The receive phase awaits each feature's record by its
//! tag, in the same order both sides registered, so neither peer can
//! observe another's half-finalized state.

use linkcable_protocol::{ProtocolError, Record, RecordWriter};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::{Connection, LinkError};
use crate::session::{FRAME, WaitUi};

/// One participating feature. `write`/`parse` use the ordinary record
/// codec; the mixer supplies the leading tag.
pub trait RecordMixFeature {
    /// Tag atom identifying this feature's record on the wire.
    fn id(&self) -> &'static str;

    /// Human-readable name for progress display.
    fn name(&self) -> &str;

    /// Gather local state before anything is sent.
    fn prepare(&mut self) {}

    fn write(&mut self, writer: &mut RecordWriter);

    fn parse(&mut self, record: &mut Record) -> Result<(), ProtocolError>;

    /// Apply the peer's data. Runs only after every feature has parsed.
    fn finalize(&mut self) {}
}

/// Features in registration order. Both peers must register the same
/// features in the same order for an exchange to line up.
#[derive(Default)]
pub struct RecordMixRegistry {
    features: Vec<Box<dyn RecordMixFeature>>,
}

impl RecordMixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, feature: impl RecordMixFeature + 'static) {
        self.features.push(Box::new(feature));
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Which global phase a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixPhase {
    Prepare,
    Send,
    Receive,
    Finalize,
}

/// Run one full record-mixing exchange over `connection`.
///
/// `progress` is invoked once per feature per phase with the feature's
/// display name, before the work for that feature starts.
pub async fn mix_records<S>(
    connection: &mut Connection<S>,
    registry: &mut RecordMixRegistry,
    ui: &mut dyn WaitUi,
    mut progress: impl FnMut(MixPhase, &str),
) -> Result<(), LinkError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for feature in &mut registry.features {
        progress(MixPhase::Prepare, feature.name());
        feature.prepare();
    }

    for feature in &mut registry.features {
        progress(MixPhase::Send, feature.name());
        let id = feature.id();
        connection
            .send(|w| {
                w.sym(id);
                feature.write(w);
            })
            .await?;
    }

    let mut frame = 0;
    for feature in &mut registry.features {
        progress(MixPhase::Receive, feature.name());
        let expected = feature.id();
        let mut received = false;
        while !received {
            ui.tick(frame);
            frame += 1;
            if ui.cancelled() {
                return Err(LinkError::Disconnected {
                    reason: "disconnected".to_string(),
                });
            }
            connection.poll_receive(|record| {
                let tag = record.sym()?;
                if tag != expected {
                    return Err(ProtocolError::UnknownTag(tag).into());
                }
                feature.parse(record)?;
                received = true;
                Ok(())
            })?;
            if !received {
                tokio::time::sleep(FRAME).await;
            }
        }
        tracing::debug!(feature = expected, "mixed");
    }

    for feature in &mut registry.features {
        progress(MixPhase::Finalize, feature.name());
        feature.finalize();
    }
    Ok(())
}
