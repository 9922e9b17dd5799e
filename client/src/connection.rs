use std::collections::VecDeque;

use anyhow::{Context, Result};
use futures_util::FutureExt;
use linkcable_protocol::{Framer, ProtocolError, Record, RecordWriter};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Bytes pulled off the transport per poll.
const READ_CHUNK: usize = 4096;

#[derive(Error, Debug)]
pub enum LinkError {
    /// The link is gone: the peer or server closed it, the transport
    /// failed, or the player backed out of a wait. Carries a
    /// human-readable reason for the UI.
    #[error("disconnected: {reason}")]
    Disconnected { reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl LinkError {
    pub(crate) fn dropped(err: std::io::Error) -> Self {
        Self::Disconnected {
            reason: err.to_string(),
        }
    }
}

/// One framed-record link to the relay server.
///
/// Receiving is poll-driven: [`Connection::poll_receive`] never blocks and
/// dispatches at most one record per call, so control flow inside a
/// handler cannot lose queued records. Sending writes immediately.
///
/// Generic over the transport so tests run on [`tokio::io::duplex`] pairs;
/// real sessions use a [`TcpStream`]. Polling requires a tokio runtime
/// context.
pub struct Connection<S> {
    stream: S,
    framer: Framer,
    inbox: VecDeque<Record>,
    discard_records: usize,
    writer: RecordWriter,
}

impl Connection<TcpStream> {
    pub async fn open(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("Failed to connect to {host}:{port}"))?;
        stream.set_nodelay(true)?;
        tracing::debug!(host, port, "connected");
        Ok(Self::new(stream))
    }

    /// Whether the transport would accept a write right now. A UI hint
    /// only; [`Connection::send`] is always legal.
    pub fn can_send(&self) -> bool {
        matches!(self.stream.writable().now_or_never(), Some(Ok(())))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            framer: Framer::new(),
            inbox: VecDeque::new(),
            discard_records: 0,
            writer: RecordWriter::new(),
        }
    }

    /// Pull any ready bytes off the transport and dispatch at most one
    /// queued record to `handler`. Returns whether a record was taken
    /// off the queue (dispatched or discarded).
    ///
    /// A zero-byte read, a transport error, and an explicit disconnect
    /// record all surface as [`LinkError::Disconnected`]. The handler
    /// must consume every field of the record it is given.
    pub fn poll_receive<F>(&mut self, handler: F) -> Result<bool, LinkError>
    where
        F: FnOnce(&mut Record) -> Result<(), LinkError>,
    {
        let mut buf = [0u8; READ_CHUNK];
        match self.stream.read(&mut buf).now_or_never() {
            Some(Ok(0)) => {
                return Err(LinkError::Disconnected {
                    reason: "server disconnected".to_string(),
                });
            }
            Some(Ok(n)) => {
                for record in self.framer.feed(&buf[..n])? {
                    self.inbox.push_back(record);
                }
            }
            Some(Err(err)) => return Err(LinkError::dropped(err)),
            None => {}
        }

        let Some(mut record) = self.inbox.pop_front() else {
            return Ok(false);
        };
        if let Some(reason) = record.take_disconnect() {
            tracing::debug!(reason, "peer disconnect notice");
            return Err(LinkError::Disconnected { reason });
        }
        if self.discard_records > 0 {
            self.discard_records -= 1;
            tracing::debug!(%record, "discarding stale record");
            return Ok(true);
        }
        handler(&mut record)?;
        if !record.is_empty() {
            return Err(ProtocolError::UnconsumedFields(record.to_string()).into());
        }
        Ok(true)
    }

    /// Build one record and write it out immediately.
    pub async fn send<F>(&mut self, build: F) -> Result<(), LinkError>
    where
        F: FnOnce(&mut RecordWriter),
    {
        build(&mut self.writer);
        let line = self.writer.line();
        tracing::trace!(line = line.trim_end(), "send");
        self.stream
            .write_all(line.as_bytes())
            .await
            .map_err(LinkError::dropped)
    }

    /// Drop the next `n` inbound records unseen. Used when abandoning an
    /// exchange the peer has already committed a message to.
    pub fn discard(&mut self, n: usize) {
        self.discard_records += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    fn pair() -> (Connection<DuplexStream>, DuplexStream) {
        let (near, far) = duplex(1 << 16);
        (Connection::new(near), far)
    }

    async fn write_raw(far: &mut DuplexStream, bytes: &[u8]) {
        far.write_all(bytes).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_writes_framed_line() {
        let (mut conn, mut far) = pair();
        conn.send(|w| {
            w.sym("switch");
            w.int(3);
        })
        .await
        .unwrap();

        let mut buf = [0u8; 64];
        let n = far.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"switch,3\n");
    }

    #[tokio::test]
    async fn test_poll_without_data_is_a_no_op() {
        let (mut conn, _far) = pair();
        let dispatched = conn
            .poll_receive(|_| panic!("no record expected"))
            .unwrap();
        assert!(!dispatched);
    }

    #[tokio::test]
    async fn test_at_most_one_record_per_poll() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"switch,1\nswitch,2\nswitch,3\n").await;

        let mut seen = Vec::new();
        for _ in 0..3 {
            let dispatched = conn
                .poll_receive(|record| {
                    assert_eq!(record.sym().unwrap(), "switch");
                    seen.push(record.int().unwrap());
                    Ok(())
                })
                .unwrap();
            assert!(dispatched);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(!conn.poll_receive(|_| panic!("drained")).unwrap());
    }

    #[tokio::test]
    async fn test_partial_line_buffered_across_polls() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"switc").await;
        assert!(!conn.poll_receive(|_| panic!("incomplete")).unwrap());

        write_raw(&mut far, b"h,5\n").await;
        let dispatched = conn
            .poll_receive(|record| {
                assert_eq!(record.sym().unwrap(), "switch");
                assert_eq!(record.int().unwrap(), 5);
                Ok(())
            })
            .unwrap();
        assert!(dispatched);
    }

    #[tokio::test]
    async fn test_unconsumed_fields_are_fatal() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"switch,5\n").await;
        let result = conn.poll_receive(|record| {
            record.sym()?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(LinkError::Protocol(ProtocolError::UnconsumedFields(_)))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_record_raises_with_reason() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"disconnect,peer disconnected\n").await;
        let result = conn.poll_receive(|_| panic!("reclassified"));
        assert!(matches!(
            result,
            Err(LinkError::Disconnected { reason }) if reason == "peer disconnected"
        ));
    }

    #[tokio::test]
    async fn test_closed_transport_raises_disconnected() {
        let (mut conn, far) = pair();
        drop(far);
        let result = conn.poll_receive(|_| Ok(()));
        assert!(matches!(result, Err(LinkError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_discard_skips_records_unseen() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"forfeit\nswitch,2\n").await;

        conn.discard(1);
        assert!(conn.poll_receive(|_| panic!("discarded")).unwrap());
        let dispatched = conn
            .poll_receive(|record| {
                assert_eq!(record.sym().unwrap(), "switch");
                assert_eq!(record.int().unwrap(), 2);
                Ok(())
            })
            .unwrap();
        assert!(dispatched);
    }

    #[tokio::test]
    async fn test_discard_two_dispatches_only_the_third() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"switch,1\nswitch,2\nswitch,3\n").await;

        conn.discard(2);
        let mut dispatched = Vec::new();
        for _ in 0..3 {
            conn.poll_receive(|record| {
                record.sym()?;
                dispatched.push(record.int()?);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(dispatched, vec![3]);
    }

    #[tokio::test]
    async fn test_disconnect_outranks_discard() {
        let (mut conn, mut far) = pair();
        write_raw(&mut far, b"disconnect\n").await;
        conn.discard(1);
        let result = conn.poll_receive(|_| Ok(()));
        assert!(matches!(
            result,
            Err(LinkError::Disconnected { reason }) if reason == "unknown error"
        ));
    }
}
