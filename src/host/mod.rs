//! Message host connecting external callers to the broker over a byte stream.
//!
//! Each inbound frame carries an envelope:
//!
//! ```json
//! { "id": 7, "sender": "app-id", "request": { "method": "getAllCookies" } }
//! ```
//!
//! and each answered request produces `{ "id": 7, "response": { ... } }`.
//! Requests are dispatched independently and answered in completion order.
//! A request whose pipeline fails produces no output at all.

mod framing;

pub use framing::{Framing, MAX_INBOUND_FRAME, MAX_NATIVE_OUTBOUND_FRAME};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::broker::{BrokerResponse, CookieBroker, MessageSender, Responder};
use framing::{read_frame, write_frame};

/// Errors that stop the message host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Reading from or writing to the stream failed.
    #[error("message stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame exceeded the size limit.
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Frame length in bytes.
        len: usize,
        /// Applicable limit in bytes.
        max: usize,
    },

    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// The writer task panicked or was cancelled.
    #[error("response writer task failed: {0}")]
    Writer(String),
}

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSummary {
    /// Well-formed envelopes received.
    pub received: usize,
    /// Responses written.
    pub responded: usize,
    /// Requests whose responder was dropped without a reply.
    pub dropped: usize,
    /// Frames that were not valid envelopes.
    pub malformed: usize,
}

#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(default)]
    id: Value,
    sender: String,
    #[serde(default)]
    request: Option<Value>,
}

#[derive(Debug, Serialize)]
struct OutboundEnvelope<'a> {
    id: &'a Value,
    response: &'a BrokerResponse,
}

/// Reads envelopes, dispatches them to a [`CookieBroker`] and writes replies.
#[derive(Debug, Clone)]
pub struct MessageHost {
    broker: CookieBroker,
    framing: Framing,
}

impl MessageHost {
    /// Creates a host for `broker` using `framing` in both directions.
    #[must_use]
    pub fn new(broker: CookieBroker, framing: Framing) -> Self {
        Self { broker, framing }
    }

    /// Serves requests until `reader` reaches end of input.
    ///
    /// After end of input, waits for every in-flight request to finish before
    /// returning. Malformed envelopes are logged and skipped. Reading stops
    /// early once the writer has failed.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the stream fails, a frame exceeds the size
    /// limit, or the writer task fails.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<HostSummary, HostError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = BufReader::new(reader);
        let (tx, rx) = mpsc::unbounded_channel::<(Value, BrokerResponse)>();
        let writer_task = tokio::spawn(write_responses(writer, rx, self.framing));

        let mut in_flight = JoinSet::new();
        let mut summary = HostSummary::default();

        let read_result = loop {
            let frame = tokio::select! {
                read = read_frame(&mut reader, self.framing) => match read {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break Ok(()),
                    Err(error) => break Err(error),
                },
                () = tx.closed() => {
                    warn!("response writer stopped; no longer reading requests");
                    break Ok(());
                }
            };

            let envelope: InboundEnvelope = match serde_json::from_slice(&frame) {
                Ok(envelope) => envelope,
                Err(error) => {
                    warn!(error = %error, "skipping malformed envelope");
                    summary.malformed += 1;
                    continue;
                }
            };
            summary.received += 1;

            let (responder, reply) = Responder::channel();
            let sender = MessageSender::new(envelope.sender);
            let disposition =
                self.broker
                    .handle_external_message(envelope.request.as_ref(), &sender, responder);
            debug!(app_id = %sender.id(), id = %envelope.id, ?disposition, "dispatched request");

            let tx = tx.clone();
            let id = envelope.id;
            in_flight.spawn(async move {
                if let Ok(response) = reply.await {
                    // A closed writer is reported by the writer task itself.
                    let _ = tx.send((id, response));
                    true
                } else {
                    warn!(app_id = %sender.id(), id = %id, "response channel closed without reply");
                    false
                }
            });
        };

        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => summary.dropped += 1,
                Err(error) => {
                    warn!(error = %error, "request task failed");
                    summary.dropped += 1;
                }
            }
        }
        drop(tx);

        let written = writer_task
            .await
            .map_err(|error| HostError::Writer(error.to_string()))?;
        read_result?;
        summary.responded = written?;

        info!(
            received = summary.received,
            responded = summary.responded,
            dropped = summary.dropped,
            malformed = summary.malformed,
            "Message stream closed"
        );
        Ok(summary)
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<(Value, BrokerResponse)>,
    framing: Framing,
) -> Result<usize, HostError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some((id, response)) = rx.recv().await {
        let payload = serde_json::to_vec(&OutboundEnvelope {
            id: &id,
            response: &response,
        })?;
        match write_frame(&mut writer, framing, &payload).await {
            Ok(()) => written += 1,
            Err(HostError::FrameTooLarge { len, max }) => {
                warn!(id = %id, len, max, "response exceeds frame limit; not sent");
            }
            Err(error) => return Err(error),
        }
    }
    Ok(written)
}
