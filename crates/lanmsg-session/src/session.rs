//! Per-connection session state: configuration and the two message queues.
//!
//! A [`SessionContext`] is owned by exactly one connection loop. Handlers
//! borrow it mutably for the duration of a hook, so nothing here needs a
//! lock.

use std::collections::VecDeque;
use std::time::Duration;

use lanmsg_protocol::{DEFAULT_MAX_FRAME_SIZE, FrameCodec, Message};
use lanmsg_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for a connection session.
///
/// All fields have defaults, so a config file only needs to list the
/// ones it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest frame accepted or produced, header included.
    ///
    /// Default: 65 495 bytes.
    pub max_frame_size: usize,

    /// How many messages may wait in the outbound queue before `send`
    /// starts refusing.
    ///
    /// Default: 40.
    pub max_outbound_queue: usize,

    /// Upper bound on how long the loop waits for socket readiness before
    /// running the tick hook anyway.
    ///
    /// Default: 1000 ms.
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_outbound_queue: 40,
            poll_interval_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_max_outbound_queue(mut self, max_outbound_queue: usize) -> Self {
        self.max_outbound_queue = max_outbound_queue;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The frame codec matching `max_frame_size`.
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.max_frame_size)
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The queues and disconnect flag of one live connection.
///
/// ```text
///   socket ──decode──→ inbound ──receive_next()──→ handler
///   handler ──send()──→ outbound ──encode──→ socket
/// ```
///
/// Both queues are FIFO. The outbound queue is bounded; the bound is the
/// only backpressure in the system. Callers that get `false` back from
/// [`send`](Self::send) should try again on a later tick.
#[derive(Debug)]
pub struct SessionContext {
    id: ConnectionId,
    inbound: VecDeque<Message>,
    outbound: VecDeque<Message>,
    max_outbound: usize,
    disconnecting: bool,
}

impl SessionContext {
    pub fn new(id: ConnectionId, config: &SessionConfig) -> Self {
        Self {
            id,
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            max_outbound: config.max_outbound_queue,
            disconnecting: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `message` for transmission.
    ///
    /// Returns `false`, leaving the queue untouched, if the queue already
    /// holds `max_outbound_queue` messages.
    pub fn send(&mut self, message: Message) -> bool {
        if !self.can_send() {
            tracing::trace!(id = %self.id, kind = %message.kind(), "outbound queue full");
            return false;
        }
        self.outbound.push_back(message);
        true
    }

    /// Whether [`send`](Self::send) would currently succeed.
    pub fn can_send(&self) -> bool {
        self.outbound.len() < self.max_outbound
    }

    /// Pops the oldest received message, if any.
    pub fn receive_next(&mut self) -> Option<Message> {
        self.inbound.pop_front()
    }

    /// Marks the session for shutdown.
    ///
    /// The socket stays open until everything already queued has been
    /// written. The flag is never cleared.
    pub fn disconnect(&mut self) {
        if !self.disconnecting {
            tracing::debug!(id = %self.id, "session disconnecting");
        }
        self.disconnecting = true;
    }

    /// Queues a final `Bye` and marks the session for shutdown.
    ///
    /// The `Bye` bypasses the queue bound. Does nothing if the session is
    /// already disconnecting.
    pub fn close_gracefully(&mut self) {
        if self.disconnecting {
            return;
        }
        self.outbound.push_back(Message::Bye);
        self.disconnect();
    }

    pub fn is_disconnecting(&self) -> bool {
        self.disconnecting
    }

    /// Number of messages waiting to be written.
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Number of received messages not yet taken by the handler.
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Appends a decoded message to the inbound queue.
    ///
    /// The connection loop calls this for every frame it decodes.
    pub fn push_inbound(&mut self, message: Message) {
        self.inbound.push_back(message);
    }

    /// Takes the next message to write, oldest first.
    ///
    /// The connection loop calls this when the socket is writable.
    pub fn pop_outbound(&mut self) -> Option<Message> {
        self.outbound.pop_front()
    }
}
