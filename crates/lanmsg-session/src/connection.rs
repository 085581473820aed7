//! The connection loop: one task per socket.
//!
//! The loop waits for whichever comes first:
//!
//! - the socket becoming readable (or writable, when there is something
//!   to write),
//! - a command from another task in the mailbox,
//! - the poll interval running out.
//!
//! It then reads and decodes, writes one frame, or hands the command to
//! the handler, and finally runs the handler's tick hook. The loop ends
//! once the session is disconnecting and everything queued has been
//! written, when the peer closes, or on the first socket or protocol
//! error.

use bytes::{Buf, BytesMut};
use lanmsg_protocol::{Decoded, FrameCodec};
use lanmsg_transport::ConnectionId;
use tokio::io::{Interest, Ready};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::{SessionConfig, SessionContext, SessionError, SessionHandler};

/// Bytes reserved in the receive buffer before each read.
const READ_CHUNK: usize = 16 * 1024;

/// Handle other tasks use to post commands to a connection.
pub type CommandSender<C> = mpsc::UnboundedSender<C>;

/// The receiving end of a connection's mailbox.
pub type CommandReceiver<C> = mpsc::UnboundedReceiver<C>;

/// What woke the loop up.
enum Wakeup<C> {
    Socket(std::io::Result<Ready>),
    Command(Option<C>),
    Timeout,
}

/// Owns one socket and drives it with a [`SessionHandler`].
///
/// Nothing outside the loop ever touches the buffers or queues; other
/// tasks reach the connection only through its mailbox.
pub struct Connection<H: SessionHandler> {
    stream: TcpStream,
    codec: FrameCodec,
    config: SessionConfig,
    /// Bytes received but not yet part of a full frame.
    recv_buf: BytesMut,
    /// The frame being written. Empty between frames.
    write_buf: BytesMut,
    ctx: SessionContext,
    handler: H,
    commands: CommandReceiver<H::Command>,
}

impl<H: SessionHandler> Connection<H> {
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        handler: H,
        commands: CommandReceiver<H::Command>,
        config: SessionConfig,
    ) -> Self {
        Self {
            stream,
            codec: config.codec(),
            ctx: SessionContext::new(id, &config),
            config,
            recv_buf: BytesMut::new(),
            write_buf: BytesMut::new(),
            handler,
            commands,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.ctx.id()
    }

    /// Runs the loop to completion, then calls the handler's
    /// `on_closed` hook. The socket is closed when this returns.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let id = self.ctx.id();
        tracing::debug!(%id, "connection loop started");

        let result = self.drive().await;
        match &result {
            Ok(()) => tracing::debug!(%id, "connection loop finished"),
            Err(e) => tracing::debug!(%id, error = %e, "connection loop failed"),
        }

        self.handler.on_closed(&mut self.ctx).await;
        result
    }

    async fn drive(&mut self) -> Result<(), SessionError> {
        self.handler.on_open(&mut self.ctx).await;

        let poll_interval = self.config.poll_interval();
        let mut mailbox_open = true;

        loop {
            if self.ctx.is_disconnecting() && !self.has_pending_writes() {
                return Ok(());
            }

            let interest = if self.has_pending_writes() {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };
            let take_command = mailbox_open && self.ctx.can_send();

            let wakeup = tokio::select! {
                ready = self.stream.ready(interest) => Wakeup::Socket(ready),
                command = self.commands.recv(), if take_command => Wakeup::Command(command),
                _ = tokio::time::sleep(poll_interval) => Wakeup::Timeout,
            };

            match wakeup {
                Wakeup::Socket(ready) => {
                    let ready = ready?;
                    if ready.is_readable() || ready.is_read_closed() {
                        let open = self.read_frames().await?;
                        if !open {
                            return Ok(());
                        }
                    }
                    if ready.is_writable() {
                        self.write_next()?;
                    }
                }
                Wakeup::Command(Some(command)) => {
                    self.handler.on_command(command, &mut self.ctx).await;
                }
                Wakeup::Command(None) => {
                    // Every sender is gone; stop polling the mailbox.
                    mailbox_open = false;
                }
                Wakeup::Timeout => {}
            }

            if !self.ctx.is_disconnecting() {
                self.handler.on_tick(&mut self.ctx).await;
            }
        }
    }

    fn has_pending_writes(&self) -> bool {
        !self.write_buf.is_empty() || self.ctx.outbound_len() > 0
    }

    /// Reads what the socket has and decodes every complete frame.
    ///
    /// Returns `Ok(false)` when the peer has closed its side.
    async fn read_frames(&mut self) -> Result<bool, SessionError> {
        self.recv_buf.reserve(READ_CHUNK);
        match self.stream.try_read_buf(&mut self.recv_buf) {
            Ok(0) => {
                tracing::debug!(id = %self.ctx.id(), "peer closed the connection");
                return Ok(false);
            }
            Ok(n) => tracing::trace!(id = %self.ctx.id(), bytes = n, "read"),
            // Readiness can be spurious.
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(true),
            Err(e) => return Err(e.into()),
        }

        let mut received = 0usize;
        let outcome: Result<bool, SessionError> = loop {
            match self.codec.decode(&self.recv_buf) {
                Ok(Decoded::Message { message, consumed }) => {
                    self.recv_buf.advance(consumed);
                    tracing::trace!(id = %self.ctx.id(), kind = %message.kind(), "frame received");
                    self.ctx.push_inbound(message);
                    received += 1;
                }
                Ok(Decoded::NeedMoreData) => break Ok(true),
                Err(e) => break Err(e.into()),
            }
        };

        // Frames decoded ahead of a bad one are still handled.
        if received > 0 {
            self.handler.on_messages(&mut self.ctx).await;
        }
        outcome
    }

    /// Writes as much of the current frame as the socket takes, encoding
    /// the next queued message first if no frame is in progress.
    fn write_next(&mut self) -> Result<(), SessionError> {
        if self.write_buf.is_empty() {
            let Some(message) = self.ctx.pop_outbound() else {
                return Ok(());
            };
            self.codec.encode(&message, &mut self.write_buf)?;
            tracing::trace!(id = %self.ctx.id(), kind = %message.kind(), "frame sent");
        }

        match self.stream.try_write(&self.write_buf) {
            Ok(n) => {
                self.write_buf.advance(n);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
