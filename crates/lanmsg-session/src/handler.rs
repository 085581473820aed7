//! Hooks that give a connection its behavior.
//!
//! The connection loop only moves bytes and messages. Everything a
//! particular side of the protocol does (answering `Hello`, relaying chat,
//! pacing file chunks) lives in a [`SessionHandler`]. The server and the
//! client each implement it once.
//!
//! Each hook receives the session's [`SessionContext`] mutably. The hooks
//! run on the connection's own task, one at a time, so a handler can keep
//! plain fields without any locking.

use std::future::Future;

use crate::SessionContext;

/// Per-connection protocol logic driven by the connection loop.
///
/// The hooks return `impl Future + Send` rather than being `async fn`, so
/// a connection with any handler can be moved onto a tokio task.
/// Implementations are free to write them as `async fn`.
///
/// # Example
///
/// ```rust
/// use lanmsg_session::{SessionContext, SessionHandler};
///
/// /// Sends every message straight back.
/// struct Echo;
///
/// impl SessionHandler for Echo {
///     type Command = ();
///
///     async fn on_messages(&mut self, ctx: &mut SessionContext) {
///         while let Some(message) = ctx.receive_next() {
///             ctx.send(message);
///         }
///     }
///
///     async fn on_command(&mut self, _command: (), _ctx: &mut SessionContext) {}
/// }
/// ```
pub trait SessionHandler: Send + 'static {
    /// Requests that other tasks post into this connection's mailbox.
    type Command: Send + 'static;

    /// Runs once, before the loop first waits on the socket.
    fn on_open(&mut self, ctx: &mut SessionContext) -> impl Future<Output = ()> + Send {
        let _ = ctx;
        async {}
    }

    /// One or more messages were appended to the inbound queue. Take them
    /// with [`SessionContext::receive_next`].
    fn on_messages(&mut self, ctx: &mut SessionContext) -> impl Future<Output = ()> + Send;

    /// A command arrived in the mailbox.
    ///
    /// The loop only takes a command while the outbound queue has room,
    /// so one `send` from here always succeeds.
    fn on_command(
        &mut self,
        command: Self::Command,
        ctx: &mut SessionContext,
    ) -> impl Future<Output = ()> + Send;

    /// Runs after every loop iteration that saw no error, as long as the
    /// session is not disconnecting.
    fn on_tick(&mut self, ctx: &mut SessionContext) -> impl Future<Output = ()> + Send {
        let _ = ctx;
        async {}
    }

    /// Runs exactly once when the loop exits, for whatever reason.
    fn on_closed(&mut self, ctx: &mut SessionContext) -> impl Future<Output = ()> + Send {
        let _ = ctx;
        async {}
    }
}
