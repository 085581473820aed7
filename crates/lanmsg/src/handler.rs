//! Server-side protocol logic for one connected client.

use lanmsg_protocol::{Message, StatusCode};
use lanmsg_room::{RelayCredit, RequestOutcome, RoomError, RoomHandle, SessionCommand};
use lanmsg_session::{SessionContext, SessionHandler};
use lanmsg_transport::ConnectionId;

/// Handles everything one client sends and everything the room sends it.
///
/// Every received message is first checked against the client's handshake
/// state in the room; a message that is not allowed gets a `Bye` and the
/// connection is closed.
pub struct ClientSession {
    id: ConnectionId,
    nickname: String,
    room: RoomHandle,
    /// Must be the credit this session was registered with.
    credit: RelayCredit,
}

impl ClientSession {
    pub fn new(
        id: ConnectionId,
        nickname: impl Into<String>,
        room: RoomHandle,
        credit: RelayCredit,
    ) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            room,
            credit,
        }
    }

    /// The nickname this client is currently known by.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    async fn dispatch(
        &mut self,
        message: Message,
        ctx: &mut SessionContext,
    ) -> Result<(), RoomError> {
        let kind = message.kind();
        if !self.room.check_state(self.id, kind).await? {
            tracing::warn!(id = %self.id, %kind, "message not allowed in current state");
            ctx.close_gracefully();
            return Ok(());
        }

        match message {
            Message::Hello => self.reply(ctx, Message::nickname(self.nickname.clone())),
            Message::Bye => {
                tracing::info!(id = %self.id, nickname = %self.nickname, "client said goodbye");
                ctx.disconnect();
            }
            Message::Nickname { name } => match self.room.change_nickname(self.id, name).await? {
                Some(adopted) => {
                    self.nickname = adopted;
                    self.reply(ctx, Message::nickname(self.nickname.clone()));
                }
                None => self.reply(ctx, Message::Status(StatusCode::NicknameAlreadyRegistered)),
            },
            Message::Status(code) => self.on_status(code, ctx).await?,
            Message::Chat { text, .. } => {
                if !self.room.chat(self.id, text).await? {
                    self.reply(ctx, Message::Status(StatusCode::ChattingAlone));
                }
            }
            Message::FileRequest { file_name, .. } => {
                match self.room.request_file(self.id, file_name).await? {
                    RequestOutcome::Offered => {}
                    RequestOutcome::Alone => {
                        self.reply(ctx, Message::Status(StatusCode::ChattingAlone));
                    }
                    RequestOutcome::Busy => {
                        self.reply(ctx, Message::Status(StatusCode::FileTransferCanceled));
                    }
                }
            }
            Message::FileData(chunk) => self.room.relay_file_data(self.id, chunk).await?,
        }
        Ok(())
    }

    async fn on_status(
        &mut self,
        code: StatusCode,
        ctx: &mut SessionContext,
    ) -> Result<(), RoomError> {
        let accept = match code {
            StatusCode::AcceptFileTransfer => true,
            StatusCode::RejectFileTransfer => false,
            other => {
                tracing::debug!(id = %self.id, status = %other, "ignoring status from client");
                return Ok(());
            }
        };
        if !self.room.respond_file(self.id, accept).await? {
            // Nothing was offered to this client.
            self.reply(ctx, Message::Status(StatusCode::FileTransferCanceled));
        }
        Ok(())
    }

    fn reply(&self, ctx: &mut SessionContext, message: Message) {
        let kind = message.kind();
        if !ctx.send(message) {
            tracing::warn!(id = %self.id, %kind, "outbound queue full, reply dropped");
        }
    }
}

impl SessionHandler for ClientSession {
    type Command = SessionCommand;

    async fn on_messages(&mut self, ctx: &mut SessionContext) {
        while let Some(message) = ctx.receive_next() {
            if ctx.is_disconnecting() {
                tracing::debug!(id = %self.id, kind = %message.kind(), "dropping message after disconnect");
                continue;
            }
            if let Err(e) = self.dispatch(message, ctx).await {
                tracing::error!(id = %self.id, error = %e, "room request failed");
                ctx.close_gracefully();
            }
        }
    }

    async fn on_command(&mut self, command: SessionCommand, ctx: &mut SessionContext) {
        match command {
            SessionCommand::Deliver(message) => {
                if matches!(message, Message::FileData(_)) {
                    self.credit.release();
                }
                self.reply(ctx, message);
            }
            SessionCommand::Disconnect => ctx.close_gracefully(),
        }
    }

    async fn on_closed(&mut self, _ctx: &mut SessionContext) {
        match self.room.leave(self.id).await {
            Ok(()) => {}
            // The room is already gone during shutdown.
            Err(RoomError::Unavailable) => {
                tracing::debug!(id = %self.id, "room stopped before session left");
            }
            Err(e) => tracing::error!(id = %self.id, error = %e, "failed to remove session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use lanmsg_protocol::{FileChunk, MessageKind};
    use lanmsg_room::{RoomConfig, spawn_room};
    use lanmsg_session::SessionConfig;
    use tokio::sync::mpsc;

    use super::*;

    /// Registers a session and completes its handshake.
    async fn ready(
        room: &RoomHandle,
        id: u64,
        credit: RelayCredit,
    ) -> mpsc::UnboundedReceiver<SessionCommand> {
        let nickname = format!("User {id}");
        let id = ConnectionId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();
        room.register(id, nickname, tx, credit).await.unwrap();
        assert!(room.check_state(id, MessageKind::Hello).await.unwrap());
        assert!(room.check_state(id, MessageKind::Nickname).await.unwrap());
        rx
    }

    #[tokio::test]
    async fn test_on_command_returns_credit_for_relayed_chunk() {
        let room = spawn_room(RoomConfig::default());
        let _alice = ready(&room, 1, RelayCredit::new(4)).await;
        let credit = RelayCredit::new(1);
        let mut bob_inbox = ready(&room, 2, credit.clone()).await;

        room.request_file(ConnectionId::new(1), "a.bin").await.unwrap();
        room.respond_file(ConnectionId::new(2), true).await.unwrap();
        let chunk = FileChunk {
            offset: 0,
            is_last: false,
            data: Bytes::from_static(b"abc"),
        };
        room.relay_file_data(ConnectionId::new(1), chunk.clone())
            .await
            .unwrap();
        // Round-trip so the chunk has been delivered.
        room.info().await.unwrap();
        assert_eq!(credit.available(), 0);

        let mut bob =
            ClientSession::new(ConnectionId::new(2), "User 2", room.clone(), credit.clone());
        let mut ctx = SessionContext::new(ConnectionId::new(2), &SessionConfig::default());
        // Skip the offer itself.
        let mut relayed = None;
        while let Ok(command) = bob_inbox.try_recv() {
            if matches!(command, SessionCommand::Deliver(Message::FileData(_))) {
                relayed = Some(command);
            }
        }
        bob.on_command(relayed.expect("chunk was relayed"), &mut ctx).await;

        assert_eq!(credit.available(), 1);
        assert_eq!(ctx.pop_outbound(), Some(Message::FileData(chunk)));
    }

    #[tokio::test]
    async fn test_on_command_keeps_credit_for_control_messages() {
        let room = spawn_room(RoomConfig::default());
        let credit = RelayCredit::new(2);
        let mut session =
            ClientSession::new(ConnectionId::new(1), "User 1", room, credit.clone());
        let mut ctx = SessionContext::new(ConnectionId::new(1), &SessionConfig::default());

        session
            .on_command(SessionCommand::Deliver(Message::chat("Bob", "hi")), &mut ctx)
            .await;

        assert_eq!(credit.available(), 2);
        assert_eq!(ctx.pop_outbound(), Some(Message::chat("Bob", "hi")));
    }
}
