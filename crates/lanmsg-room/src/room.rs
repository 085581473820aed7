//! Room actor: the single task that owns the chat room.
//!
//! All cross-session state lives here: who is connected, under which
//! nickname, in which handshake state, and how far the current file
//! transfer negotiation has come. Sessions never touch it directly; they
//! send commands through a [`RoomHandle`] and the actor applies them one
//! at a time. That ordering is the only synchronization the room needs.

use std::collections::HashMap;
use std::sync::Arc;

use lanmsg_protocol::{
    FileChunk, MAX_NICKNAME_LEN, Message, MessageKind, StatusCode, truncate_to_boundary,
};
use lanmsg_transport::ConnectionId;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};

use crate::{ClientState, RoomConfig, RoomError};

/// An outbound instruction from the room to one session's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Queue this message for the client.
    Deliver(Message),
    /// Say goodbye and close.
    Disconnect,
}

/// Channel sender for delivering room output to a session.
///
/// Control messages are never held back. Relayed file chunks are capped
/// separately by the session's [`RelayCredit`].
pub type SessionSender = mpsc::UnboundedSender<SessionCommand>;

/// Caps how many relayed file chunks may wait in one session's mailbox.
///
/// Before a chunk is relayed, the transfer's sender takes one unit from
/// every receiver and waits while a receiver has none left. The receiving
/// session hands the unit back with [`release`](Self::release) when it
/// takes the chunk off its mailbox. A receiver that stops reading thus
/// stalls the sender's session, which stops reading its socket.
#[derive(Debug, Clone)]
pub struct RelayCredit {
    units: Arc<Semaphore>,
}

impl RelayCredit {
    /// Allows up to `window` chunks in flight (at least one).
    pub fn new(window: usize) -> Self {
        Self {
            units: Arc::new(Semaphore::new(window.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    /// Returns the unit of a relayed chunk that left the mailbox.
    pub fn release(&self) {
        self.units.add_permits(1);
    }

    /// Units not currently held by queued chunks.
    pub fn available(&self) -> usize {
        self.units.available_permits()
    }

    /// Waits for a unit. `None` once the session has left the room.
    async fn take(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.units).acquire_owned().await.ok()
    }

    fn close(&self) {
        self.units.close();
    }
}

/// Result of asking the room to offer a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Every other member has been sent the request.
    Offered,
    /// Nobody else is in the room.
    Alone,
    /// Another transfer is already in flight.
    Busy,
}

/// How far the room's single file transfer has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    /// Waiting for invited members to accept or reject.
    Negotiating,
    /// Accepted; chunks are being relayed.
    Streaming,
}

/// Commands sent to the room actor through its channel.
pub(crate) enum RoomCommand {
    Register {
        id: ConnectionId,
        nickname: String,
        sender: SessionSender,
        credit: RelayCredit,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        id: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    CheckState {
        id: ConnectionId,
        kind: MessageKind,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    ChangeNickname {
        id: ConnectionId,
        name: String,
        reply: oneshot::Sender<Result<Option<String>, RoomError>>,
    },
    Chat {
        id: ConnectionId,
        text: String,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    RequestFile {
        id: ConnectionId,
        file_name: String,
        reply: oneshot::Sender<Result<RequestOutcome, RoomError>>,
    },
    RespondFile {
        id: ConnectionId,
        accept: bool,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    RelayTargets {
        id: ConnectionId,
        reply: oneshot::Sender<Vec<(ConnectionId, RelayCredit)>>,
    },
    FileData {
        id: ConnectionId,
        chunk: FileChunk,
        /// One unit from each receiver, taken by the sender's session.
        credits: Vec<(ConnectionId, OwnedSemaphorePermit)>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// A snapshot of the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    /// Nicknames of every registered session, ordered by connection.
    pub nicknames: Vec<String>,
    pub transfer: TransferPhase,
}

impl RoomInfo {
    pub fn member_count(&self) -> usize {
        self.nicknames.len()
    }
}

/// Handle to the running room actor. Used to send commands to it.
///
/// Cheap to clone; it wraps an `mpsc::Sender`. Every
/// server-side session holds one.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoomCommand::Register { .. } => "Register",
            RoomCommand::Leave { .. } => "Leave",
            RoomCommand::CheckState { .. } => "CheckState",
            RoomCommand::ChangeNickname { .. } => "ChangeNickname",
            RoomCommand::Chat { .. } => "Chat",
            RoomCommand::RequestFile { .. } => "RequestFile",
            RoomCommand::RespondFile { .. } => "RespondFile",
            RoomCommand::RelayTargets { .. } => "RelayTargets",
            RoomCommand::FileData { .. } => "FileData",
            RoomCommand::GetInfo { .. } => "GetInfo",
            RoomCommand::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl RoomHandle {
    /// Sends `command` built around a fresh reply channel and waits for
    /// the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Adds a freshly accepted session under its assigned nickname.
    ///
    /// `credit` bounds the file chunks relayed to it that may wait in
    /// its mailbox.
    pub async fn register(
        &self,
        id: ConnectionId,
        nickname: impl Into<String>,
        sender: SessionSender,
        credit: RelayCredit,
    ) -> Result<(), RoomError> {
        let nickname = nickname.into();
        self.request(|reply| RoomCommand::Register {
            id,
            nickname,
            sender,
            credit,
            reply,
        })
        .await?
    }

    /// Removes a session whose connection loop has ended.
    ///
    /// Fails with [`RoomError::NotFound`] if the session was never
    /// registered or has already left.
    pub async fn leave(&self, id: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { id, reply }).await?
    }

    /// Applies a received message kind to the session's state machine.
    ///
    /// Returns `Ok(false)` if the kind is not allowed in the current
    /// state; the state is then left unchanged.
    pub async fn check_state(
        &self,
        id: ConnectionId,
        kind: MessageKind,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::CheckState { id, kind, reply })
            .await?
    }

    /// Tries to rename a session.
    ///
    /// Returns the nickname actually adopted (cleaned up), or `None` if
    /// another member already uses it, ignoring case.
    pub async fn change_nickname(
        &self,
        id: ConnectionId,
        name: impl Into<String>,
    ) -> Result<Option<String>, RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::ChangeNickname { id, name, reply })
            .await?
    }

    /// Fans chat text out to every other member.
    ///
    /// Returns `Ok(false)` if the sender is alone in the room.
    pub async fn chat(
        &self,
        id: ConnectionId,
        text: impl Into<String>,
    ) -> Result<bool, RoomError> {
        let text = text.into();
        self.request(|reply| RoomCommand::Chat { id, text, reply })
            .await?
    }

    /// Offers a file to every other member.
    pub async fn request_file(
        &self,
        id: ConnectionId,
        file_name: impl Into<String>,
    ) -> Result<RequestOutcome, RoomError> {
        let file_name = file_name.into();
        self.request(|reply| RoomCommand::RequestFile {
            id,
            file_name,
            reply,
        })
        .await?
    }

    /// Records a member's answer to the pending offer.
    ///
    /// Returns `Ok(false)` if there is no offer this member was asked
    /// about.
    pub async fn respond_file(
        &self,
        id: ConnectionId,
        accept: bool,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::RespondFile { id, accept, reply })
            .await?
    }

    /// Relays a chunk from the transfer's sender.
    ///
    /// Waits until every receiver has room for the chunk, so a slow
    /// receiver holds up the calling session instead of letting chunks
    /// pile up in the server.
    pub async fn relay_file_data(
        &self,
        id: ConnectionId,
        chunk: FileChunk,
    ) -> Result<(), RoomError> {
        let targets = self
            .request(|reply| RoomCommand::RelayTargets { id, reply })
            .await?;
        let mut credits = Vec::with_capacity(targets.len());
        for (target, credit) in targets {
            // A receiver that left while we waited is skipped.
            if let Some(unit) = credit.take().await {
                credits.push((target, unit));
            }
        }
        self.sender
            .send(RoomCommand::FileData { id, chunk, credits })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Requests a snapshot of the room.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells every session to disconnect, then stops the actor.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A member's answer to the current file offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negotiation {
    Idle,
    Pending { sender: ConnectionId },
    Streaming { sender: ConnectionId },
}

impl Negotiation {
    fn sender(self) -> Option<ConnectionId> {
        match self {
            Negotiation::Idle => None,
            Negotiation::Pending { sender } | Negotiation::Streaming { sender } => Some(sender),
        }
    }
}

#[derive(Debug)]
struct Member {
    nickname: String,
    state: ClientState,
    sender: SessionSender,
    credit: RelayCredit,
    /// `None` unless invited to the current offer.
    answer: Option<Answer>,
}

/// The internal room state. Runs inside a Tokio task.
struct RoomActor {
    members: HashMap<ConnectionId, Member>,
    negotiation: Negotiation,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            tracing::trace!(command = ?cmd, "room command");
            match cmd {
                RoomCommand::Register {
                    id,
                    nickname,
                    sender,
                    credit,
                    reply,
                } => {
                    let _ = reply.send(self.handle_register(id, nickname, sender, credit));
                }
                RoomCommand::Leave { id, reply } => {
                    let _ = reply.send(self.handle_leave(id));
                }
                RoomCommand::CheckState { id, kind, reply } => {
                    let _ = reply.send(self.handle_check_state(id, kind));
                }
                RoomCommand::ChangeNickname { id, name, reply } => {
                    let _ = reply.send(self.handle_change_nickname(id, &name));
                }
                RoomCommand::Chat { id, text, reply } => {
                    let _ = reply.send(self.handle_chat(id, text));
                }
                RoomCommand::RequestFile {
                    id,
                    file_name,
                    reply,
                } => {
                    let _ = reply.send(self.handle_request_file(id, &file_name));
                }
                RoomCommand::RespondFile { id, accept, reply } => {
                    let _ = reply.send(self.handle_respond_file(id, accept));
                }
                RoomCommand::RelayTargets { id, reply } => {
                    let _ = reply.send(self.relay_targets(id));
                }
                RoomCommand::FileData { id, chunk, credits } => {
                    self.handle_file_data(id, chunk, credits);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(members = self.members.len(), "room shutting down");
                    for member in self.members.values() {
                        member.credit.close();
                        let _ = member.sender.send(SessionCommand::Disconnect);
                    }
                    break;
                }
            }
        }

        tracing::info!("room actor stopped");
    }

    fn member(&self, id: ConnectionId) -> Result<&Member, RoomError> {
        self.members.get(&id).ok_or(RoomError::NotFound(id))
    }

    fn member_mut(&mut self, id: ConnectionId) -> Result<&mut Member, RoomError> {
        self.members.get_mut(&id).ok_or(RoomError::NotFound(id))
    }

    fn handle_register(
        &mut self,
        id: ConnectionId,
        nickname: String,
        sender: SessionSender,
        credit: RelayCredit,
    ) -> Result<(), RoomError> {
        if self.members.contains_key(&id) {
            return Err(RoomError::AlreadyRegistered(id));
        }
        tracing::info!(%id, %nickname, members = self.members.len() + 1, "member joined");
        self.members.insert(
            id,
            Member {
                nickname,
                state: ClientState::Start,
                sender,
                credit,
                answer: None,
            },
        );
        Ok(())
    }

    fn handle_leave(&mut self, id: ConnectionId) -> Result<(), RoomError> {
        let member = self.members.remove(&id).ok_or(RoomError::NotFound(id))?;
        // Wakes a sender waiting for room in this member's mailbox.
        member.credit.close();
        tracing::info!(
            %id,
            nickname = %member.nickname,
            members = self.members.len(),
            "member left"
        );

        if self.negotiation.sender() == Some(id) {
            tracing::warn!(%id, "file sender left, canceling transfer");
            self.reset_transfer();
            self.broadcast(None, Message::Status(StatusCode::FileTransferCanceled));
        } else if matches!(self.negotiation, Negotiation::Pending { .. }) {
            // The leaver may have been the last one we were waiting on.
            self.evaluate_negotiation();
        }
        Ok(())
    }

    fn handle_check_state(
        &mut self,
        id: ConnectionId,
        kind: MessageKind,
    ) -> Result<bool, RoomError> {
        let member = self.member_mut(id)?;
        match member.state.next(kind) {
            Some(next) => {
                if next != member.state {
                    tracing::debug!(%id, from = %member.state, to = %next, "client state changed");
                    member.state = next;
                }
                Ok(true)
            }
            None => {
                tracing::warn!(%id, state = %member.state, %kind, "message not allowed in state");
                Ok(false)
            }
        }
    }

    fn handle_change_nickname(
        &mut self,
        id: ConnectionId,
        requested: &str,
    ) -> Result<Option<String>, RoomError> {
        self.member(id)?;
        let name = sanitize_nickname(requested);
        if name.is_empty() {
            tracing::debug!(%id, "empty nickname refused");
            return Ok(None);
        }

        let wanted = name.to_lowercase();
        let taken = self
            .members
            .iter()
            .any(|(other, m)| *other != id && m.nickname.to_lowercase() == wanted);
        if taken {
            tracing::debug!(%id, nickname = %name, "nickname already registered");
            return Ok(None);
        }

        let member = self.member_mut(id)?;
        let old = std::mem::replace(&mut member.nickname, name.clone());
        tracing::info!(%id, %old, new = %name, "nickname changed");
        Ok(Some(name))
    }

    fn handle_chat(&mut self, id: ConnectionId, text: String) -> Result<bool, RoomError> {
        let nickname = self.member(id)?.nickname.clone();
        if self.members.len() < 2 {
            return Ok(false);
        }
        tracing::debug!(%id, recipients = self.members.len() - 1, "chat fan-out");
        self.broadcast(Some(id), Message::chat(nickname, text));
        Ok(true)
    }

    fn handle_request_file(
        &mut self,
        id: ConnectionId,
        file_name: &str,
    ) -> Result<RequestOutcome, RoomError> {
        let nickname = self.member(id)?.nickname.clone();
        if self.negotiation != Negotiation::Idle {
            return Ok(RequestOutcome::Busy);
        }
        if self.members.len() < 2 {
            return Ok(RequestOutcome::Alone);
        }

        let base = base_name(file_name);
        self.negotiation = Negotiation::Pending { sender: id };
        for (other, member) in &mut self.members {
            if *other != id {
                member.answer = Some(Answer::Pending);
            }
        }
        tracing::info!(%id, file = %base, peers = self.members.len() - 1, "file offered");
        self.broadcast(Some(id), Message::file_request(nickname, base));
        Ok(RequestOutcome::Offered)
    }

    fn handle_respond_file(&mut self, id: ConnectionId, accept: bool) -> Result<bool, RoomError> {
        let negotiation = self.negotiation;
        let member = self.member_mut(id)?;
        let invited = matches!(negotiation, Negotiation::Pending { sender } if sender != id)
            && member.answer.is_some();
        if !invited {
            return Ok(false);
        }

        member.answer = Some(if accept {
            Answer::Accepted
        } else {
            Answer::Rejected
        });
        tracing::debug!(%id, accept, "file offer answered");
        self.evaluate_negotiation();
        Ok(true)
    }

    /// Settles the pending offer once no invited member is left
    /// undecided. Any rejection, or no acceptance at all, refuses it.
    fn evaluate_negotiation(&mut self) {
        let Negotiation::Pending { sender } = self.negotiation else {
            return;
        };

        let answers: Vec<Answer> = self
            .members
            .iter()
            .filter(|(id, _)| **id != sender)
            .filter_map(|(_, m)| m.answer)
            .collect();
        if answers.contains(&Answer::Pending) {
            return;
        }

        let accepted = answers.contains(&Answer::Accepted);
        let rejected = answers.contains(&Answer::Rejected);
        if accepted && !rejected {
            tracing::info!(%sender, receivers = answers.len(), "file transfer accepted");
            self.negotiation = Negotiation::Streaming { sender };
            self.send_to(sender, Message::Status(StatusCode::AcceptFileTransfer));
        } else {
            tracing::info!(%sender, "file transfer rejected");
            let accepters: Vec<ConnectionId> = self
                .members
                .iter()
                .filter(|(_, m)| m.answer == Some(Answer::Accepted))
                .map(|(id, _)| *id)
                .collect();
            self.reset_transfer();
            self.send_to(sender, Message::Status(StatusCode::RejectFileTransfer));
            // Peers that accepted are waiting for data that will never come.
            for id in accepters {
                self.send_to(id, Message::Status(StatusCode::FileTransferCanceled));
            }
        }
    }

    /// Receivers of the transfer `id` is streaming, with their credit.
    fn relay_targets(&self, id: ConnectionId) -> Vec<(ConnectionId, RelayCredit)> {
        if self.negotiation != (Negotiation::Streaming { sender: id }) {
            return Vec::new();
        }
        self.members
            .iter()
            .filter(|(_, m)| m.answer == Some(Answer::Accepted))
            .map(|(target, m)| (*target, m.credit.clone()))
            .collect()
    }

    /// Units in `credits` that are not handed to a receiver go back to
    /// it when dropped.
    fn handle_file_data(
        &mut self,
        id: ConnectionId,
        chunk: FileChunk,
        credits: Vec<(ConnectionId, OwnedSemaphorePermit)>,
    ) {
        if !self.members.contains_key(&id) {
            tracing::error!(error = %RoomError::NotFound(id), "file data from unregistered session");
            return;
        }
        if self.negotiation != (Negotiation::Streaming { sender: id }) {
            tracing::warn!(%id, offset = chunk.offset, "file data outside an accepted transfer, dropping");
            return;
        }

        let is_last = chunk.is_last;
        let message = Message::FileData(chunk);
        for (target, unit) in credits {
            let Some(member) = self.members.get(&target) else {
                continue;
            };
            if member.answer != Some(Answer::Accepted) {
                continue;
            }
            let delivered = member
                .sender
                .send(SessionCommand::Deliver(message.clone()))
                .is_ok();
            if delivered {
                // Given back by the receiving session through `release`.
                unit.forget();
            }
        }

        if is_last {
            tracing::info!(sender = %id, "file transfer complete");
            self.reset_transfer();
        }
    }

    fn reset_transfer(&mut self) {
        self.negotiation = Negotiation::Idle;
        for member in self.members.values_mut() {
            member.answer = None;
        }
    }

    /// Delivers `message` to every member except `except`.
    fn broadcast(&self, except: Option<ConnectionId>, message: Message) {
        for (id, member) in &self.members {
            if Some(*id) != except {
                let _ = member.sender.send(SessionCommand::Deliver(message.clone()));
            }
        }
    }

    /// Delivers to one member. Silently drops if the member is gone.
    fn send_to(&self, id: ConnectionId, message: Message) {
        if let Some(member) = self.members.get(&id) {
            let _ = member.sender.send(SessionCommand::Deliver(message));
        }
    }

    fn info(&self) -> RoomInfo {
        let mut members: Vec<_> = self.members.iter().collect();
        members.sort_by_key(|(id, _)| **id);
        RoomInfo {
            nicknames: members.into_iter().map(|(_, m)| m.nickname.clone()).collect(),
            transfer: match self.negotiation {
                Negotiation::Idle => TransferPhase::Idle,
                Negotiation::Pending { .. } => TransferPhase::Negotiating,
                Negotiation::Streaming { .. } => TransferPhase::Streaming,
            },
        }
    }
}

/// Spawns the room actor task and returns a handle to communicate with it.
///
/// `config.command_buffer` controls backpressure: if the channel fills
/// up, sessions wait (bounded channel).
pub fn spawn_room(config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = RoomActor {
        members: HashMap::new(),
        negotiation: Negotiation::Idle,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replaces control characters with spaces, trims, and bounds the length.
pub fn sanitize_nickname(requested: &str) -> String {
    let cleaned: String = requested
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    truncate_to_boundary(cleaned.trim(), MAX_NICKNAME_LEN)
        .trim_end()
        .to_owned()
}

/// The last path component of `path`, accepting both separators.
fn base_name(path: &str) -> &str {
    match path.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_nickname_replaces_control_characters() {
        assert_eq!(sanitize_nickname("Bo\tb\u{7}"), "Bo b");
    }

    #[test]
    fn test_sanitize_nickname_trims_and_bounds() {
        assert_eq!(sanitize_nickname("  Alice  "), "Alice");
        assert_eq!(sanitize_nickname(&"w".repeat(50)).len(), MAX_NICKNAME_LEN);
        assert_eq!(sanitize_nickname("\n\t"), "");
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("/home/alice/a.txt"), "a.txt");
        assert_eq!(base_name(r"C:\docs\b.pdf"), "b.pdf");
        assert_eq!(base_name("plain.bin"), "plain.bin");
    }

    #[test]
    fn test_base_name_keeps_path_with_trailing_separator() {
        assert_eq!(base_name("dir/"), "dir/");
    }

    #[test]
    fn test_negotiation_sender() {
        let id = ConnectionId::new(3);
        assert_eq!(Negotiation::Idle.sender(), None);
        assert_eq!(Negotiation::Pending { sender: id }.sender(), Some(id));
        assert_eq!(Negotiation::Streaming { sender: id }.sender(), Some(id));
    }
}
