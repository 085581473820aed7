//! The client's side of the protocol: one handler driving the connection
//! to the server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use lanmsg_protocol::{FileChunk, Message, StatusCode};
use lanmsg_session::{CommandSender, SessionContext, SessionHandler};
use tokio::sync::oneshot;

use crate::{ChatUi, FileDecision, FileStore};

/// Requests from the [`ChatClient`](crate::ChatClient) and from the
/// client's own prompt tasks.
#[derive(Debug)]
pub(crate) enum ClientCommand {
    Chat(String),
    SetNickname(String),
    SendFile(PathBuf),
    Disconnect,
    /// The user answered file offer number `offer`.
    Decision { offer: u64, decision: FileDecision },
}

/// How far the greeting has come.
enum Handshake {
    /// `Hello` sent, waiting for the assigned nickname.
    Greeting,
    /// Nickname confirmation sent, waiting for the server's answer.
    Confirming,
    Joined,
}

struct Outgoing<R> {
    file_name: String,
    reader: R,
    offset: u64,
    /// Every peer has answered and at least one accepted.
    started: bool,
}

struct Incoming<W> {
    destination: PathBuf,
    /// Opened on the first chunk.
    writer: Option<W>,
}

/// The one file transfer this client may take part in at a time.
enum Transfer<S: FileStore> {
    Idle,
    /// Offer number `offer` is in front of the user.
    Deciding { offer: u64 },
    Sending(Outgoing<S::Reader>),
    Receiving(Incoming<S::Writer>),
}

pub(crate) struct ServerSession<U, S: FileStore> {
    ui: Arc<U>,
    store: S,
    /// Our own mailbox, for posting prompt answers back to the loop.
    commands: CommandSender<ClientCommand>,
    nickname: String,
    preferred_nickname: Option<String>,
    handshake: Handshake,
    joined: Option<oneshot::Sender<()>>,
    transfer: Transfer<S>,
    /// Numbers the offers put to the user.
    offers: u64,
    max_chunk: usize,
}

impl<U: ChatUi, S: FileStore> ServerSession<U, S> {
    pub(crate) fn new(
        ui: Arc<U>,
        store: S,
        commands: CommandSender<ClientCommand>,
        preferred_nickname: Option<String>,
        joined: oneshot::Sender<()>,
        max_chunk: usize,
    ) -> Self {
        Self {
            ui,
            store,
            commands,
            nickname: String::new(),
            preferred_nickname,
            handshake: Handshake::Greeting,
            joined: Some(joined),
            transfer: Transfer::Idle,
            offers: 0,
            max_chunk,
        }
    }

    fn notice(&self, text: &str) {
        tracing::debug!(notice = text, "client notice");
        self.ui.on_status(text);
    }

    fn handle_nickname(&mut self, name: String, ctx: &mut SessionContext) {
        tracing::debug!(nickname = %name, "nickname assigned");
        self.nickname = name;
        self.ui.on_nickname_changed(&self.nickname);

        if let Handshake::Greeting = self.handshake {
            let wanted = self
                .preferred_nickname
                .take()
                .unwrap_or_else(|| self.nickname.clone());
            ctx.send(Message::nickname(wanted));
            self.handshake = Handshake::Confirming;
        } else {
            self.mark_joined();
        }
    }

    fn mark_joined(&mut self) {
        if let Handshake::Confirming = self.handshake {
            self.handshake = Handshake::Joined;
            if let Some(joined) = self.joined.take() {
                let _ = joined.send(());
            }
        }
    }

    fn handle_status(&mut self, code: StatusCode) {
        tracing::debug!(status = %code, "server status");
        match code {
            StatusCode::NicknameAlreadyRegistered => {
                self.notice("Unable to change nickname!");
                self.mark_joined();
            }
            StatusCode::ChattingAlone => {
                // The offer went nowhere.
                if matches!(&self.transfer, Transfer::Sending(outgoing) if !outgoing.started) {
                    self.transfer = Transfer::Idle;
                }
                self.notice("There are no other participants to the chat!");
            }
            StatusCode::AcceptFileTransfer => match &mut self.transfer {
                Transfer::Sending(outgoing) => {
                    outgoing.started = true;
                    let text = format!("The transfer of \"{}\" has started.", outgoing.file_name);
                    self.notice(&text);
                }
                _ => tracing::warn!("acceptance for a transfer this client is not sending"),
            },
            StatusCode::RejectFileTransfer => match self.transfer {
                Transfer::Sending(_) => {
                    self.transfer = Transfer::Idle;
                    self.notice("The file transfer was rejected by the other participants.");
                }
                _ => tracing::warn!("rejection for a transfer this client is not sending"),
            },
            StatusCode::FileTransferCanceled => match self.transfer {
                Transfer::Sending(_) => {
                    self.transfer = Transfer::Idle;
                    self.notice(
                        "Unable to send the file! Only one file may be in transfer at a time.",
                    );
                }
                Transfer::Deciding { .. } | Transfer::Receiving(_) => {
                    self.transfer = Transfer::Idle;
                    self.notice("The file transfer was canceled.");
                }
                Transfer::Idle => tracing::debug!("cancellation with no transfer"),
            },
            StatusCode::Ok => {}
        }
    }

    fn handle_file_request(&mut self, sender: String, file_name: String, ctx: &mut SessionContext) {
        if !matches!(self.transfer, Transfer::Idle) {
            tracing::info!(%sender, file = %file_name, "busy, rejecting file offer");
            ctx.send(Message::Status(StatusCode::RejectFileTransfer));
            return;
        }

        self.offers += 1;
        let offer = self.offers;
        self.transfer = Transfer::Deciding { offer };
        let text = format!("Received a request to transfer \"{file_name}\" from \"{sender}\"");
        self.notice(&text);

        let ui = Arc::clone(&self.ui);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let decision = ui.on_file_transfer_request(&sender, &file_name).await;
            // The session may be gone by now.
            let _ = commands.send(ClientCommand::Decision { offer, decision });
        });
    }

    fn handle_decision(&mut self, offer: u64, decision: FileDecision, ctx: &mut SessionContext) {
        if !matches!(self.transfer, Transfer::Deciding { offer: current } if current == offer) {
            tracing::debug!("offer withdrawn before the user answered");
            return;
        }

        if decision.accept {
            self.transfer = Transfer::Receiving(Incoming {
                destination: decision.destination,
                writer: None,
            });
            ctx.send(Message::Status(StatusCode::AcceptFileTransfer));
            self.notice("File transfer request accepted.");
        } else {
            self.transfer = Transfer::Idle;
            ctx.send(Message::Status(StatusCode::RejectFileTransfer));
            self.notice("File transfer request rejected.");
        }
    }

    async fn handle_file_data(&mut self, chunk: FileChunk) {
        let Transfer::Receiving(incoming) = &mut self.transfer else {
            tracing::debug!(offset = chunk.offset, "ignoring file data");
            return;
        };

        let written = match incoming.writer.as_mut() {
            Some(writer) => self.store.write_at(writer, chunk.offset, &chunk.data).await,
            None => match self.store.create(&incoming.destination).await {
                Ok(mut writer) => {
                    let result = self.store.write_at(&mut writer, chunk.offset, &chunk.data).await;
                    incoming.writer = Some(writer);
                    result
                }
                Err(e) => Err(e),
            },
        };
        let destination = incoming.destination.clone();

        if let Err(e) = written {
            tracing::error!(path = %destination.display(), error = %e, "cannot save file data");
            self.transfer = Transfer::Idle;
            let text = format!("Unable to open file {}! {e}", destination.display());
            self.notice(&text);
            return;
        }
        tracing::trace!(offset = chunk.offset, len = chunk.data.len(), "file data saved");

        if chunk.is_last {
            if let Transfer::Receiving(Incoming {
                writer: Some(writer),
                ..
            }) = std::mem::replace(&mut self.transfer, Transfer::Idle)
            {
                if let Err(e) = self.store.close(writer).await {
                    tracing::error!(path = %destination.display(), error = %e, "cannot close file");
                }
            }
            let text = format!("The file \"{}\" was received.", destination.display());
            self.notice(&text);
        }
    }

    async fn start_sending(&mut self, path: PathBuf, ctx: &mut SessionContext) {
        if !matches!(self.transfer, Transfer::Idle) {
            self.notice("A file transfer is already in progress.");
            return;
        }

        let reader = match self.store.open_read(&path).await {
            Ok(reader) => reader,
            Err(e) => {
                let text = format!("Unable to open file {}! {e}", path.display());
                self.notice(&text);
                return;
            }
        };
        let file_name = base_name(&path);

        tracing::info!(file = %file_name, "offering file");
        ctx.send(Message::file_request(self.nickname.clone(), file_name.clone()));
        self.transfer = Transfer::Sending(Outgoing {
            file_name,
            reader,
            offset: 0,
            started: false,
        });
        self.notice("Waiting for the other participants to answer the request.");
    }

    /// Queues the next chunk of an accepted transfer, if there is room.
    async fn send_next_chunk(&mut self, ctx: &mut SessionContext) {
        let Transfer::Sending(outgoing) = &mut self.transfer else {
            return;
        };
        if !outgoing.started || !ctx.can_send() {
            return;
        }

        let chunk = match self.store.read_chunk(&mut outgoing.reader, self.max_chunk).await {
            Ok(chunk) => chunk,
            Err(e) => {
                // End the transfer cleanly so the room is freed.
                tracing::error!(file = %outgoing.file_name, error = %e, "cannot read file");
                ctx.send(Message::file_data(outgoing.offset, true, Bytes::new()));
                self.transfer = Transfer::Idle;
                self.notice(&format!("Unable to read the file! {e}"));
                return;
            }
        };

        let len = chunk.data.len() as u64;
        ctx.send(Message::file_data(outgoing.offset, chunk.eof, chunk.data));
        tracing::trace!(offset = outgoing.offset, len, last = chunk.eof, "file chunk queued");
        outgoing.offset += len;

        if chunk.eof {
            self.transfer = Transfer::Idle;
            self.notice("The file has been sent.");
        }
    }
}

impl<U: ChatUi, S: FileStore> SessionHandler for ServerSession<U, S> {
    type Command = ClientCommand;

    async fn on_open(&mut self, ctx: &mut SessionContext) {
        ctx.send(Message::Hello);
    }

    async fn on_messages(&mut self, ctx: &mut SessionContext) {
        while let Some(message) = ctx.receive_next() {
            match message {
                Message::Nickname { name } => self.handle_nickname(name, ctx),
                Message::Status(code) => self.handle_status(code),
                Message::Chat { sender, text } => self.ui.on_chat(&sender, &text),
                Message::FileRequest { sender, file_name } => {
                    self.handle_file_request(sender, file_name, ctx);
                }
                Message::FileData(chunk) => self.handle_file_data(chunk).await,
                Message::Bye => {
                    tracing::info!("server said goodbye");
                    ctx.disconnect();
                }
                Message::Hello => tracing::warn!("unexpected hello from server"),
            }
        }
    }

    async fn on_command(&mut self, command: ClientCommand, ctx: &mut SessionContext) {
        match command {
            ClientCommand::Chat(text) => {
                ctx.send(Message::chat(self.nickname.clone(), text));
            }
            ClientCommand::SetNickname(name) => {
                ctx.send(Message::nickname(name));
            }
            ClientCommand::SendFile(path) => self.start_sending(path, ctx).await,
            ClientCommand::Disconnect => ctx.close_gracefully(),
            ClientCommand::Decision { offer, decision } => {
                self.handle_decision(offer, decision, ctx);
            }
        }
    }

    async fn on_tick(&mut self, ctx: &mut SessionContext) {
        self.send_next_chunk(ctx).await;
    }

    async fn on_closed(&mut self, _ctx: &mut SessionContext) {
        self.transfer = Transfer::Idle;
        self.ui.on_connection_closed();
    }
}

/// The file name without its directories.
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
