//! Message catalog for the lanmsg wire format.
//!
//! Every value that travels between a client and the server is a
//! [`Message`]. Each variant owns its payload directly, so decoding hands
//! back the concrete kind without any downcasting.
//!
//! String fields have a fixed capacity on the wire. Constructors and the
//! encoder both truncate silently to that capacity, always on a UTF-8
//! character boundary, so a `Message` built through the constructors
//! survives an encode/decode trip unchanged.

use std::fmt;

use bytes::Bytes;

// ---------------------------------------------------------------------------
// Field capacities
// ---------------------------------------------------------------------------

/// Width of a nickname field on the wire, terminator included.
pub const NICKNAME_FIELD_SIZE: usize = 36;

/// Longest nickname in bytes. One byte of the field is always a zero
/// terminator.
pub const MAX_NICKNAME_LEN: usize = NICKNAME_FIELD_SIZE - 1;

/// Longest chat text in bytes.
pub const MAX_CHAT_TEXT_LEN: usize = 1024;

/// Width of a file name field on the wire. Names that fill the whole
/// field are written without a terminator.
pub const FILE_NAME_FIELD_SIZE: usize = 64;

/// Cuts `text` down to at most `max_len` bytes without splitting a
/// multi-byte character.
///
/// ```
/// use lanmsg_protocol::truncate_to_boundary;
///
/// assert_eq!(truncate_to_boundary("héllo", 2), "h");
/// assert_eq!(truncate_to_boundary("short", 64), "short");
/// ```
pub fn truncate_to_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    // `is_char_boundary(0)` is always true, so this terminates.
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn bounded(text: impl Into<String>, max_len: usize) -> String {
    let mut text = text.into();
    let keep = truncate_to_boundary(&text, max_len).len();
    text.truncate(keep);
    text
}

// ---------------------------------------------------------------------------
// MessageKind: the tag of a frame
// ---------------------------------------------------------------------------

/// The kind of a message, without its payload.
///
/// This is what the frame header's 4-byte mnemonic identifies, and what
/// the server's per-client state machine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hello,
    Nickname,
    Bye,
    Status,
    Chat,
    FileRequest,
    FileData,
}

impl MessageKind {
    /// Every kind, in mnemonic-table order.
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Hello,
        MessageKind::Nickname,
        MessageKind::Bye,
        MessageKind::Status,
        MessageKind::Chat,
        MessageKind::FileRequest,
        MessageKind::FileData,
    ];

    /// The fixed 4-byte command written in the frame header.
    pub fn mnemonic(self) -> [u8; 4] {
        match self {
            MessageKind::Hello => *b"HELO",
            MessageKind::Nickname => *b"NICK",
            MessageKind::Bye => *b"BYE_",
            MessageKind::Status => *b"STAT",
            MessageKind::Chat => *b"CHAT",
            MessageKind::FileRequest => *b"FTRQ",
            MessageKind::FileData => *b"FTDT",
        }
    }

    /// Looks a header command up in the mnemonic table.
    ///
    /// Returns `None` for anything not in the table; the codec turns
    /// that into a protocol error.
    pub fn from_mnemonic(command: [u8; 4]) -> Option<MessageKind> {
        Self::ALL.into_iter().find(|kind| kind.mnemonic() == command)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mnemonics are plain ASCII.
        let mnemonic = self.mnemonic();
        f.write_str(std::str::from_utf8(&mnemonic).unwrap_or("????"))
    }
}

// ---------------------------------------------------------------------------
// StatusCode
// ---------------------------------------------------------------------------

/// Result codes carried by a `Status` message.
///
/// The numeric values are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StatusCode {
    Ok = 200,
    /// The sender is the only participant in the room.
    ChattingAlone = 201,
    /// Another participant already uses the requested nickname.
    NicknameAlreadyRegistered = 202,
    /// Peers agreed to receive a file (or a peer agrees, client to server).
    AcceptFileTransfer = 203,
    /// Peers refused a file (or a peer refuses, client to server).
    RejectFileTransfer = 204,
    /// The transfer was aborted, or could not start because another one
    /// is in flight.
    FileTransferCanceled = 205,
}

impl StatusCode {
    /// The code as written on the wire.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Parses a wire code. Unknown values return `None`.
    pub fn from_u32(code: u32) -> Option<StatusCode> {
        match code {
            200 => Some(StatusCode::Ok),
            201 => Some(StatusCode::ChattingAlone),
            202 => Some(StatusCode::NicknameAlreadyRegistered),
            203 => Some(StatusCode::AcceptFileTransfer),
            204 => Some(StatusCode::RejectFileTransfer),
            205 => Some(StatusCode::FileTransferCanceled),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "ok",
            StatusCode::ChattingAlone => "chatting alone",
            StatusCode::NicknameAlreadyRegistered => "nickname already registered",
            StatusCode::AcceptFileTransfer => "accept file transfer",
            StatusCode::RejectFileTransfer => "reject file transfer",
            StatusCode::FileTransferCanceled => "file transfer canceled",
        };
        write!(f, "{name} ({})", self.as_u32())
    }
}

// ---------------------------------------------------------------------------
// FileChunk
// ---------------------------------------------------------------------------

/// One slice of a file in flight.
///
/// `data` is a [`Bytes`] so the server can relay the same chunk to many
/// peers without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    /// Position of `data` within the file.
    pub offset: u64,
    /// Set on the final chunk. The final chunk may be empty.
    pub is_last: bool,
    pub data: Bytes,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A protocol message: one variant per kind, each owning its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// First message of a client, answered with its assigned nickname.
    Hello,
    /// Announces departure. The receiver ends the session.
    Bye,
    /// Client to server: rename request. Server to client: the nickname
    /// now in effect.
    Nickname { name: String },
    Status(StatusCode),
    /// An empty `sender` means the text comes from the local user; the
    /// server fills in the nickname before fanning it out.
    Chat { sender: String, text: String },
    /// Offer of a file. The server forwards only the base name.
    FileRequest { sender: String, file_name: String },
    FileData(FileChunk),
}

impl Message {
    /// Builds a `Nickname`, truncating to [`MAX_NICKNAME_LEN`].
    pub fn nickname(name: impl Into<String>) -> Self {
        Message::Nickname {
            name: bounded(name, MAX_NICKNAME_LEN),
        }
    }

    /// Builds a `Chat`, truncating both fields to their capacity.
    pub fn chat(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Message::Chat {
            sender: bounded(sender, MAX_NICKNAME_LEN),
            text: bounded(text, MAX_CHAT_TEXT_LEN),
        }
    }

    /// Builds a `FileRequest`, truncating both fields to their capacity.
    pub fn file_request(
        sender: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Message::FileRequest {
            sender: bounded(sender, MAX_NICKNAME_LEN),
            file_name: bounded(file_name, FILE_NAME_FIELD_SIZE),
        }
    }

    pub fn file_data(offset: u64, is_last: bool, data: impl Into<Bytes>) -> Self {
        Message::FileData(FileChunk {
            offset,
            is_last,
            data: data.into(),
        })
    }

    /// Returns the tag of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Hello => MessageKind::Hello,
            Message::Bye => MessageKind::Bye,
            Message::Nickname { .. } => MessageKind::Nickname,
            Message::Status(_) => MessageKind::Status,
            Message::Chat { .. } => MessageKind::Chat,
            Message::FileRequest { .. } => MessageKind::FileRequest,
            Message::FileData(_) => MessageKind::FileData,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Mnemonic table
    // =====================================================================

    #[test]
    fn test_mnemonic_table_round_trips_every_kind() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_mnemonic(kind.mnemonic()), Some(kind));
        }
    }

    #[test]
    fn test_mnemonic_unknown_command_is_none() {
        assert_eq!(MessageKind::from_mnemonic(*b"XXXX"), None);
        // Mnemonics are case sensitive.
        assert_eq!(MessageKind::from_mnemonic(*b"helo"), None);
    }

    #[test]
    fn test_message_kind_display_is_mnemonic() {
        assert_eq!(MessageKind::Bye.to_string(), "BYE_");
        assert_eq!(MessageKind::FileData.to_string(), "FTDT");
    }

    // =====================================================================
    // Status codes
    // =====================================================================

    #[test]
    fn test_status_code_wire_values_start_at_200() {
        assert_eq!(StatusCode::Ok.as_u32(), 200);
        assert_eq!(StatusCode::FileTransferCanceled.as_u32(), 205);
    }

    #[test]
    fn test_status_code_from_u32_rejects_unknown() {
        assert_eq!(StatusCode::from_u32(203), Some(StatusCode::AcceptFileTransfer));
        assert_eq!(StatusCode::from_u32(199), None);
        assert_eq!(StatusCode::from_u32(206), None);
    }

    // =====================================================================
    // Truncation
    // =====================================================================

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_to_boundary("Bob", MAX_NICKNAME_LEN), "Bob");
    }

    #[test]
    fn test_truncate_never_splits_a_character() {
        // "é" is two bytes; cutting at 1 must back off to 0.
        assert_eq!(truncate_to_boundary("é", 1), "");
        assert_eq!(truncate_to_boundary("aé", 2), "a");
    }

    #[test]
    fn test_nickname_constructor_truncates_to_capacity() {
        let long = "x".repeat(100);
        let Message::Nickname { name } = Message::nickname(long) else {
            panic!("expected Nickname");
        };
        assert_eq!(name.len(), MAX_NICKNAME_LEN);
    }

    #[test]
    fn test_chat_constructor_truncates_text() {
        let Message::Chat { text, .. } = Message::chat("", "y".repeat(2000)) else {
            panic!("expected Chat");
        };
        assert_eq!(text.len(), MAX_CHAT_TEXT_LEN);
    }

    #[test]
    fn test_file_request_keeps_full_width_name() {
        let name = "n".repeat(FILE_NAME_FIELD_SIZE);
        let msg = Message::file_request("", name.clone());
        assert_eq!(
            msg,
            Message::FileRequest {
                sender: String::new(),
                file_name: name
            }
        );
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Message::Hello.kind(), MessageKind::Hello);
        assert_eq!(
            Message::Status(StatusCode::Ok).kind(),
            MessageKind::Status
        );
        assert_eq!(
            Message::file_data(0, true, Bytes::new()).kind(),
            MessageKind::FileData
        );
    }
}
