//! Room configuration and the per-client state machine.

use lanmsg_protocol::MessageKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for the chat room actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Capacity of the actor's command channel. Sessions wait when it is
    /// full.
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { command_buffer: 256 }
    }
}

// ---------------------------------------------------------------------------
// ClientState
// ---------------------------------------------------------------------------

/// Where a connected client is in the handshake.
///
/// ```text
/// Start ──Hello──→ Identify ──Nickname──→ Ready ──┐
///   │                 │                     ↑     │ Nickname, Status, Chat,
///   │                 │                     └─────┘ FileRequest, FileData
///   └──────Bye────────┴──────────Bye────────→ Invalid
/// ```
///
/// - **Start**: Connected, nothing received yet. Only `Hello` is allowed.
/// - **Identify**: Greeted and told its assigned nickname. The client must
///   confirm or change it with `Nickname`.
/// - **Ready**: Fully joined. Chat and file transfer are allowed.
/// - **Invalid**: Said `Bye`. Terminal; nothing more is accepted.
///
/// `Bye` is accepted in every state except `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientState {
    Start,
    Identify,
    Ready,
    Invalid,
}

impl ClientState {
    /// The state after receiving a message of `kind`.
    ///
    /// Returns `None` if `kind` is not allowed in the current state. That
    /// is a protocol violation and the state must not change.
    pub fn next(self, kind: MessageKind) -> Option<Self> {
        use MessageKind as K;
        match (self, kind) {
            (Self::Invalid, _) => None,
            (_, K::Bye) => Some(Self::Invalid),
            (Self::Start, K::Hello) => Some(Self::Identify),
            (Self::Identify, K::Nickname) => Some(Self::Ready),
            (
                Self::Ready,
                K::Nickname | K::Status | K::Chat | K::FileRequest | K::FileData,
            ) => Some(Self::Ready),
            _ => None,
        }
    }

    /// Returns `true` if a message of `kind` is allowed in this state.
    pub fn accepts(self, kind: MessageKind) -> bool {
        self.next(kind).is_some()
    }

    /// Returns `true` once the client has completed the handshake.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Identify => write!(f, "Identify"),
            Self::Ready => write!(f, "Ready"),
            Self::Invalid => write!(f, "Invalid"),
        }
    }
}
