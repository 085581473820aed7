//! Frame codec: converts [`Message`]s to and from bytes.
//!
//! Every frame on the wire is an 8-byte header followed by a payload:
//!
//! ```text
//! +----------------+----------------+------------------------+
//! | command (4 B)  | size (i32, BE) | payload (size bytes)   |
//! +----------------+----------------+------------------------+
//! ```
//!
//! TCP is a byte stream, so one read may hold half a frame or several
//! frames back to back. [`FrameCodec::decode`] therefore works on a
//! buffer prefix: it either returns one complete message plus the number
//! of bytes it used, or asks for more data. Nothing is delivered until
//! the whole payload has arrived.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::types::{
    FILE_NAME_FIELD_SIZE, FileChunk, MAX_CHAT_TEXT_LEN, MAX_NICKNAME_LEN, Message,
    MessageKind, NICKNAME_FIELD_SIZE, StatusCode, truncate_to_boundary,
};
use crate::ProtocolError;

/// Size of the frame header: command plus payload size.
pub const HEADER_SIZE: usize = 8;

/// Default limit on a whole frame, header included.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 65_495;

/// Bytes of a `FileData` payload that are not file contents
/// (offset + last flag).
pub const FILE_DATA_FIXED_SIZE: usize = 8 + 1;

const STATUS_SIZE: usize = 4;
const CHAT_FIXED_SIZE: usize = NICKNAME_FIELD_SIZE + 4;
const FILE_REQUEST_SIZE: usize = NICKNAME_FIELD_SIZE + FILE_NAME_FIELD_SIZE;

/// Outcome of a successful [`FrameCodec::decode`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A full frame was decoded. The caller must drop `consumed` bytes
    /// from the front of its buffer.
    Message { message: Message, consumed: usize },
    /// The buffer holds only part of a frame. Keep it and read more.
    NeedMoreData,
}

/// Encoder/decoder for lanmsg frames.
///
/// The codec is stateless apart from its size limit, so it is `Copy` and
/// each connection simply keeps its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_payload: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    /// Creates a codec that accepts frames of at most `max_frame_size`
    /// bytes, header included.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_payload: max_frame_size.saturating_sub(HEADER_SIZE),
        }
    }

    /// Largest payload a header may announce.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Largest file slice that fits in a single `FileData` frame.
    pub fn max_file_chunk(&self) -> usize {
        self.max_payload.saturating_sub(FILE_DATA_FIXED_SIZE)
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    /// Appends the frame for `message` to `dst`.
    ///
    /// String fields longer than their capacity are truncated. A file
    /// chunk too large for one frame is an error and leaves `dst`
    /// untouched.
    pub fn encode(&self, message: &Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let size = payload_size(message);
        if size > self.max_payload {
            return Err(ProtocolError::Oversize {
                size,
                max: self.max_payload,
            });
        }

        // Only reachable with a limit configured above i32::MAX.
        let wire_size = i32::try_from(size).map_err(|_| ProtocolError::Oversize {
            size,
            max: i32::MAX as usize,
        })?;

        dst.reserve(HEADER_SIZE + size);
        dst.put_slice(&message.kind().mnemonic());
        dst.put_i32(wire_size);

        match message {
            Message::Hello | Message::Bye => {}
            Message::Nickname { name } => {
                put_fixed_str(dst, name, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN);
            }
            Message::Status(code) => dst.put_u32(code.as_u32()),
            Message::Chat { sender, text } => {
                put_fixed_str(dst, sender, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN);
                let text = truncate_to_boundary(text, MAX_CHAT_TEXT_LEN);
                dst.put_u32(text.len() as u32);
                dst.put_slice(text.as_bytes());
            }
            Message::FileRequest { sender, file_name } => {
                put_fixed_str(dst, sender, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN);
                put_fixed_str(dst, file_name, FILE_NAME_FIELD_SIZE, FILE_NAME_FIELD_SIZE);
            }
            Message::FileData(chunk) => {
                dst.put_u64(chunk.offset);
                dst.put_u8(u8::from(chunk.is_last));
                dst.put_slice(&chunk.data);
            }
        }
        Ok(())
    }

    /// Encodes `message` into a fresh buffer.
    pub fn encode_to_bytes(&self, message: &Message) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::new();
        self.encode(message, &mut buf)?;
        Ok(buf.freeze())
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    /// Tries to decode one frame from the front of `src`.
    ///
    /// The header is validated as soon as it is complete, so an unknown
    /// command or an oversize announcement fails immediately instead of
    /// waiting for a payload that may never come.
    pub fn decode(&self, src: &[u8]) -> Result<Decoded, ProtocolError> {
        if src.len() < HEADER_SIZE {
            return Ok(Decoded::NeedMoreData);
        }

        let mut header = &src[..HEADER_SIZE];
        let mut command = [0u8; 4];
        header.copy_to_slice(&mut command);
        let kind = MessageKind::from_mnemonic(command)
            .ok_or(ProtocolError::UnknownCommand(command))?;

        let announced = header.get_i32();
        let size = usize::try_from(announced)
            .map_err(|_| ProtocolError::NegativeSize(announced))?;
        if size > self.max_payload {
            return Err(ProtocolError::Oversize {
                size,
                max: self.max_payload,
            });
        }

        let total = HEADER_SIZE + size;
        if src.len() < total {
            return Ok(Decoded::NeedMoreData);
        }

        let message = decode_payload(kind, &src[HEADER_SIZE..total])?;
        Ok(Decoded::Message {
            message,
            consumed: total,
        })
    }
}

/// Payload size of `message` once encoded, after truncation.
fn payload_size(message: &Message) -> usize {
    match message {
        Message::Hello | Message::Bye => 0,
        Message::Nickname { .. } => NICKNAME_FIELD_SIZE,
        Message::Status(_) => STATUS_SIZE,
        Message::Chat { text, .. } => {
            CHAT_FIXED_SIZE + truncate_to_boundary(text, MAX_CHAT_TEXT_LEN).len()
        }
        Message::FileRequest { .. } => FILE_REQUEST_SIZE,
        Message::FileData(chunk) => FILE_DATA_FIXED_SIZE + chunk.data.len(),
    }
}

fn decode_payload(kind: MessageKind, mut payload: &[u8]) -> Result<Message, ProtocolError> {
    let message = match kind {
        // No payload. Anything extra is ignored.
        MessageKind::Hello => Message::Hello,
        MessageKind::Bye => Message::Bye,
        MessageKind::Nickname => {
            require(kind, payload, NICKNAME_FIELD_SIZE)?;
            Message::Nickname {
                name: get_fixed_str(&mut payload, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN),
            }
        }
        MessageKind::Status => {
            require(kind, payload, STATUS_SIZE)?;
            let code = payload.get_u32();
            let status = StatusCode::from_u32(code).ok_or_else(|| {
                ProtocolError::InvalidMessage(format!("unknown status code {code}"))
            })?;
            Message::Status(status)
        }
        MessageKind::Chat => {
            require(kind, payload, CHAT_FIXED_SIZE)?;
            let sender = get_fixed_str(&mut payload, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN);
            let len = payload.get_u32() as usize;
            if len > MAX_CHAT_TEXT_LEN {
                return Err(ProtocolError::InvalidMessage(format!(
                    "chat text of {len} bytes exceeds {MAX_CHAT_TEXT_LEN}"
                )));
            }
            if payload.len() < len {
                return Err(ProtocolError::Truncated {
                    kind: MessageKind::Chat,
                    got: CHAT_FIXED_SIZE + payload.len(),
                    need: CHAT_FIXED_SIZE + len,
                });
            }
            if payload.len() > len {
                return Err(ProtocolError::InvalidMessage(format!(
                    "chat payload has {} trailing bytes",
                    payload.len() - len
                )));
            }
            let text = String::from_utf8_lossy(&payload[..len]).into_owned();
            Message::Chat { sender, text }
        }
        MessageKind::FileRequest => {
            require(kind, payload, FILE_REQUEST_SIZE)?;
            let sender = get_fixed_str(&mut payload, NICKNAME_FIELD_SIZE, MAX_NICKNAME_LEN);
            let file_name =
                get_fixed_str(&mut payload, FILE_NAME_FIELD_SIZE, FILE_NAME_FIELD_SIZE);
            Message::FileRequest { sender, file_name }
        }
        MessageKind::FileData => {
            require(kind, payload, FILE_DATA_FIXED_SIZE)?;
            let offset = payload.get_u64();
            let is_last = match payload.get_u8() {
                0 => false,
                1 => true,
                other => {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "last-chunk flag must be 0 or 1, got {other}"
                    )));
                }
            };
            Message::FileData(FileChunk {
                offset,
                is_last,
                data: Bytes::copy_from_slice(payload),
            })
        }
    };
    Ok(message)
}

fn require(kind: MessageKind, payload: &[u8], need: usize) -> Result<(), ProtocolError> {
    if payload.len() < need {
        return Err(ProtocolError::Truncated {
            kind,
            got: payload.len(),
            need,
        });
    }
    Ok(())
}

/// Writes `text` into a zero-padded field of `width` bytes.
fn put_fixed_str(dst: &mut BytesMut, text: &str, width: usize, max_len: usize) {
    let text = truncate_to_boundary(text, max_len);
    dst.put_slice(text.as_bytes());
    dst.put_bytes(0, width - text.len());
}

/// Reads a zero-padded field of `width` bytes. The caller has checked
/// that `width` bytes are available.
fn get_fixed_str(src: &mut &[u8], width: usize, max_len: usize) -> String {
    let field = &src[..width];
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    let text = String::from_utf8_lossy(&field[..end]);
    let text = truncate_to_boundary(&text, max_len).to_owned();
    src.advance(width);
    text
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(codec: &FrameCodec, bytes: &[u8]) -> Message {
        match codec.decode(bytes).unwrap() {
            Decoded::Message { message, consumed } => {
                assert_eq!(consumed, bytes.len());
                message
            }
            Decoded::NeedMoreData => panic!("expected a full frame"),
        }
    }

    fn header(command: &[u8; 4], size: i32) -> Vec<u8> {
        let mut buf = command.to_vec();
        buf.extend_from_slice(&size.to_be_bytes());
        buf
    }

    // =====================================================================
    // Round trips
    // =====================================================================

    #[test]
    fn test_round_trip_every_kind() {
        let codec = FrameCodec::default();
        let messages = [
            Message::Hello,
            Message::Bye,
            Message::nickname("Alice"),
            Message::Status(StatusCode::NicknameAlreadyRegistered),
            Message::chat("Bob", "hi there"),
            Message::chat("", ""),
            Message::file_request("Carol", "report.pdf"),
            Message::file_data(4096, false, vec![1u8, 2, 3]),
            Message::file_data(0, true, Bytes::new()),
        ];
        for message in messages {
            let bytes = codec.encode_to_bytes(&message).unwrap();
            assert_eq!(decode_one(&codec, &bytes), message, "{message:?}");
        }
    }

    #[test]
    fn test_round_trip_multibyte_strings_at_capacity() {
        let codec = FrameCodec::default();
        // 17 two-byte characters = 34 bytes, under the 35 byte limit.
        let name = "é".repeat(17);
        let message = Message::chat(name, "ü".repeat(512));
        let bytes = codec.encode_to_bytes(&message).unwrap();
        assert_eq!(decode_one(&codec, &bytes), message);
    }

    // =====================================================================
    // Layout
    // =====================================================================

    #[test]
    fn test_encode_hello_is_header_only() {
        let bytes = FrameCodec::default().encode_to_bytes(&Message::Hello).unwrap();
        assert_eq!(&bytes[..], &header(b"HELO", 0)[..]);
    }

    #[test]
    fn test_encode_nickname_is_zero_padded() {
        let bytes = FrameCodec::default()
            .encode_to_bytes(&Message::nickname("Bob"))
            .unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + NICKNAME_FIELD_SIZE);
        assert_eq!(&bytes[..8], &header(b"NICK", 36)[..]);
        assert_eq!(&bytes[8..11], b"Bob");
        assert!(bytes[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_status_is_big_endian_code() {
        let bytes = FrameCodec::default()
            .encode_to_bytes(&Message::Status(StatusCode::ChattingAlone))
            .unwrap();
        assert_eq!(&bytes[8..], &201u32.to_be_bytes());
    }

    #[test]
    fn test_encode_truncates_unbounded_fields() {
        let codec = FrameCodec::default();
        // Built by hand, bypassing the truncating constructor.
        let message = Message::Nickname {
            name: "z".repeat(80),
        };
        let bytes = codec.encode_to_bytes(&message).unwrap();
        assert_eq!(decode_one(&codec, &bytes), Message::nickname("z".repeat(35)));
    }

    #[test]
    fn test_encode_file_chunk_too_large_is_error() {
        let codec = FrameCodec::new(64);
        let fits = Message::file_data(0, false, vec![0u8; codec.max_file_chunk()]);
        assert!(codec.encode_to_bytes(&fits).is_ok());

        let too_big = Message::file_data(0, false, vec![0u8; codec.max_file_chunk() + 1]);
        let mut buf = BytesMut::new();
        let result = codec.encode(&too_big, &mut buf);
        assert!(matches!(result, Err(ProtocolError::Oversize { .. })));
        assert!(buf.is_empty(), "failed encode must not write anything");
    }

    // =====================================================================
    // Reassembly
    // =====================================================================

    #[test]
    fn test_decode_partial_frame_needs_more_data_for_every_prefix() {
        let codec = FrameCodec::default();
        let message = Message::chat("Dave", "split me into tiny pieces");
        let bytes = codec.encode_to_bytes(&message).unwrap();

        for end in 0..bytes.len() {
            assert_eq!(
                codec.decode(&bytes[..end]).unwrap(),
                Decoded::NeedMoreData,
                "prefix of {end} bytes"
            );
        }
        assert_eq!(decode_one(&codec, &bytes), message);
    }

    #[test]
    fn test_decode_concatenated_frames_one_at_a_time() {
        let codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(&Message::Hello, &mut buf).unwrap();
        codec.encode(&Message::nickname("Eve"), &mut buf).unwrap();

        let Decoded::Message { message, consumed } = codec.decode(&buf).unwrap() else {
            panic!("expected first frame");
        };
        assert_eq!(message, Message::Hello);
        buf.advance(consumed);

        let Decoded::Message { message, consumed } = codec.decode(&buf).unwrap() else {
            panic!("expected second frame");
        };
        assert_eq!(message, Message::nickname("Eve"));
        assert_eq!(consumed, buf.len());
    }

    // =====================================================================
    // Invalid frames
    // =====================================================================

    #[test]
    fn test_decode_unknown_command_is_invalid() {
        let result = FrameCodec::default().decode(&header(b"PING", 0));
        assert!(matches!(result, Err(ProtocolError::UnknownCommand(c)) if &c == b"PING"));
    }

    #[test]
    fn test_decode_oversize_header_is_invalid_without_payload() {
        let codec = FrameCodec::new(100);
        let result = codec.decode(&header(b"CHAT", 93));
        assert!(matches!(result, Err(ProtocolError::Oversize { size: 93, max: 92 })));
    }

    #[test]
    fn test_decode_negative_size_is_invalid() {
        let result = FrameCodec::default().decode(&header(b"FTDT", -1));
        assert!(matches!(result, Err(ProtocolError::NegativeSize(-1))));
    }

    #[test]
    fn test_decode_short_nickname_payload_is_invalid() {
        let mut bytes = header(b"NICK", 4);
        bytes.extend_from_slice(b"Bob\0");
        let result = FrameCodec::default().decode(&bytes);
        assert!(matches!(
            result,
            Err(ProtocolError::Truncated { need: 36, got: 4, .. })
        ));
    }

    #[test]
    fn test_decode_chat_length_beyond_payload_is_invalid() {
        let mut bytes = header(b"CHAT", 40);
        bytes.extend_from_slice(&[0u8; 36]);
        bytes.extend_from_slice(&10u32.to_be_bytes());
        let result = FrameCodec::default().decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn test_decode_chat_trailing_bytes_is_invalid() {
        let mut bytes = header(b"CHAT", 47);
        bytes.extend_from_slice(&[0u8; 36]);
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(b"hi");
        bytes.extend_from_slice(b"junk!");
        let result = FrameCodec::default().decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_decode_unknown_status_code_is_invalid() {
        let mut bytes = header(b"STAT", 4);
        bytes.extend_from_slice(&999u32.to_be_bytes());
        let result = FrameCodec::default().decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_decode_bad_last_flag_is_invalid() {
        let mut bytes = header(b"FTDT", 9);
        bytes.extend_from_slice(&0u64.to_be_bytes());
        bytes.push(7);
        let result = FrameCodec::default().decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_max_file_chunk_accounts_for_header_and_fields() {
        let codec = FrameCodec::default();
        assert_eq!(codec.max_payload(), DEFAULT_MAX_FRAME_SIZE - HEADER_SIZE);
        assert_eq!(
            codec.max_file_chunk(),
            DEFAULT_MAX_FRAME_SIZE - HEADER_SIZE - FILE_DATA_FIXED_SIZE
        );
    }
}
