//! Server configuration, loadable from JSON.

use std::path::Path;

use lanmsg_protocol::DEFAULT_PORT;
use lanmsg_room::RoomConfig;
use lanmsg_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::LanMsgError;

/// Everything the server can be tuned with.
///
/// Every field has a default, so `{}` is a valid config file:
///
/// ```json
/// {
///   "bind_addr": "0.0.0.0:12345",
///   "session": { "max_outbound_queue": 40, "poll_interval_ms": 1000 },
///   "room": { "command_buffer": 256 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,
    /// Applied to every client connection.
    pub session: SessionConfig,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            session: SessionConfig::default(),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, LanMsgError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LanMsgError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LanMsgError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_binds_all_interfaces_on_default_port() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:12345");
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_from_json_empty_object_is_default() {
        assert_eq!(ServerConfig::from_json("{}").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = ServerConfig::from_json(
            r#"{ "bind_addr": "127.0.0.1:9000", "session": { "max_outbound_queue": 8 } }"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.session.max_outbound_queue, 8);
        assert_eq!(
            config.session.poll_interval_ms,
            SessionConfig::default().poll_interval_ms
        );
        assert_eq!(config.room, RoomConfig::default());
    }

    #[test]
    fn test_from_json_malformed_is_config_error() {
        let err = ServerConfig::from_json("{ bind_addr").unwrap_err();
        assert!(matches!(err, LanMsgError::Config(_)));
    }

    #[test]
    fn test_from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "room": {{ "command_buffer": 4 }} }}"#).unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.room.command_buffer, 4);
    }

    #[test]
    fn test_from_file_missing_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = ServerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, LanMsgError::ConfigFile { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
