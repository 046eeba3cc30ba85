//! Configuration types for peer connections

use serde::{Deserialize, Serialize};

/// URL schemes accepted for handshake servers
const SERVER_SCHEMES: [&str; 4] = ["stun:", "stuns:", "turn:", "turns:"];

/// Configuration supplied when constructing a peer connection
///
/// The server list is handed to the host engine verbatim and in order;
/// nothing is retained by the adapter after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Handshake (ICE) servers, STUN and TURN alike
    #[serde(default)]
    pub servers: Vec<HandshakeServer>,
}

/// One handshake (ICE) server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeServer {
    /// Server URLs (stun:, stuns:, turn: or turns:)
    pub urls: Vec<String>,

    /// Username for TURN authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Credential for TURN authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl HandshakeServer {
    /// Server without credentials (typically STUN)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    /// Server with TURN credentials
    pub fn with_credentials(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    fn is_turn(&self) -> bool {
        self.urls
            .iter()
            .any(|url| url.starts_with("turn:") || url.starts_with("turns:"))
    }
}

/// Data channel mode
///
/// Determines the reliability of message delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataChannelMode {
    /// Reliable, ordered delivery (default)
    ///
    /// Messages are guaranteed to arrive in order and without loss.
    Reliable,
    /// Unreliable, unordered delivery (low latency)
    ///
    /// Messages may arrive out of order or be lost.
    Unreliable,
}

impl DataChannelMode {
    /// Whether the channel preserves message order
    pub fn ordered(&self) -> bool {
        match self {
            DataChannelMode::Reliable => true,
            DataChannelMode::Unreliable => false,
        }
    }

    /// Retransmit limit, `None` meaning unlimited
    pub fn max_retransmits(&self) -> Option<u16> {
        match self {
            DataChannelMode::Reliable => None,
            DataChannelMode::Unreliable => Some(0),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            servers: vec![HandshakeServer::new("stun:stun.l.google.com:19302")],
        }
    }
}

impl ConnectionConfig {
    /// Configuration with no handshake servers (host candidates only)
    pub fn empty() -> Self {
        Self {
            servers: Vec::new(),
        }
    }

    /// Validate the server list
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a server has no URLs
    /// - a URL does not use a stun:, stuns:, turn: or turns: scheme
    /// - a TURN server is missing its username or credential
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        for (index, server) in self.servers.iter().enumerate() {
            if server.urls.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "server {} has no URLs",
                    index
                )));
            }

            if let Some(url) = server
                .urls
                .iter()
                .find(|url| !SERVER_SCHEMES.iter().any(|scheme| url.starts_with(scheme)))
            {
                return Err(Error::InvalidConfig(format!(
                    "server URL must start with stun:, stuns:, turn: or turns:, got {}",
                    url
                )));
            }

            if server.is_turn() && (server.username.is_none() || server.credential.is_none()) {
                return Err(Error::InvalidConfig(format!(
                    "TURN server {} requires a username and credential",
                    server.urls[0]
                )));
            }
        }

        Ok(())
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration to JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Append a server without credentials
    ///
    /// Useful for chaining.
    pub fn with_server(mut self, url: &str) -> Self {
        self.servers.push(HandshakeServer::new(url));
        self
    }

    /// Append a TURN server
    ///
    /// Useful for chaining.
    pub fn with_turn_server(mut self, url: &str, username: &str, credential: &str) -> Self {
        self.servers
            .push(HandshakeServer::with_credentials(url, username, credential));
        self
    }
}
