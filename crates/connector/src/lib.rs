//! Vendor-neutral peer connection contract for PeerLink
//!
//! This crate defines the surface the PeerLink platform core uses to drive
//! a peer link without knowing which real-time engine sits underneath.
//!
//! # Overview
//!
//! - [`PeerConnectionConnector`] - lifecycle, negotiation, tracks, data
//!   channels and statistics for one peer link
//! - [`DataChannelConnector`] - one data channel
//! - [`ConnectionConfig`] - handshake (STUN/TURN) servers
//! - Event payloads, callback aliases, states and the shared [`Error`]
//!
//! # Example
//!
//! ```
//! use peerlink_connector::ConnectionConfig;
//!
//! let config = ConnectionConfig::default()
//!     .with_turn_server("turn:turn.example.com:3478", "user", "secret");
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.servers.len(), 2);
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod connector;
pub mod error;
pub mod events;
pub mod media;
pub mod session;
pub mod state;
pub mod stats;

pub use config::{ConnectionConfig, DataChannelMode, HandshakeServer};
pub use connector::{DataChannelConnector, PeerConnectionConnector};
pub use error::{BoxError, Error, Result};
pub use events::{
    callback, Callback, CandidateEvent, ConnectionStateChangeEvent, DataChannelEvent,
    GatheringStateChangeEvent, HandshakeStateChangeEvent, MessageEvent, TrackEvent,
};
pub use media::{
    ChannelPayload, EncodingHints, SendPriority, StreamSenderMap, StreamSenders, StreamTracks,
    TrackSender,
};
pub use session::{HandshakeCandidate, OfferOptions, SdpKind, SessionDescription};
pub use state::{ConnectionState, DataChannelState, GatheringState, HandshakeState, SignalingState};
pub use stats::{ReportEntry, StatsCollector, StatsReport};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
