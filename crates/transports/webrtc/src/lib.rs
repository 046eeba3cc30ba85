//! webrtc-rs adapters for the PeerLink connector contract
//!
//! This crate exposes a webrtc-rs peer connection through
//! [`peerlink_connector::PeerConnectionConnector`] and its data channels
//! through [`peerlink_connector::DataChannelConnector`], so the PeerLink
//! core can drive a peer link without depending on the engine.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  PeerLink core                                         │
//! │  ↓ (PeerConnectionConnector / DataChannelConnector)    │
//! │  PeerConnectionAdapter<H>                              │
//! │  ├─ callback slots (one per event type)                │
//! │  ├─ DataChannelAdapter<C> (local + incoming channels)  │
//! │  └─ free converters (stats flattening, priority)       │
//! │     ↓ (HostPeerConnection / HostDataChannel)           │
//! │  host::rtc (webrtc-rs RTCPeerConnection)               │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use peerlink_connector::{ConnectionConfig, PeerConnectionConnector};
//! use peerlink_webrtc::PeerConnectionAdapter;
//!
//! # tokio_test::block_on(async {
//! let config = ConnectionConfig::default();
//! config.validate()?;
//!
//! let peer = PeerConnectionAdapter::new(&config).await?;
//! let channel = peer.create_data_channel("control").await?;
//! assert_eq!(channel.label(), "control");
//! # Ok::<(), peerlink_connector::Error>(())
//! # });
//! ```

#![warn(clippy::all)]

mod callbacks;

pub mod channels;
pub mod host;
pub mod peer;

pub use channels::DataChannelAdapter;
pub use host::rtc::{RtcDataChannel, RtcPeerConnection, RtcSender, RtcTransceiver};
pub use host::{NativePriority, RawStatsReport};
pub use peer::{flatten_stats_report, native_priority, PeerConnectionAdapter};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
