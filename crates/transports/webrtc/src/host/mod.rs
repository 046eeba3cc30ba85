//! Host engine seam
//!
//! The adapters never talk to a peer-connection engine directly. They go
//! through [`HostPeerConnection`], [`HostDataChannel`] and
//! [`HostTransceiver`], which [`rtc`] implements over webrtc-rs.
//!
//! Hosts report rejections as `Error::Host` carrying the engine's own
//! error; adapters return them untouched.

pub mod rtc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use peerlink_connector::{
    ChannelPayload, ConnectionState, DataChannelMode, DataChannelState, GatheringState,
    HandshakeCandidate, HandshakeState, Result, SessionDescription, SignalingState,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Raw statistics keyed by report id, as produced by the engine
pub type RawStatsReport = HashMap<String, serde_json::Value>;

/// Events raised by a host peer connection
pub enum PeerEvent<H: HostPeerConnection + ?Sized> {
    /// Local candidate; `None` once gathering is finished
    Candidate(Option<HandshakeCandidate>),
    ConnectionStateChange(ConnectionState),
    /// The remote peer opened a data channel
    DataChannel(H::DataChannel),
    GatheringStateChange(GatheringState),
    HandshakeStateChange(HandshakeState),
    Track {
        track: H::RemoteTrack,
        receiver: H::Receiver,
        stream_ids: Vec<String>,
    },
    NegotiationNeeded,
}

/// Handler receiving every event of one host peer connection
pub type PeerEventHandler<H> = Arc<dyn Fn(PeerEvent<H>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Events raised by a host data channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    BufferedAmountLow,
    Close,
    Message(ChannelPayload),
}

/// Handler receiving every event of one host data channel
pub type ChannelEventHandler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// Transceiver direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransceiverDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

/// Priority vocabulary of the engine's encoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativePriority {
    Low,
    Medium,
    High,
}

impl NativePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativePriority::Low => "low",
            NativePriority::Medium => "medium",
            NativePriority::High => "high",
        }
    }
}

/// One encoding layer of a sender
///
/// Tunable fields are `None` when the engine does not report them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodingLayer {
    pub rid: String,
    pub scale_resolution_down_by: Option<f64>,
    pub max_framerate: Option<f64>,
    pub max_bitrate: Option<u64>,
    pub priority: Option<NativePriority>,
}

/// Current send parameters of a sender
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendParameters {
    pub encodings: Vec<EncodingLayer>,
}

/// A peer-connection engine
///
/// State getters must read the engine every time; adapters rely on that
/// to never cache.
#[async_trait]
pub trait HostPeerConnection: Send + Sync + 'static {
    type LocalTrack: Clone + Send + Sync + 'static;
    type RemoteTrack: Clone + Send + Sync + 'static;
    type Sender: Clone + PartialEq + Send + Sync + 'static;
    type Receiver: Clone + Send + Sync + 'static;
    type Transceiver: HostTransceiver<Sender = Self::Sender>;
    type DataChannel: HostDataChannel;

    /// Install the single handler for all connection events
    fn set_event_handler(&self, handler: PeerEventHandler<Self>);

    async fn has_remote_description(&self) -> bool;

    fn supports_handshake_restart(&self) -> bool;

    fn connection_state(&self) -> ConnectionState;

    fn gathering_state(&self) -> GatheringState;

    fn handshake_state(&self) -> HandshakeState;

    fn signaling_state(&self) -> SignalingState;

    async fn add_candidate(&self, candidate: HandshakeCandidate) -> Result<()>;

    async fn add_track(&self, track: Self::LocalTrack, stream_id: &str) -> Result<Self::Sender>;

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()>;

    async fn replace_track(&self, sender: &Self::Sender, track: Self::LocalTrack) -> Result<()>;

    async fn transceivers(&self) -> Vec<Self::Transceiver>;

    async fn create_offer(&self, handshake_restart: bool) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    /// Commit a local description and return it as the engine now holds it
    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn restart_handshake(&self) -> Result<()>;

    async fn create_data_channel(
        &self,
        label: &str,
        mode: DataChannelMode,
    ) -> Result<Self::DataChannel>;

    /// `None` when the sender has no parameter set
    async fn send_parameters(&self, sender: &Self::Sender) -> Option<SendParameters>;

    async fn commit_send_parameters(
        &self,
        sender: &Self::Sender,
        parameters: SendParameters,
    ) -> Result<()>;

    async fn receiver_stats(&self, track: &Self::RemoteTrack) -> Result<RawStatsReport>;

    async fn sender_stats(
        &self,
        track: &Self::LocalTrack,
        sender: &Self::Sender,
    ) -> Result<RawStatsReport>;

    async fn close(&self) -> Result<()>;
}

/// A transceiver of a host peer connection
#[async_trait]
pub trait HostTransceiver: Send + Sync {
    type Sender: PartialEq + Send + Sync;

    async fn sender(&self) -> Self::Sender;

    fn direction(&self) -> TransceiverDirection;

    async fn set_direction(&self, direction: TransceiverDirection);
}

/// A data channel of a host peer connection
#[async_trait]
pub trait HostDataChannel: Send + Sync + 'static {
    fn label(&self) -> &str;

    fn state(&self) -> DataChannelState;

    async fn buffered_amount(&self) -> usize;

    async fn buffered_amount_low_threshold(&self) -> usize;

    async fn set_buffered_amount_low_threshold(&self, threshold: usize);

    /// Install the single handler for all channel events
    async fn set_event_handler(&self, handler: ChannelEventHandler);

    async fn send(&self, payload: ChannelPayload) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
