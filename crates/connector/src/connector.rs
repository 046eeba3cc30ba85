//! Connector contracts
//!
//! The platform core negotiates and operates a peer link only through
//! these two traits. Transport crates implement them over a concrete
//! peer-connection engine.
//!
//! # Example
//!
//! ```ignore
//! use peerlink_connector::{callback, OfferOptions, PeerConnectionConnector};
//!
//! async fn offer<C: PeerConnectionConnector>(peer: &C) -> peerlink_connector::Result<()> {
//!     peer.set_on_candidate(Some(callback(|event| {
//!         // forward event.candidate over signaling
//!     })));
//!
//!     let offer = peer.create_offer(OfferOptions::default()).await?;
//!     // send offer.sdp, wait for the answer
//!     Ok(())
//! }
//! ```

use crate::events::{
    Callback, CandidateEvent, ConnectionStateChangeEvent, DataChannelEvent,
    GatheringStateChangeEvent, HandshakeStateChangeEvent, MessageEvent, TrackEvent,
};
use crate::media::{ChannelPayload, EncodingHints, StreamSenderMap, StreamTracks};
use crate::session::{HandshakeCandidate, OfferOptions, SessionDescription};
use crate::state::{
    ConnectionState, DataChannelState, GatheringState, HandshakeState, SignalingState,
};
use crate::stats::StatsCollector;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One peer link
///
/// State accessors read the engine on every call; nothing is cached.
///
/// # Thread Safety
///
/// Implementations must be Send + Sync so a connector can be shared
/// between the signaling task and media tasks.
#[async_trait]
pub trait PeerConnectionConnector: Send + Sync {
    /// Local media track accepted by `add_track`
    type LocalTrack: Clone + Send + Sync + 'static;
    /// Remote media track delivered by track events
    type RemoteTrack: Clone + Send + Sync + 'static;
    /// Opaque sender handle; identity is the engine's
    type Sender: Clone + Send + Sync + 'static;
    /// Receiver delivered alongside remote tracks
    type Receiver: Clone + Send + Sync + 'static;

    /// True once a remote description has been committed
    async fn can_add_candidates(&self) -> bool;

    /// True if the engine can restart the handshake
    fn can_restart_handshake(&self) -> bool;

    fn connection_state(&self) -> ConnectionState;

    fn gathering_state(&self) -> GatheringState;

    fn handshake_state(&self) -> HandshakeState;

    fn signaling_state(&self) -> SignalingState;

    fn set_on_candidate(&self, callback: Option<Callback<CandidateEvent>>);

    fn set_on_connection_state_change(&self, callback: Option<Callback<ConnectionStateChangeEvent>>);

    /// Incoming channels are delivered already wrapped as connectors
    fn set_on_data_channel(&self, callback: Option<Callback<DataChannelEvent>>);

    fn set_on_gathering_state_change(&self, callback: Option<Callback<GatheringStateChangeEvent>>);

    fn set_on_handshake_state_change(&self, callback: Option<Callback<HandshakeStateChangeEvent>>);

    fn set_on_track(
        &self,
        callback: Option<Callback<TrackEvent<Self::RemoteTrack, Self::Receiver>>>,
    );

    /// Submit a remote handshake candidate
    ///
    /// # Errors
    ///
    /// The engine's rejection, e.g. a malformed candidate or one submitted
    /// before a remote description exists.
    async fn add_candidate(&self, candidate: HandshakeCandidate) -> Result<()>;

    /// Attach a local track within the given stream
    async fn add_track(&self, track: Self::LocalTrack, stream_id: &str) -> Result<Self::Sender>;

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()>;

    /// Swap the track on `sender`
    ///
    /// After a successful swap every transceiver owning `sender` is set
    /// to send-receive, whatever its previous direction.
    async fn replace_track(&self, track: Self::LocalTrack, sender: &Self::Sender) -> Result<()>;

    /// Generate an offer and commit it as the local description
    ///
    /// The returned description is the committed one.
    async fn create_offer(&self, options: OfferOptions) -> Result<SessionDescription>;

    /// Commit `offer` as remote description, then generate and commit an
    /// answer
    ///
    /// # Errors
    ///
    /// The first failing step aborts the sequence; when the remote commit
    /// fails no answer is generated and no local description is set.
    async fn create_answer(&self, offer: SessionDescription) -> Result<SessionDescription>;

    /// Commit a received answer as the remote description
    ///
    /// `negotiation_handler` becomes the renegotiation-needed callback only
    /// if none is registered yet; later handlers are ignored.
    async fn handle_answer(
        &self,
        answer: SessionDescription,
        negotiation_handler: Callback<()>,
    ) -> Result<()>;

    /// Request a handshake (ICE) restart
    ///
    /// Check [`can_restart_handshake`](Self::can_restart_handshake) first.
    async fn restart_handshake(&self) -> Result<()>;

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannelConnector>>;

    /// Apply encoding hints to every layer of `sender`
    ///
    /// Best effort: a sender without parameters is left alone and commit
    /// failures are never reported.
    async fn set_encoding_parameters(&self, sender: &Self::Sender, hints: EncodingHints);

    /// Fetch stats for remote tracks, grouped per stream
    ///
    /// `collector` runs once per stream that produced at least one
    /// non-empty report, in input order.
    async fn collect_receivers_stats(
        &self,
        receivers: StreamTracks<Self::RemoteTrack>,
        collector: &mut StatsCollector<'_>,
    ) -> Result<()>;

    /// Fetch stats for local senders, grouped per stream
    ///
    /// Same delivery rules as
    /// [`collect_receivers_stats`](Self::collect_receivers_stats).
    async fn collect_senders_stats(
        &self,
        senders: StreamSenderMap<Self::LocalTrack, Self::Sender>,
        collector: &mut StatsCollector<'_>,
    ) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// One data channel
///
/// Object safe; peer connectors hand channels out as
/// `Arc<dyn DataChannelConnector>`.
#[async_trait]
pub trait DataChannelConnector: Send + Sync {
    fn label(&self) -> &str;

    fn state(&self) -> DataChannelState;

    /// Outbound bytes queued but not yet sent
    async fn buffered_amount(&self) -> usize;

    async fn buffered_amount_low_threshold(&self) -> usize;

    /// Replace the threshold below which buffered-amount-low fires
    async fn set_buffered_amount_low_threshold(&self, threshold: usize);

    fn set_on_buffered_amount_low(&self, callback: Option<Callback<()>>);

    fn set_on_close(&self, callback: Option<Callback<()>>);

    fn set_on_message(&self, callback: Option<Callback<MessageEvent>>);

    /// Forward a payload to the engine as is
    async fn send(&self, payload: ChannelPayload) -> Result<()>;

    /// Close the channel; in-flight sends are not guaranteed delivery
    async fn close(&self);
}
