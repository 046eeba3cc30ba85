//! Peer connection adapter

use super::encoding::apply_hints;
use super::stats::deliver;
use crate::callbacks::CallbackSlot;
use crate::channels::DataChannelAdapter;
use crate::host::rtc::RtcPeerConnection;
use crate::host::{
    HostPeerConnection, HostTransceiver, PeerEvent, PeerEventHandler, TransceiverDirection,
};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all, FutureExt};
use peerlink_connector::{
    Callback, CandidateEvent, ConnectionConfig, ConnectionState, ConnectionStateChangeEvent,
    DataChannelConnector, DataChannelEvent, DataChannelMode, EncodingHints, Error,
    GatheringState, GatheringStateChangeEvent, HandshakeCandidate, HandshakeState,
    HandshakeStateChangeEvent, OfferOptions, PeerConnectionConnector, Result, SdpKind,
    SessionDescription, SignalingState, StatsCollector, StreamSenderMap, StreamTracks,
    TrackEvent,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

/// Callback slots of one peer connection
struct PeerSlots<H: HostPeerConnection> {
    candidate: CallbackSlot<CandidateEvent>,
    connection_state_change: CallbackSlot<ConnectionStateChangeEvent>,
    data_channel: CallbackSlot<DataChannelEvent>,
    gathering_state_change: CallbackSlot<GatheringStateChangeEvent>,
    handshake_state_change: CallbackSlot<HandshakeStateChangeEvent>,
    track: CallbackSlot<TrackEvent<H::RemoteTrack, H::Receiver>>,
    /// Renegotiation handler; first writer wins
    negotiation_needed: CallbackSlot<()>,
}

impl<H: HostPeerConnection> PeerSlots<H> {
    fn new() -> Self {
        Self {
            candidate: CallbackSlot::new("candidate"),
            connection_state_change: CallbackSlot::new("connection_state_change"),
            data_channel: CallbackSlot::new("data_channel"),
            gathering_state_change: CallbackSlot::new("gathering_state_change"),
            handshake_state_change: CallbackSlot::new("handshake_state_change"),
            track: CallbackSlot::new("track"),
            negotiation_needed: CallbackSlot::new("negotiation_needed"),
        }
    }

    async fn dispatch(&self, event: PeerEvent<H>) {
        match event {
            PeerEvent::Candidate(candidate) => {
                self.candidate.emit(CandidateEvent { candidate });
            }
            PeerEvent::ConnectionStateChange(state) => {
                debug!("Connection state changed to {}", state);
                self.connection_state_change
                    .emit(ConnectionStateChangeEvent { state });
            }
            PeerEvent::DataChannel(channel) => {
                if !self.data_channel.is_set() {
                    trace!("no data channel callback registered, incoming channel dropped");
                    return;
                }
                let channel = DataChannelAdapter::wrap(channel).await;
                info!("Remote peer opened data channel '{}'", channel.label());
                self.data_channel.emit(DataChannelEvent {
                    channel: Arc::new(channel),
                });
            }
            PeerEvent::GatheringStateChange(state) => {
                self.gathering_state_change
                    .emit(GatheringStateChangeEvent { state });
            }
            PeerEvent::HandshakeStateChange(state) => {
                debug!("Handshake state changed to {}", state);
                self.handshake_state_change
                    .emit(HandshakeStateChangeEvent { state });
            }
            PeerEvent::Track {
                track,
                receiver,
                stream_ids,
            } => {
                self.track.emit(TrackEvent {
                    track,
                    receiver,
                    stream_ids,
                });
            }
            PeerEvent::NegotiationNeeded => {
                self.negotiation_needed.emit(());
            }
        }
    }
}

/// Adapts one host peer connection to [`PeerConnectionConnector`]
///
/// The adapter owns its host connection for its whole lifetime. State
/// accessors read the host on every call; the only state kept here is the
/// callback slots.
///
/// # Example
///
/// ```no_run
/// use peerlink_connector::{
///     callback, CandidateEvent, ConnectionConfig, OfferOptions, PeerConnectionConnector,
/// };
/// use peerlink_webrtc::PeerConnectionAdapter;
///
/// # async fn example() -> peerlink_connector::Result<()> {
/// let peer = PeerConnectionAdapter::new(&ConnectionConfig::default()).await?;
///
/// peer.set_on_candidate(Some(callback(|event: CandidateEvent| {
///     println!("local candidate: {:?}", event.candidate);
/// })));
///
/// let offer = peer.create_offer(OfferOptions::default()).await?;
/// println!("offer: {}", offer.sdp);
/// # Ok(())
/// # }
/// ```
pub struct PeerConnectionAdapter<H: HostPeerConnection = RtcPeerConnection> {
    /// Unique identifier for this connection instance
    connection_id: String,

    host: Arc<H>,

    slots: Arc<PeerSlots<H>>,
}

impl PeerConnectionAdapter<RtcPeerConnection> {
    /// Create a webrtc-rs peer connection for `config`
    ///
    /// # Arguments
    ///
    /// * `config` - Handshake (STUN/TURN) servers, handed to the engine in order
    pub async fn new(config: &ConnectionConfig) -> Result<Self> {
        let host = RtcPeerConnection::connect(config).await?;
        Ok(Self::from_host(host))
    }
}

impl<H: HostPeerConnection> PeerConnectionAdapter<H> {
    /// Wrap an existing host connection
    ///
    /// Installs the adapter's event handler on the host; the host must not
    /// be shared with another adapter.
    pub fn from_host(host: H) -> Self {
        let connection_id = uuid::Uuid::new_v4().to_string();
        let slots = Arc::new(PeerSlots::new());

        let dispatch_slots = Arc::clone(&slots);
        let handler: PeerEventHandler<H> = Arc::new(move |event: PeerEvent<H>| {
            let slots = Arc::clone(&dispatch_slots);
            async move { slots.dispatch(event).await }.boxed()
        });
        host.set_event_handler(handler);

        info!("Created peer connection adapter: connection_id={}", connection_id);

        Self {
            connection_id,
            host: Arc::new(host),
            slots,
        }
    }

    /// Get the connection ID
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Get the host connection
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Create a local data channel with an explicit delivery mode
    #[instrument(skip(self), fields(connection_id = %self.connection_id))]
    pub async fn create_data_channel_with_mode(
        &self,
        label: &str,
        mode: DataChannelMode,
    ) -> Result<Arc<dyn DataChannelConnector>> {
        let channel = self.host.create_data_channel(label, mode).await?;
        let channel = DataChannelAdapter::wrap(channel).await;

        debug!("Created data channel '{}' ({:?})", label, mode);

        Ok(Arc::new(channel))
    }
}

impl<H: HostPeerConnection> fmt::Debug for PeerConnectionAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnectionAdapter")
            .field("connection_id", &self.connection_id)
            .field("connection_state", &self.host.connection_state())
            .field("signaling_state", &self.host.signaling_state())
            .finish()
    }
}

#[async_trait]
impl<H: HostPeerConnection> PeerConnectionConnector for PeerConnectionAdapter<H> {
    type LocalTrack = H::LocalTrack;
    type RemoteTrack = H::RemoteTrack;
    type Sender = H::Sender;
    type Receiver = H::Receiver;

    async fn can_add_candidates(&self) -> bool {
        self.host.has_remote_description().await
    }

    fn can_restart_handshake(&self) -> bool {
        self.host.supports_handshake_restart()
    }

    fn connection_state(&self) -> ConnectionState {
        self.host.connection_state()
    }

    fn gathering_state(&self) -> GatheringState {
        self.host.gathering_state()
    }

    fn handshake_state(&self) -> HandshakeState {
        self.host.handshake_state()
    }

    fn signaling_state(&self) -> SignalingState {
        self.host.signaling_state()
    }

    fn set_on_candidate(&self, callback: Option<Callback<CandidateEvent>>) {
        self.slots.candidate.set(callback);
    }

    fn set_on_connection_state_change(&self, callback: Option<Callback<ConnectionStateChangeEvent>>) {
        self.slots.connection_state_change.set(callback);
    }

    fn set_on_data_channel(&self, callback: Option<Callback<DataChannelEvent>>) {
        self.slots.data_channel.set(callback);
    }

    fn set_on_gathering_state_change(&self, callback: Option<Callback<GatheringStateChangeEvent>>) {
        self.slots.gathering_state_change.set(callback);
    }

    fn set_on_handshake_state_change(&self, callback: Option<Callback<HandshakeStateChangeEvent>>) {
        self.slots.handshake_state_change.set(callback);
    }

    fn set_on_track(
        &self,
        callback: Option<Callback<TrackEvent<Self::RemoteTrack, Self::Receiver>>>,
    ) {
        self.slots.track.set(callback);
    }

    async fn add_candidate(&self, candidate: HandshakeCandidate) -> Result<()> {
        debug!("Adding remote candidate: {}", candidate.candidate);
        self.host.add_candidate(candidate).await
    }

    async fn add_track(&self, track: Self::LocalTrack, stream_id: &str) -> Result<Self::Sender> {
        let sender = self.host.add_track(track, stream_id).await?;
        debug!("Track added to stream {}", stream_id);
        Ok(sender)
    }

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()> {
        self.host.remove_track(sender).await
    }

    async fn replace_track(&self, track: Self::LocalTrack, sender: &Self::Sender) -> Result<()> {
        self.host.replace_track(sender, track).await?;

        // Every transceiver carrying this sender goes back to send-receive,
        // whatever direction it had
        for transceiver in self.host.transceivers().await {
            if transceiver.sender().await == *sender {
                transceiver
                    .set_direction(TransceiverDirection::SendRecv)
                    .await;
            }
        }

        Ok(())
    }

    #[instrument(skip(self), fields(connection_id = %self.connection_id))]
    async fn create_offer(&self, options: OfferOptions) -> Result<SessionDescription> {
        let offer = self.host.create_offer(options.handshake_restart).await?;
        let committed = self.host.set_local_description(offer).await?;

        debug!("Created SDP offer");

        Ok(committed)
    }

    #[instrument(skip(self, offer), fields(connection_id = %self.connection_id))]
    async fn create_answer(&self, offer: SessionDescription) -> Result<SessionDescription> {
        if offer.kind != SdpKind::Offer {
            warn!("create_answer called with a {:?} description", offer.kind);
        }

        self.host.set_remote_description(offer).await?;
        let answer = self.host.create_answer().await?;
        let committed = self.host.set_local_description(answer).await?;

        debug!("Created SDP answer");

        Ok(committed)
    }

    #[instrument(skip(self, answer, negotiation_handler), fields(connection_id = %self.connection_id))]
    async fn handle_answer(
        &self,
        answer: SessionDescription,
        negotiation_handler: Callback<()>,
    ) -> Result<()> {
        self.host.set_remote_description(answer).await?;

        if !self.slots.negotiation_needed.set_if_vacant(negotiation_handler) {
            trace!("Renegotiation handler already registered, keeping it");
        }

        debug!("Remote answer applied");

        Ok(())
    }

    #[instrument(skip(self), fields(connection_id = %self.connection_id))]
    async fn restart_handshake(&self) -> Result<()> {
        self.host.restart_handshake().await
    }

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannelConnector>> {
        self.create_data_channel_with_mode(label, DataChannelMode::Reliable)
            .await
    }

    async fn set_encoding_parameters(&self, sender: &Self::Sender, hints: EncodingHints) {
        let Some(mut parameters) = self.host.send_parameters(sender).await else {
            trace!("Sender has no parameters, encoding hints ignored");
            return;
        };

        apply_hints(&mut parameters, &hints);

        // Encoding hints are best effort: the commit runs detached and a
        // rejection is only logged
        let host = Arc::clone(&self.host);
        let sender = sender.clone();
        let connection_id = self.connection_id.clone();
        tokio::spawn(async move {
            if let Err(e) = host.commit_send_parameters(&sender, parameters).await {
                debug!(
                    "Encoding parameters not applied for connection {}: {}",
                    connection_id, e
                );
            }
        });
    }

    async fn collect_receivers_stats(
        &self,
        receivers: StreamTracks<Self::RemoteTrack>,
        collector: &mut StatsCollector<'_>,
    ) -> Result<()> {
        let host = &self.host;
        let results = join_all(receivers.into_iter().map(|(stream_id, tracks)| async move {
            let reports =
                try_join_all(tracks.iter().map(|track| host.receiver_stats(track))).await?;
            Ok::<_, Error>((stream_id, reports))
        }))
        .await;

        // Results keep input order; delivery stops at the first failed stream
        for result in results {
            let (stream_id, reports) = result?;
            deliver(collector, &stream_id, reports);
        }

        Ok(())
    }

    async fn collect_senders_stats(
        &self,
        senders: StreamSenderMap<Self::LocalTrack, Self::Sender>,
        collector: &mut StatsCollector<'_>,
    ) -> Result<()> {
        let host = &self.host;
        let results = join_all(senders.into_iter().map(|(stream_id, stream)| async move {
            let reports = try_join_all(
                stream
                    .pairs()
                    .map(|pair| host.sender_stats(&pair.track, &pair.sender)),
            )
            .await?;
            Ok::<_, Error>((stream_id, reports))
        }))
        .await;

        for result in results {
            let (stream_id, reports) = result?;
            deliver(collector, &stream_id, reports);
        }

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        info!("Closing peer connection {}", self.connection_id);
        self.host.close().await
    }
}
