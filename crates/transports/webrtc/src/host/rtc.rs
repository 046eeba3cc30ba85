//! webrtc-rs host
//!
//! [`RtcPeerConnection`] owns one `RTCPeerConnection`; [`RtcDataChannel`],
//! [`RtcTransceiver`] and [`RtcSender`] are thin handles over the engine's
//! own `Arc`s. Engine errors are wrapped with [`Error::host`] unchanged.

use super::{
    ChannelEvent, ChannelEventHandler, EncodingLayer, HostDataChannel, HostPeerConnection,
    HostTransceiver, PeerEvent, PeerEventHandler, RawStatsReport, SendParameters,
    TransceiverDirection,
};
use async_trait::async_trait;
use futures::FutureExt;
use peerlink_connector::{
    ChannelPayload, ConnectionConfig, ConnectionState, DataChannelMode, DataChannelState, Error,
    GatheringState, HandshakeCandidate, HandshakeState, Result, SdpKind, SessionDescription,
    SignalingState,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_gathering_state::RTCIceGatheringState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Failures raised by this host rather than by the engine
#[derive(Debug, thiserror::Error)]
pub enum RtcError {
    #[error("engine holds no local description after commit")]
    DescriptionNotCommitted,

    #[error("session description has no type")]
    UnspecifiedSdpType,
}

/// Handshake servers in configuration order, one entry per server
pub fn ice_servers(config: &ConnectionConfig) -> Vec<RTCIceServer> {
    config
        .servers
        .iter()
        .map(|server| {
            #[allow(clippy::needless_update)]
            RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            }
        })
        .collect()
}

/// webrtc-rs peer connection
pub struct RtcPeerConnection {
    inner: Arc<RTCPeerConnection>,
}

impl RtcPeerConnection {
    /// Build an engine connection for `config`
    ///
    /// The server list is passed through as is; call
    /// [`ConnectionConfig::validate`] beforehand to reject bad entries early.
    #[instrument(skip(config), fields(servers = config.servers.len()))]
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(Error::host)?;

        let interceptor_registry =
            register_default_interceptors(Default::default(), &mut media_engine)
                .map_err(Error::host)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers(config),
            ..Default::default()
        };

        let inner = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(Error::host)?,
        );

        info!("Created webrtc-rs peer connection");

        Ok(Self { inner })
    }

    /// Wrap an engine connection built elsewhere
    pub fn from_peer_connection(inner: Arc<RTCPeerConnection>) -> Self {
        Self { inner }
    }

    /// The underlying engine connection
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.inner
    }

    async fn track_stats(&self, track_id: &str) -> Result<RawStatsReport> {
        let report = self.inner.get_stats().await;
        let mut all = RawStatsReport::with_capacity(report.reports.len());
        for (id, stats) in report.reports {
            all.insert(id, serde_json::to_value(&stats)?);
        }
        Ok(select_track_stats(all, track_id))
    }
}

impl fmt::Debug for RtcPeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcPeerConnection")
            .field("connection_state", &self.inner.connection_state())
            .field("signaling_state", &self.inner.signaling_state())
            .finish()
    }
}

#[async_trait]
impl HostPeerConnection for RtcPeerConnection {
    type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;
    type RemoteTrack = Arc<TrackRemote>;
    type Sender = RtcSender;
    type Receiver = Arc<RTCRtpReceiver>;
    type Transceiver = RtcTransceiver;
    type DataChannel = RtcDataChannel;

    fn set_event_handler(&self, handler: PeerEventHandler<Self>) {
        let on_candidate = Arc::clone(&handler);
        self.inner
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let handler = Arc::clone(&on_candidate);
                Box::pin(async move {
                    let candidate = match candidate.map(|c| c.to_json()).transpose() {
                        Ok(init) => init.map(candidate_from_init),
                        Err(e) => {
                            warn!("Dropping unserializable local candidate: {}", e);
                            return;
                        }
                    };
                    handler(PeerEvent::Candidate(candidate)).await;
                })
            }));

        let on_connection_state = Arc::clone(&handler);
        self.inner
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                on_connection_state(PeerEvent::ConnectionStateChange(connection_state(state)))
            }));

        let on_data_channel = Arc::clone(&handler);
        self.inner
            .on_data_channel(Box::new(move |channel: Arc<RTCDataChannel>| {
                on_data_channel(PeerEvent::DataChannel(RtcDataChannel::new(channel)))
            }));

        let on_gathering_state = Arc::clone(&handler);
        self.inner
            .on_ice_gathering_state_change(Box::new(move |state: RTCIceGathererState| {
                match gatherer_state(state) {
                    Some(state) => on_gathering_state(PeerEvent::GatheringStateChange(state)),
                    None => async {}.boxed(),
                }
            }));

        let on_handshake_state = Arc::clone(&handler);
        self.inner
            .on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
                on_handshake_state(PeerEvent::HandshakeStateChange(handshake_state(state)))
            }));

        let on_track = Arc::clone(&handler);
        self.inner.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let stream_ids = vec![track.stream_id()];
                on_track(PeerEvent::Track {
                    track,
                    receiver,
                    stream_ids,
                })
            },
        ));

        let on_negotiation_needed = handler;
        self.inner.on_negotiation_needed(Box::new(move || {
            on_negotiation_needed(PeerEvent::NegotiationNeeded)
        }));
    }

    async fn has_remote_description(&self) -> bool {
        self.inner.remote_description().await.is_some()
    }

    fn supports_handshake_restart(&self) -> bool {
        true
    }

    fn connection_state(&self) -> ConnectionState {
        connection_state(self.inner.connection_state())
    }

    fn gathering_state(&self) -> GatheringState {
        match self.inner.ice_gathering_state() {
            RTCIceGatheringState::Gathering => GatheringState::Gathering,
            RTCIceGatheringState::Complete => GatheringState::Complete,
            _ => GatheringState::New,
        }
    }

    fn handshake_state(&self) -> HandshakeState {
        handshake_state(self.inner.ice_connection_state())
    }

    fn signaling_state(&self) -> SignalingState {
        match self.inner.signaling_state() {
            RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
            RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
            RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
            RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
            RTCSignalingState::Closed => SignalingState::Closed,
            _ => SignalingState::Stable,
        }
    }

    async fn add_candidate(&self, candidate: HandshakeCandidate) -> Result<()> {
        self.inner
            .add_ice_candidate(candidate_to_init(candidate))
            .await
            .map_err(Error::host)
    }

    async fn add_track(&self, track: Self::LocalTrack, stream_id: &str) -> Result<Self::Sender> {
        // webrtc-rs binds a track to its stream when the track is built
        if track.stream_id() != stream_id {
            warn!(
                "Track {} belongs to stream {}, not {}",
                track.id(),
                track.stream_id(),
                stream_id
            );
        }

        let sender = self.inner.add_track(track).await.map_err(Error::host)?;
        Ok(RtcSender(sender))
    }

    async fn remove_track(&self, sender: &Self::Sender) -> Result<()> {
        self.inner.remove_track(&sender.0).await.map_err(Error::host)
    }

    async fn replace_track(&self, sender: &Self::Sender, track: Self::LocalTrack) -> Result<()> {
        sender
            .0
            .replace_track(Some(track))
            .await
            .map_err(Error::host)
    }

    async fn transceivers(&self) -> Vec<Self::Transceiver> {
        self.inner
            .get_transceivers()
            .await
            .into_iter()
            .map(RtcTransceiver)
            .collect()
    }

    async fn create_offer(&self, handshake_restart: bool) -> Result<SessionDescription> {
        let options = handshake_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });

        let offer = self.inner.create_offer(options).await.map_err(Error::host)?;
        from_rtc_description(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.inner.create_answer(None).await.map_err(Error::host)?;
        from_rtc_description(&answer)
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<SessionDescription> {
        self.inner
            .set_local_description(to_rtc_description(description)?)
            .await
            .map_err(Error::host)?;

        let committed = self
            .inner
            .local_description()
            .await
            .ok_or_else(|| Error::host(RtcError::DescriptionNotCommitted))?;
        from_rtc_description(&committed)
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.inner
            .set_remote_description(to_rtc_description(description)?)
            .await
            .map_err(Error::host)
    }

    async fn restart_handshake(&self) -> Result<()> {
        // webrtc-rs restarts ICE through offer generation; the offer itself
        // is produced again by the next negotiation
        self.inner
            .create_offer(Some(RTCOfferOptions {
                ice_restart: true,
                ..Default::default()
            }))
            .await
            .map_err(Error::host)?;

        debug!("ICE restart requested");
        Ok(())
    }

    async fn create_data_channel(
        &self,
        label: &str,
        mode: DataChannelMode,
    ) -> Result<Self::DataChannel> {
        let init = RTCDataChannelInit {
            ordered: Some(mode.ordered()),
            max_retransmits: mode.max_retransmits(),
            ..Default::default()
        };

        let channel = self
            .inner
            .create_data_channel(label, Some(init))
            .await
            .map_err(Error::host)?;
        Ok(RtcDataChannel::new(channel))
    }

    async fn send_parameters(&self, sender: &Self::Sender) -> Option<SendParameters> {
        // Every webrtc-rs sender has a parameter set, with or without a track
        let parameters = sender.0.get_parameters().await;
        Some(SendParameters {
            encodings: parameters
                .encodings
                .iter()
                .map(|encoding| EncodingLayer {
                    rid: encoding.rid.to_string(),
                    ..Default::default()
                })
                .collect(),
        })
    }

    async fn commit_send_parameters(
        &self,
        _sender: &Self::Sender,
        _parameters: SendParameters,
    ) -> Result<()> {
        Err(Error::Unsupported(
            "webrtc-rs senders do not accept encoding parameter updates".to_string(),
        ))
    }

    async fn receiver_stats(&self, track: &Self::RemoteTrack) -> Result<RawStatsReport> {
        self.track_stats(&track.id()).await
    }

    async fn sender_stats(
        &self,
        track: &Self::LocalTrack,
        _sender: &Self::Sender,
    ) -> Result<RawStatsReport> {
        self.track_stats(track.id()).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await.map_err(Error::host)
    }
}

/// Sender handle; equal when both wrap the same engine sender
#[derive(Clone)]
pub struct RtcSender(pub Arc<RTCRtpSender>);

impl PartialEq for RtcSender {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RtcSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RtcSender")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

/// Transceiver handle
#[derive(Clone)]
pub struct RtcTransceiver(pub Arc<RTCRtpTransceiver>);

#[async_trait]
impl HostTransceiver for RtcTransceiver {
    type Sender = RtcSender;

    async fn sender(&self) -> RtcSender {
        RtcSender(self.0.sender().await)
    }

    fn direction(&self) -> TransceiverDirection {
        match self.0.direction() {
            RTCRtpTransceiverDirection::Sendonly => TransceiverDirection::SendOnly,
            RTCRtpTransceiverDirection::Recvonly => TransceiverDirection::RecvOnly,
            RTCRtpTransceiverDirection::Inactive => TransceiverDirection::Inactive,
            _ => TransceiverDirection::SendRecv,
        }
    }

    async fn set_direction(&self, direction: TransceiverDirection) {
        let direction = match direction {
            TransceiverDirection::SendRecv => RTCRtpTransceiverDirection::Sendrecv,
            TransceiverDirection::SendOnly => RTCRtpTransceiverDirection::Sendonly,
            TransceiverDirection::RecvOnly => RTCRtpTransceiverDirection::Recvonly,
            TransceiverDirection::Inactive => RTCRtpTransceiverDirection::Inactive,
        };
        self.0.set_direction(direction).await;
    }
}

/// webrtc-rs data channel
#[derive(Clone)]
pub struct RtcDataChannel {
    inner: Arc<RTCDataChannel>,
}

impl RtcDataChannel {
    pub fn new(inner: Arc<RTCDataChannel>) -> Self {
        Self { inner }
    }

    /// The underlying engine channel
    pub fn data_channel(&self) -> &Arc<RTCDataChannel> {
        &self.inner
    }
}

#[async_trait]
impl HostDataChannel for RtcDataChannel {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn state(&self) -> DataChannelState {
        match self.inner.ready_state() {
            RTCDataChannelState::Open => DataChannelState::Open,
            RTCDataChannelState::Closing => DataChannelState::Closing,
            RTCDataChannelState::Closed => DataChannelState::Closed,
            _ => DataChannelState::Connecting,
        }
    }

    async fn buffered_amount(&self) -> usize {
        self.inner.buffered_amount().await
    }

    async fn buffered_amount_low_threshold(&self) -> usize {
        self.inner.buffered_amount_low_threshold().await
    }

    async fn set_buffered_amount_low_threshold(&self, threshold: usize) {
        self.inner
            .set_buffered_amount_low_threshold(threshold)
            .await;
    }

    async fn set_event_handler(&self, handler: ChannelEventHandler) {
        let on_message = Arc::clone(&handler);
        self.inner
            .on_message(Box::new(move |message: DataChannelMessage| {
                on_message(ChannelEvent::Message(payload_from_message(message)));
                Box::pin(async {})
            }));

        let on_close = Arc::clone(&handler);
        self.inner.on_close(Box::new(move || {
            on_close(ChannelEvent::Close);
            Box::pin(async {})
        }));

        let on_low = handler;
        self.inner
            .on_buffered_amount_low(Box::new(move || {
                on_low(ChannelEvent::BufferedAmountLow);
                Box::pin(async {})
            }))
            .await;
    }

    async fn send(&self, payload: ChannelPayload) -> Result<()> {
        let sent = match payload {
            ChannelPayload::Text(text) => self.inner.send_text(text).await,
            ChannelPayload::Binary(data) => self.inner.send(&data).await,
        };
        sent.map(|_| ()).map_err(Error::host)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await.map_err(Error::host)
    }
}

fn payload_from_message(message: DataChannelMessage) -> ChannelPayload {
    if message.is_string {
        ChannelPayload::Text(String::from_utf8_lossy(&message.data).into_owned())
    } else {
        ChannelPayload::Binary(message.data)
    }
}

fn connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
        _ => ConnectionState::New,
    }
}

fn handshake_state(state: RTCIceConnectionState) -> HandshakeState {
    match state {
        RTCIceConnectionState::Checking => HandshakeState::Checking,
        RTCIceConnectionState::Connected => HandshakeState::Connected,
        RTCIceConnectionState::Completed => HandshakeState::Completed,
        RTCIceConnectionState::Disconnected => HandshakeState::Disconnected,
        RTCIceConnectionState::Failed => HandshakeState::Failed,
        RTCIceConnectionState::Closed => HandshakeState::Closed,
        _ => HandshakeState::New,
    }
}

/// Gatherer states without a gathering-state counterpart yield `None`
fn gatherer_state(state: RTCIceGathererState) -> Option<GatheringState> {
    match state {
        RTCIceGathererState::New => Some(GatheringState::New),
        RTCIceGathererState::Gathering => Some(GatheringState::Gathering),
        RTCIceGathererState::Complete => Some(GatheringState::Complete),
        _ => None,
    }
}

fn candidate_from_init(init: RTCIceCandidateInit) -> HandshakeCandidate {
    HandshakeCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn candidate_to_init(candidate: HandshakeCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_mline_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_description(description: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match description.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        _ => return Err(Error::host(RtcError::UnspecifiedSdpType)),
    };

    Ok(SessionDescription {
        kind,
        sdp: description.sdp.clone(),
    })
}

fn to_rtc_description(description: SessionDescription) -> Result<RTCSessionDescription> {
    match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp).map_err(Error::host),
        SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp).map_err(Error::host),
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp).map_err(Error::host),
        // No constructor for rollback; the JSON shapes agree
        SdpKind::Rollback => Ok(serde_json::from_value(serde_json::to_value(&description)?)?),
    }
}

/// Reports naming `track_id`, plus those sharing an SSRC with them
pub(crate) fn select_track_stats(all: RawStatsReport, track_id: &str) -> RawStatsReport {
    let names_track = |stats: &Value| {
        stats.get("trackIdentifier").and_then(Value::as_str) == Some(track_id)
    };
    let ssrc = |stats: &Value| stats.get("ssrc").and_then(Value::as_u64);

    let ssrcs: HashSet<u64> = all
        .values()
        .filter(|stats| names_track(stats))
        .filter_map(ssrc)
        .collect();

    all.into_iter()
        .filter(|(_, stats)| {
            names_track(stats) || ssrc(stats).is_some_and(|value| ssrcs.contains(&value))
        })
        .collect::<HashMap<_, _>>()
}
