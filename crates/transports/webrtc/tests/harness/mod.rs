//! Adapter Test Harness
//!
//! Provides a scripted in-memory host for integration testing of the
//! adapters without a network:
//! - Records every host call in order
//! - Fails named operations on demand
//! - Fires host events by hand
//! - Holds transceivers, stats and send parameters set up by the test
//!
//! Basic usage pattern:
//!
//! 1. Create a `MockPeerConnection` and script it (`fail`, `set_stats`, ...)
//! 2. Wrap it with `PeerConnectionAdapter::from_host`
//! 3. Drive the adapter and fire events with `peer.host().fire(..)`
//! 4. Assert on `calls()` and on what the callbacks saw

#![allow(dead_code)]

pub mod channel;

use async_trait::async_trait;
use parking_lot::Mutex;
use peerlink_connector::{
    ConnectionState, DataChannelMode, Error, GatheringState, HandshakeCandidate, HandshakeState,
    Result, SdpKind, SessionDescription, SignalingState,
};
use peerlink_webrtc::host::{
    HostPeerConnection, HostTransceiver, PeerEvent, PeerEventHandler, RawStatsReport,
    SendParameters, TransceiverDirection,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub use channel::MockDataChannel;

/// Error type for scripted host failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    #[error("Scripted failure: {0}")]
    Scripted(&'static str),

    #[error("No remote description")]
    NoRemoteDescription,

    #[error("Unknown sender: {0}")]
    UnknownSender(u32),
}

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `condition` until it holds or one second passes
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Media track stand-in, local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTrack {
    pub id: String,
    pub stream_id: String,
}

impl MockTrack {
    pub fn new(id: &str, stream_id: &str) -> Self {
        Self {
            id: id.to_string(),
            stream_id: stream_id.to_string(),
        }
    }
}

/// Sender handle; identity is the number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockSender(pub u32);

/// Receiver stand-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReceiver(pub String);

/// Transceiver sharing its direction with the host's list
#[derive(Debug, Clone)]
pub struct MockTransceiver {
    sender: MockSender,
    direction: Arc<Mutex<TransceiverDirection>>,
}

impl MockTransceiver {
    pub fn new(sender: MockSender, direction: TransceiverDirection) -> Self {
        Self {
            sender,
            direction: Arc::new(Mutex::new(direction)),
        }
    }
}

#[async_trait]
impl HostTransceiver for MockTransceiver {
    type Sender = MockSender;

    async fn sender(&self) -> MockSender {
        self.sender
    }

    fn direction(&self) -> TransceiverDirection {
        *self.direction.lock()
    }

    async fn set_direction(&self, direction: TransceiverDirection) {
        *self.direction.lock() = direction;
    }
}

struct Negotiation {
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    signaling: SignalingState,
}

/// Scripted in-memory peer connection
pub struct MockPeerConnection {
    handler: Mutex<Option<PeerEventHandler<MockPeerConnection>>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashSet<&'static str>>,
    negotiation: Mutex<Negotiation>,
    connection_state: Mutex<ConnectionState>,
    next_sender: Mutex<u32>,
    transceivers: Mutex<Vec<MockTransceiver>>,
    stats: Mutex<HashMap<String, RawStatsReport>>,
    send_parameters: Mutex<HashMap<MockSender, SendParameters>>,
    committed: Mutex<Vec<(MockSender, SendParameters)>>,
    channels: Mutex<Vec<(MockDataChannel, DataChannelMode)>>,
}

impl MockPeerConnection {
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            negotiation: Mutex::new(Negotiation {
                local: None,
                remote: None,
                signaling: SignalingState::Stable,
            }),
            connection_state: Mutex::new(ConnectionState::New),
            next_sender: Mutex::new(1),
            transceivers: Mutex::new(Vec::new()),
            stats: Mutex::new(HashMap::new()),
            send_parameters: Mutex::new(HashMap::new()),
            committed: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
        }
    }

    /// Make the named operation fail from now on
    pub fn fail(&self, operation: &'static str) {
        self.failures.lock().insert(operation);
    }

    /// Host calls so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.negotiation.lock().local.clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.negotiation.lock().remote.clone()
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        *self.connection_state.lock() = state;
    }

    /// Stats returned for the track with id `track_id`
    pub fn set_stats(&self, track_id: &str, report: RawStatsReport) {
        self.stats.lock().insert(track_id.to_string(), report);
    }

    pub fn set_send_parameters(&self, sender: MockSender, parameters: SendParameters) {
        self.send_parameters.lock().insert(sender, parameters);
    }

    pub fn committed(&self) -> Vec<(MockSender, SendParameters)> {
        self.committed.lock().clone()
    }

    pub fn add_transceiver(&self, sender: MockSender, direction: TransceiverDirection) {
        self.transceivers
            .lock()
            .push(MockTransceiver::new(sender, direction));
    }

    /// Directions of all transceivers carrying `sender`
    pub fn directions_of(&self, sender: MockSender) -> Vec<TransceiverDirection> {
        self.transceivers
            .lock()
            .iter()
            .filter(|transceiver| transceiver.sender == sender)
            .map(|transceiver| transceiver.direction())
            .collect()
    }

    pub fn channels(&self) -> Vec<(MockDataChannel, DataChannelMode)> {
        self.channels.lock().clone()
    }

    /// Deliver an event to the installed handler
    pub async fn fire(&self, event: PeerEvent<MockPeerConnection>) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(event).await;
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        self.record(operation);
        if self.failures.lock().contains(operation) {
            return Err(Error::host(HarnessError::Scripted(operation)));
        }
        Ok(())
    }

    fn signaling_after(kind: SdpKind, local: bool) -> SignalingState {
        match (kind, local) {
            (SdpKind::Offer, true) => SignalingState::HaveLocalOffer,
            (SdpKind::Offer, false) => SignalingState::HaveRemoteOffer,
            (SdpKind::Pranswer, true) => SignalingState::HaveLocalPranswer,
            (SdpKind::Pranswer, false) => SignalingState::HaveRemotePranswer,
            _ => SignalingState::Stable,
        }
    }
}

impl Default for MockPeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostPeerConnection for MockPeerConnection {
    type LocalTrack = MockTrack;
    type RemoteTrack = MockTrack;
    type Sender = MockSender;
    type Receiver = MockReceiver;
    type Transceiver = MockTransceiver;
    type DataChannel = MockDataChannel;

    fn set_event_handler(&self, handler: PeerEventHandler<Self>) {
        *self.handler.lock() = Some(handler);
    }

    async fn has_remote_description(&self) -> bool {
        self.negotiation.lock().remote.is_some()
    }

    fn supports_handshake_restart(&self) -> bool {
        true
    }

    fn connection_state(&self) -> ConnectionState {
        *self.connection_state.lock()
    }

    fn gathering_state(&self) -> GatheringState {
        GatheringState::New
    }

    fn handshake_state(&self) -> HandshakeState {
        HandshakeState::New
    }

    fn signaling_state(&self) -> SignalingState {
        self.negotiation.lock().signaling
    }

    async fn add_candidate(&self, _candidate: HandshakeCandidate) -> Result<()> {
        self.check("add_candidate")?;
        if self.negotiation.lock().remote.is_none() {
            return Err(Error::host(HarnessError::NoRemoteDescription));
        }
        Ok(())
    }

    async fn add_track(&self, _track: MockTrack, stream_id: &str) -> Result<MockSender> {
        self.check("add_track")?;
        let sender = {
            let mut next = self.next_sender.lock();
            let sender = MockSender(*next);
            *next += 1;
            sender
        };
        self.record(format!("add_track:{}", stream_id));
        self.add_transceiver(sender, TransceiverDirection::SendRecv);
        Ok(sender)
    }

    async fn remove_track(&self, sender: &MockSender) -> Result<()> {
        self.check("remove_track")?;
        let mut transceivers = self.transceivers.lock();
        let before = transceivers.len();
        transceivers.retain(|transceiver| transceiver.sender != *sender);
        if transceivers.len() == before {
            return Err(Error::host(HarnessError::UnknownSender(sender.0)));
        }
        Ok(())
    }

    async fn replace_track(&self, _sender: &MockSender, _track: MockTrack) -> Result<()> {
        self.check("replace_track")
    }

    async fn transceivers(&self) -> Vec<MockTransceiver> {
        self.transceivers.lock().clone()
    }

    async fn create_offer(&self, handshake_restart: bool) -> Result<SessionDescription> {
        self.check("create_offer")?;
        let sdp = if handshake_restart {
            "v=0 mock-offer ice-restart"
        } else {
            "v=0 mock-offer"
        };
        Ok(SessionDescription::offer(sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.check("create_answer")?;
        Ok(SessionDescription::answer("v=0 mock-answer"))
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<SessionDescription> {
        self.check("set_local_description")?;
        let mut negotiation = self.negotiation.lock();
        negotiation.signaling = Self::signaling_after(description.kind, true);
        negotiation.local = Some(description.clone());
        Ok(description)
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.check("set_remote_description")?;
        let mut negotiation = self.negotiation.lock();
        negotiation.signaling = Self::signaling_after(description.kind, false);
        negotiation.remote = Some(description);
        Ok(())
    }

    async fn restart_handshake(&self) -> Result<()> {
        self.check("restart_handshake")
    }

    async fn create_data_channel(
        &self,
        label: &str,
        mode: DataChannelMode,
    ) -> Result<MockDataChannel> {
        self.check("create_data_channel")?;
        let channel = MockDataChannel::new(label);
        self.channels.lock().push((channel.clone(), mode));
        Ok(channel)
    }

    async fn send_parameters(&self, sender: &MockSender) -> Option<SendParameters> {
        self.record("send_parameters");
        self.send_parameters.lock().get(sender).cloned()
    }

    async fn commit_send_parameters(
        &self,
        sender: &MockSender,
        parameters: SendParameters,
    ) -> Result<()> {
        self.check("commit_send_parameters")?;
        self.committed.lock().push((*sender, parameters));
        Ok(())
    }

    async fn receiver_stats(&self, track: &MockTrack) -> Result<RawStatsReport> {
        self.check("receiver_stats")?;
        Ok(self.stats.lock().get(&track.id).cloned().unwrap_or_default())
    }

    async fn sender_stats(&self, track: &MockTrack, _sender: &MockSender) -> Result<RawStatsReport> {
        self.check("sender_stats")?;
        Ok(self.stats.lock().get(&track.id).cloned().unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        self.check("close")?;
        *self.connection_state.lock() = ConnectionState::Closed;
        self.negotiation.lock().signaling = SignalingState::Closed;
        Ok(())
    }
}

/// One stats report with a single entry per id
pub fn stats_report(ids: &[&str]) -> RawStatsReport {
    ids.iter()
        .map(|id| (id.to_string(), serde_json::json!({ "id": id, "type": "inbound-rtp" })))
        .collect()
}
