//! Event payloads and callback aliases

use crate::connector::DataChannelConnector;
use crate::media::ChannelPayload;
use crate::session::HandshakeCandidate;
use crate::state::{ConnectionState, GatheringState, HandshakeState};
use std::fmt;
use std::sync::Arc;

/// A registered event callback
///
/// Slots hold at most one callback; registering replaces the previous one
/// and registering `None` clears it.
pub type Callback<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Wrap a closure as a [`Callback`]
pub fn callback<E, F>(f: F) -> Callback<E>
where
    F: Fn(E) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A local candidate was gathered; `None` marks the end of gathering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEvent {
    pub candidate: Option<HandshakeCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStateChangeEvent {
    pub state: ConnectionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatheringStateChangeEvent {
    pub state: GatheringState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeStateChangeEvent {
    pub state: HandshakeState,
}

/// The remote peer opened a data channel
#[derive(Clone)]
pub struct DataChannelEvent {
    pub channel: Arc<dyn DataChannelConnector>,
}

impl fmt::Debug for DataChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChannelEvent")
            .field("label", &self.channel.label())
            .field("state", &self.channel.state())
            .finish()
    }
}

/// A remote track arrived
#[derive(Debug, Clone)]
pub struct TrackEvent<T, R> {
    pub track: T,
    pub receiver: R,
    /// Ids of the remote streams the track belongs to
    pub stream_ids: Vec<String>,
}

/// A message arrived on a data channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub data: ChannelPayload,
}
