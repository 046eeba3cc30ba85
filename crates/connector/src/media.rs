//! Media-facing value types: send priority, encoding hints, stream
//! groupings and data channel payloads

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Platform send priority for an encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Encoding hints applied uniformly to every layer of a sender
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingHints {
    /// Factor by which to scale the resolution down (1.0 = unscaled)
    pub scale_resolution_down_by: f64,

    /// Maximum frames per second
    pub max_framerate: f64,

    /// Maximum bitrate in bits per second
    pub max_bitrate: u64,

    /// Send priority
    pub priority: SendPriority,
}

impl Default for EncodingHints {
    fn default() -> Self {
        Self {
            scale_resolution_down_by: 1.0,
            max_framerate: 30.0,
            max_bitrate: 2_500_000,
            priority: SendPriority::Medium,
        }
    }
}

/// A local track paired with the sender carrying it
#[derive(Debug, Clone)]
pub struct TrackSender<T, S> {
    pub track: T,
    pub sender: S,
}

/// Senders published for one stream
#[derive(Debug, Clone)]
pub struct StreamSenders<T, S> {
    pub video: Option<TrackSender<T, S>>,
    pub audio: Option<TrackSender<T, S>>,
}

impl<T, S> Default for StreamSenders<T, S> {
    fn default() -> Self {
        Self {
            video: None,
            audio: None,
        }
    }
}

impl<T, S> StreamSenders<T, S> {
    /// Present pairs, video first
    pub fn pairs(&self) -> impl Iterator<Item = &TrackSender<T, S>> {
        self.video.iter().chain(self.audio.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.audio.is_none()
    }
}

/// Remote tracks grouped by stream id, in caller order
pub type StreamTracks<T> = Vec<(String, Vec<T>)>;

/// Sender pairs grouped by stream id, in caller order
pub type StreamSenderMap<T, S> = Vec<(String, StreamSenders<T, S>)>;

/// A data channel message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPayload {
    /// UTF-8 text message
    Text(String),
    /// Binary message
    Binary(Bytes),
}

impl ChannelPayload {
    /// Payload size in bytes
    pub fn len(&self) -> usize {
        match self {
            ChannelPayload::Text(text) => text.len(),
            ChannelPayload::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for ChannelPayload {
    fn from(text: String) -> Self {
        ChannelPayload::Text(text)
    }
}

impl From<&str> for ChannelPayload {
    fn from(text: &str) -> Self {
        ChannelPayload::Text(text.to_string())
    }
}

impl From<Bytes> for ChannelPayload {
    fn from(data: Bytes) -> Self {
        ChannelPayload::Binary(data)
    }
}

impl From<Vec<u8>> for ChannelPayload {
    fn from(data: Vec<u8>) -> Self {
        ChannelPayload::Binary(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_senders_pairs_video_first() {
        let senders = StreamSenders {
            video: Some(TrackSender {
                track: "video-track",
                sender: 1,
            }),
            audio: Some(TrackSender {
                track: "audio-track",
                sender: 2,
            }),
        };
        let tracks: Vec<&str> = senders.pairs().map(|pair| pair.track).collect();
        assert_eq!(tracks, vec!["video-track", "audio-track"]);
    }

    #[test]
    fn test_stream_senders_audio_only() {
        let senders = StreamSenders {
            video: None,
            audio: Some(TrackSender {
                track: "audio-track",
                sender: 2,
            }),
        };
        assert_eq!(senders.pairs().count(), 1);
        assert!(!senders.is_empty());
        assert!(StreamSenders::<&str, u32>::default().is_empty());
    }

    #[test]
    fn test_priority_serde() {
        assert_eq!(serde_json::to_value(SendPriority::High).unwrap(), "high");
        assert_eq!(SendPriority::default(), SendPriority::Medium);
    }

    #[test]
    fn test_payload_conversions() {
        assert_eq!(ChannelPayload::from("hi"), ChannelPayload::Text("hi".to_string()));
        let binary = ChannelPayload::from(vec![1u8, 2, 3]);
        assert_eq!(binary.len(), 3);
        assert!(!binary.is_empty());
    }
}
