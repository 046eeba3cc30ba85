//! Send priority mapping and encoding hint application

use crate::host::{NativePriority, SendParameters};
use peerlink_connector::{EncodingHints, SendPriority};

/// Map a platform priority onto the engine's priority vocabulary
///
/// Anything other than `Low` or `High` maps to `Medium`.
pub fn native_priority(priority: SendPriority) -> NativePriority {
    match priority {
        SendPriority::Low => NativePriority::Low,
        SendPriority::High => NativePriority::High,
        _ => NativePriority::Medium,
    }
}

/// Overwrite every encoding layer with `hints`
pub(crate) fn apply_hints(parameters: &mut SendParameters, hints: &EncodingHints) {
    let priority = native_priority(hints.priority);
    for layer in &mut parameters.encodings {
        layer.scale_resolution_down_by = Some(hints.scale_resolution_down_by);
        layer.max_framerate = Some(hints.max_framerate);
        layer.max_bitrate = Some(hints.max_bitrate);
        layer.priority = Some(priority);
    }
}
