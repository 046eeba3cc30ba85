//! Peer connection adapter and its free converters

mod connection;
mod encoding;
mod stats;

pub use connection::PeerConnectionAdapter;
pub use encoding::native_priority;
pub use stats::flatten_stats_report;
