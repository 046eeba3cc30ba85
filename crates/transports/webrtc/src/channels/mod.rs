//! Data channel adapter
//!
//! # Example
//!
//! ```ignore
//! use peerlink_connector::{callback, ChannelPayload, DataChannelConnector};
//!
//! let channel = peer.create_data_channel("control").await?;
//!
//! channel.set_on_message(Some(callback(|event| {
//!     println!("Received: {:?}", event.data);
//! })));
//!
//! channel.send(ChannelPayload::from("hello")).await?;
//! ```

mod data_channel;

pub use data_channel::DataChannelAdapter;
