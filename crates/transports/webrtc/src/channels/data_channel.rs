//! Data channel adapter
//!
//! Wraps one host data channel behind [`DataChannelConnector`]. Queries
//! pass straight through to the host; the adapter only keeps the three
//! callback slots.

use crate::callbacks::CallbackSlot;
use crate::host::rtc::RtcDataChannel;
use crate::host::{ChannelEvent, HostDataChannel};
use async_trait::async_trait;
use peerlink_connector::{
    Callback, ChannelPayload, DataChannelConnector, DataChannelState, MessageEvent, Result,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Callback slots of one data channel
struct ChannelSlots {
    buffered_amount_low: CallbackSlot<()>,
    close: CallbackSlot<()>,
    message: CallbackSlot<MessageEvent>,
}

impl ChannelSlots {
    fn dispatch(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::BufferedAmountLow => {
                self.buffered_amount_low.emit(());
            }
            ChannelEvent::Close => {
                self.close.emit(());
            }
            ChannelEvent::Message(data) => {
                trace!("Data channel message: {} bytes", data.len());
                self.message.emit(MessageEvent { data });
            }
        }
    }
}

/// Adapts one host data channel to [`DataChannelConnector`]
pub struct DataChannelAdapter<C: HostDataChannel = RtcDataChannel> {
    channel: C,
    slots: Arc<ChannelSlots>,
}

impl<C: HostDataChannel> DataChannelAdapter<C> {
    /// Take ownership of `channel` and route its events into this adapter
    ///
    /// Works the same for locally created and incoming channels.
    pub async fn wrap(channel: C) -> Self {
        let slots = Arc::new(ChannelSlots {
            buffered_amount_low: CallbackSlot::new("buffered_amount_low"),
            close: CallbackSlot::new("close"),
            message: CallbackSlot::new("message"),
        });

        let dispatch_slots = Arc::clone(&slots);
        channel
            .set_event_handler(Arc::new(move |event: ChannelEvent| dispatch_slots.dispatch(event)))
            .await;

        debug!("Wrapped data channel '{}'", channel.label());

        Self { channel, slots }
    }

    /// Get the host channel
    pub fn host(&self) -> &C {
        &self.channel
    }
}

impl<C: HostDataChannel> fmt::Debug for DataChannelAdapter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChannelAdapter")
            .field("label", &self.channel.label())
            .field("state", &self.channel.state())
            .finish()
    }
}

#[async_trait]
impl<C: HostDataChannel> DataChannelConnector for DataChannelAdapter<C> {
    fn label(&self) -> &str {
        self.channel.label()
    }

    fn state(&self) -> DataChannelState {
        self.channel.state()
    }

    async fn buffered_amount(&self) -> usize {
        self.channel.buffered_amount().await
    }

    async fn buffered_amount_low_threshold(&self) -> usize {
        self.channel.buffered_amount_low_threshold().await
    }

    async fn set_buffered_amount_low_threshold(&self, threshold: usize) {
        self.channel
            .set_buffered_amount_low_threshold(threshold)
            .await;
    }

    fn set_on_buffered_amount_low(&self, callback: Option<Callback<()>>) {
        self.slots.buffered_amount_low.set(callback);
    }

    fn set_on_close(&self, callback: Option<Callback<()>>) {
        self.slots.close.set(callback);
    }

    fn set_on_message(&self, callback: Option<Callback<MessageEvent>>) {
        self.slots.message.set(callback);
    }

    async fn send(&self, payload: ChannelPayload) -> Result<()> {
        self.channel.send(payload).await
    }

    async fn close(&self) {
        if let Err(e) = self.channel.close().await {
            warn!("Failed to close data channel '{}': {}", self.channel.label(), e);
        }
    }
}
