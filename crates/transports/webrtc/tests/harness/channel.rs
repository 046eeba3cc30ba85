//! Scripted in-memory data channel

use async_trait::async_trait;
use parking_lot::Mutex;
use peerlink_connector::{ChannelPayload, DataChannelState, Error, Result};
use peerlink_webrtc::host::{ChannelEvent, ChannelEventHandler, HostDataChannel};
use std::collections::HashSet;
use std::sync::Arc;

use super::HarnessError;

struct ChannelInner {
    label: String,
    state: Mutex<DataChannelState>,
    buffered_amount: Mutex<usize>,
    threshold: Mutex<usize>,
    handler: Mutex<Option<ChannelEventHandler>>,
    sent: Mutex<Vec<ChannelPayload>>,
    failures: Mutex<HashSet<&'static str>>,
    close_calls: Mutex<usize>,
}

/// Data channel handle; clones share state
#[derive(Clone)]
pub struct MockDataChannel {
    inner: Arc<ChannelInner>,
}

impl MockDataChannel {
    pub fn new(label: &str) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                label: label.to_string(),
                state: Mutex::new(DataChannelState::Connecting),
                buffered_amount: Mutex::new(0),
                threshold: Mutex::new(0),
                handler: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
                failures: Mutex::new(HashSet::new()),
                close_calls: Mutex::new(0),
            }),
        }
    }

    pub fn set_state(&self, state: DataChannelState) {
        *self.inner.state.lock() = state;
    }

    pub fn set_buffered_amount(&self, amount: usize) {
        *self.inner.buffered_amount.lock() = amount;
    }

    pub fn threshold(&self) -> usize {
        *self.inner.threshold.lock()
    }

    pub fn sent(&self) -> Vec<ChannelPayload> {
        self.inner.sent.lock().clone()
    }

    pub fn close_calls(&self) -> usize {
        *self.inner.close_calls.lock()
    }

    pub fn has_handler(&self) -> bool {
        self.inner.handler.lock().is_some()
    }

    /// Make the named operation ("send" or "close") fail from now on
    pub fn fail(&self, operation: &'static str) {
        self.inner.failures.lock().insert(operation);
    }

    /// Deliver an event to the installed handler
    pub fn fire(&self, event: ChannelEvent) {
        let handler = self.inner.handler.lock().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.inner.failures.lock().contains(operation) {
            return Err(Error::host(HarnessError::Scripted(operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl HostDataChannel for MockDataChannel {
    fn label(&self) -> &str {
        &self.inner.label
    }

    fn state(&self) -> DataChannelState {
        *self.inner.state.lock()
    }

    async fn buffered_amount(&self) -> usize {
        *self.inner.buffered_amount.lock()
    }

    async fn buffered_amount_low_threshold(&self) -> usize {
        *self.inner.threshold.lock()
    }

    async fn set_buffered_amount_low_threshold(&self, threshold: usize) {
        *self.inner.threshold.lock() = threshold;
    }

    async fn set_event_handler(&self, handler: ChannelEventHandler) {
        *self.inner.handler.lock() = Some(handler);
    }

    async fn send(&self, payload: ChannelPayload) -> Result<()> {
        self.check("send")?;
        self.inner.sent.lock().push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.inner.close_calls.lock() += 1;
        self.check("close")?;
        *self.inner.state.lock() = DataChannelState::Closed;
        Ok(())
    }
}
