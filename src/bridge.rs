// src/bridge.rs
//
// Transport bridge between the Blockly webview and the board channel.
// Owns the channel lifecycle (at most one open channel) and routes decoded
// editor events to it. No retry, no reconnect, no write timeout - a failed
// upload is reported and the user re-triggers it.

use serde::Serialize;
use std::sync::Arc;

use crate::events::{self, EditorEvent};
use crate::io::{ChannelConfig, ChannelHandle, ChannelProvider, NotificationSink};
use crate::protocol;

/// Channel lifecycle. `Opening` is only observable from the notification
/// stream since acquisition completes within `on_foreground`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Closed,
    Opening,
    Open,
}

/// User-visible outcome of a bridge operation. The app shell turns these into
/// dialogs and webview events; the bridge itself stays UI-free.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeNotice {
    /// Channel capability could not be acquired (missing driver, no board)
    ChannelUnavailable { detail: String },
    /// Upload requested while no channel is open
    SendUnavailable,
    /// Upload written to the board
    UploadSent { bytes: usize },
    /// Channel is open but the transport rejected the write
    UploadFailed { detail: String },
}

pub struct Bridge {
    provider: Option<Arc<dyn ChannelProvider>>,
    config: ChannelConfig,
    channel: Option<Box<dyn ChannelHandle>>,
    state: ChannelState,
}

impl Bridge {
    pub fn new(provider: Option<Arc<dyn ChannelProvider>>, config: ChannelConfig) -> Self {
        Self {
            provider,
            config,
            channel: None,
            state: ChannelState::Closed,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state.clone()
    }

    /// Attempt to acquire the channel. No-op on platforms without a provider
    /// and when a channel is already open. Acquisition failure leaves the
    /// bridge usable in `Closed` state.
    pub fn on_foreground(&mut self, sink: NotificationSink) -> Option<BridgeNotice> {
        let Some(provider) = self.provider.clone() else {
            tlog!("[bridge] No channel capability on this platform");
            return None;
        };

        if self.channel.is_some() {
            tlog!("[bridge] Channel already open, ignoring foreground");
            return None;
        }

        self.state = ChannelState::Opening;
        match provider.open_channel(&self.config, sink) {
            Ok(handle) => {
                tlog!("[bridge] Channel open: {}", handle.describe());
                self.channel = Some(handle);
                self.state = ChannelState::Open;
                None
            }
            Err(e) => {
                tlog!("[bridge] Channel acquisition failed: {}", e);
                self.state = ChannelState::Closed;
                Some(BridgeNotice::ChannelUnavailable { detail: e })
            }
        }
    }

    /// Close the channel if one is open. Safe to call any number of times,
    /// including when no channel was ever opened.
    pub fn on_background(&mut self) {
        if let Some(handle) = self.channel.take() {
            tlog!("[bridge] Closing channel {}", handle.describe());
            handle.close();
        }
        self.state = ChannelState::Closed;
    }

    /// Route one raw editor event. Malformed events are logged and dropped
    /// with no user-visible error; upload outcomes come back as notices.
    pub fn on_editor_event(&mut self, raw: &str) -> Option<BridgeNotice> {
        match events::decode(raw) {
            Err(e) => {
                tlog!("[bridge] Dropping editor event: {}", e);
                None
            }
            Ok(EditorEvent::Preview { code }) => {
                tlog!("[bridge] Preview ({} bytes):\n{}", code.len(), code);
                None
            }
            Ok(EditorEvent::Upload {
                code,
                entry_function,
            }) => {
                let entry = entry_function
                    .as_deref()
                    .unwrap_or(protocol::DEFAULT_ENTRY);
                let message = protocol::encode_pycode(&code, entry);
                Some(self.send(&message))
            }
        }
    }

    fn send(&mut self, message: &str) -> BridgeNotice {
        let Some(channel) = self.channel.as_mut() else {
            tlog!("[bridge] Upload requested but no channel is open");
            return BridgeNotice::SendUnavailable;
        };

        match channel.write_bytes(message.as_bytes()) {
            Ok(()) => {
                tlog!(
                    "[bridge] Sent {} bytes to {}",
                    message.len(),
                    channel.describe()
                );
                BridgeNotice::UploadSent {
                    bytes: message.len(),
                }
            }
            Err(e) => {
                // Channel stays as-is; the user re-triggers the upload
                tlog!("[bridge] Write failed: {}", e);
                BridgeNotice::UploadFailed { detail: e }
            }
        }
    }
}
