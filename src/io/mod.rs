// src/io/mod.rs
//
// Channel capability abstraction for the transport bridge.
// The bridge depends only on these traits; the platform decides once at
// startup whether a real provider exists. USB serial is the only concrete
// channel and it is desktop-only.

use serde::Serialize;
use std::sync::Arc;

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub mod serial;

/// Asynchronous notifications a channel may deliver while open.
/// Observed for logging/diagnostics only — the write path never waits on them.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelNotification {
    Connected,
    Disconnected,
    DataReceived { bytes: Vec<u8> },
}

/// Sink for channel notifications. Handed to the provider on open and
/// released when the channel closes — the subscription lives exactly as long
/// as the channel.
pub type NotificationSink = Arc<dyn Fn(ChannelNotification) + Send + Sync>;

/// Connection parameters for the board link, taken from settings.
/// Parity is carried as a string ("none" | "odd" | "even") so the config can
/// exist on platforms where the serialport types do not.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Explicit port to use; when `None` the provider picks the first USB port
    pub preferred_port: Option<String>,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: String,
}

/// An open, exclusive byte channel to the board.
pub trait ChannelHandle: Send {
    /// Write raw bytes. No retry and no completion tracking beyond the result.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), String>;

    /// Close the channel and release its notification subscription.
    /// Permitted at any time, including while a write is conceptually in flight.
    fn close(self: Box<Self>);

    /// Port name or other human-readable identity, for logging.
    fn describe(&self) -> String;
}

/// Factory for channel handles. Resolved once at startup; absent on platforms
/// without a serial capability.
pub trait ChannelProvider: Send + Sync {
    fn open_channel(
        &self,
        config: &ChannelConfig,
        sink: NotificationSink,
    ) -> Result<Box<dyn ChannelHandle>, String>;
}

/// Resolve the channel provider for this platform.
/// Desktop gets the USB serial provider; iOS and Android have no channel
/// capability and every bridge operation that needs one degrades gracefully.
pub fn platform_provider() -> Option<Arc<dyn ChannelProvider>> {
    #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
    {
        Some(Arc::new(serial::SerialChannelProvider))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}
