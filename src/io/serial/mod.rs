// src/io/serial/mod.rs
//
// USB serial channel provider (desktop only).
// Opens the board's CDC port, runs a blocking read loop on a dedicated
// thread, and shares the port between that loop and outgoing writes.

pub mod utils;

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serialport::SerialPort;

use super::{ChannelConfig, ChannelHandle, ChannelNotification, ChannelProvider, NotificationSink};

pub struct SerialChannelProvider;

/// An open serial port plus its read-loop subscription.
/// The read thread holds the sink; cancelling and joining it on close is what
/// releases the subscription.
struct SerialChannel {
    port_name: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    cancel_flag: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl ChannelProvider for SerialChannelProvider {
    fn open_channel(
        &self,
        config: &ChannelConfig,
        sink: NotificationSink,
    ) -> Result<Box<dyn ChannelHandle>, String> {
        let port_name = match &config.preferred_port {
            Some(name) => name.clone(),
            None => utils::pick_default_port()?,
        };

        // Short timeout so the read loop stays responsive to the cancel flag.
        let port = serialport::new(&port_name, config.baud_rate)
            .data_bits(utils::to_serialport_data_bits(config.data_bits))
            .stop_bits(utils::to_serialport_stop_bits(config.stop_bits))
            .parity(utils::parity_from_str(&config.parity))
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| format!("Failed to open {}: {}", port_name, e))?;

        tlog!(
            "[serial] Opened {} at {} baud ({}-{}-{})",
            port_name,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits
        );

        let port = Arc::new(Mutex::new(port));
        let cancel_flag = Arc::new(AtomicBool::new(false));

        sink(ChannelNotification::Connected);

        let reader = spawn_read_loop(port_name.clone(), port.clone(), cancel_flag.clone(), sink);

        Ok(Box::new(SerialChannel {
            port_name,
            port,
            cancel_flag,
            reader: Some(reader),
        }))
    }
}

impl ChannelHandle for SerialChannel {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), String> {
        let mut port = self
            .port
            .lock()
            .map_err(|e| format!("Port mutex poisoned: {}", e))?;
        port.write_all(data)
            .and_then(|_| port.flush())
            .map_err(|e| format!("Serial write error: {}", e))
    }

    fn close(mut self: Box<Self>) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        tlog!("[serial] Closed {}", self.port_name);
    }

    fn describe(&self) -> String {
        self.port_name.clone()
    }
}

/// Blocking read loop. Delivers received bytes to the sink until the port
/// disconnects, errors, or the cancel flag is set.
fn spawn_read_loop(
    port_name: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    cancel_flag: Arc<AtomicBool>,
    sink: NotificationSink,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buf = [0u8; 256];

        loop {
            if cancel_flag.load(Ordering::Relaxed) {
                // Deliberate close - no Disconnected notification
                break;
            }

            let read_result = match port.lock() {
                Ok(mut port_guard) => port_guard.read(&mut buf),
                Err(e) => {
                    tlog!("[serial] Mutex poisoned in read loop: {}", e);
                    sink(ChannelNotification::Disconnected);
                    break;
                }
            };

            match read_result {
                Ok(n) if n > 0 => {
                    sink(ChannelNotification::DataReceived {
                        bytes: buf[..n].to_vec(),
                    });
                }
                Ok(_) => {
                    // EOF - port closed/disconnected
                    tlog!("[serial] {} disconnected", port_name);
                    sink(ChannelNotification::Disconnected);
                    break;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    // Timeout is expected for serial reads
                }
                Err(e) => {
                    tlog!("[serial] Read error on {}: {}", port_name, e);
                    sink(ChannelNotification::Disconnected);
                    break;
                }
            }
        }
    })
}
