// src/io/serial/utils.rs
//
// Shared utilities for the USB serial channel.
// Conversions into serialport crate types plus port enumeration/selection.

use serde::Serialize;
use serialport::{DataBits, Parity, StopBits};

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a parity string ("none", "odd", "even") to serialport crate's Parity type
pub fn parity_from_str(s: &str) -> Parity {
    match s.to_lowercase().as_str() {
        "odd" => Parity::Odd,
        "even" => Parity::Even,
        _ => Parity::None,
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> StopBits {
    match bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

// ============================================================================
// Port Enumeration
// ============================================================================

/// Information about an available serial port
#[derive(Clone, Serialize)]
pub struct SerialPortInfo {
    pub port_name: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// List available serial ports.
///
/// On macOS, filters out /dev/tty.* devices and only shows /dev/cu.* devices.
/// The cu (calling unit) devices are non-blocking and preferred for outgoing
/// connections; the tty devices block on open waiting for carrier detect.
pub fn list_serial_ports() -> Result<Vec<SerialPortInfo>, String> {
    let ports =
        serialport::available_ports().map_err(|e| format!("Failed to enumerate ports: {}", e))?;

    Ok(ports
        .into_iter()
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    "USB".to_string(),
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::BluetoothPort => {
                    ("Bluetooth".to_string(), None, None, None, None, None)
                }
                serialport::SerialPortType::PciPort => {
                    ("PCI".to_string(), None, None, None, None, None)
                }
                serialport::SerialPortType::Unknown => {
                    ("Unknown".to_string(), None, None, None, None, None)
                }
            };
            SerialPortInfo {
                port_name: p.port_name,
                port_type,
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect())
}

/// Pick the port to open when settings do not name one.
/// STM32 boards enumerate as USB CDC devices, so USB ports are preferred;
/// falls back to the first port of any type.
pub fn pick_default_port() -> Result<String, String> {
    let ports = list_serial_ports()?;
    ports
        .iter()
        .find(|p| p.port_type == "USB")
        .or_else(|| ports.first())
        .map(|p| p.port_name.clone())
        .ok_or_else(|| "No serial ports found".to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_from_str() {
        assert!(matches!(parity_from_str("none"), Parity::None));
        assert!(matches!(parity_from_str("odd"), Parity::Odd));
        assert!(matches!(parity_from_str("Even"), Parity::Even));
        assert!(matches!(parity_from_str("garbage"), Parity::None)); // default
    }

    #[test]
    fn test_to_serialport_data_bits() {
        assert!(matches!(to_serialport_data_bits(5), DataBits::Five));
        assert!(matches!(to_serialport_data_bits(6), DataBits::Six));
        assert!(matches!(to_serialport_data_bits(7), DataBits::Seven));
        assert!(matches!(to_serialport_data_bits(8), DataBits::Eight));
        assert!(matches!(to_serialport_data_bits(9), DataBits::Eight)); // default
    }

    #[test]
    fn test_to_serialport_stop_bits() {
        assert!(matches!(to_serialport_stop_bits(1), StopBits::One));
        assert!(matches!(to_serialport_stop_bits(2), StopBits::Two));
        assert!(matches!(to_serialport_stop_bits(0), StopBits::One)); // default
    }
}
