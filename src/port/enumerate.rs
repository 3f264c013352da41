//! Port discovery.
//!
//! Turns `serialport::available_ports()` into the `PortInfo` records the
//! diagnostics work with. Enumeration is done fresh on every call.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use serialport::{SerialPortInfo, SerialPortType};
use std::fmt;

/// A discoverable serial endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortInfo {
    /// Platform address, e.g. `/dev/ttyUSB0` or `COM3`. Unique per host.
    pub device: String,
    /// Short display name.
    pub name: String,
    pub description: String,
    pub hardware_id: String,
}

impl PortInfo {
    /// Build a record for a bare device address with placeholder metadata.
    pub fn from_device(device: impl Into<String>) -> Self {
        let device = device.into();
        Self {
            name: short_name(&device),
            description: "n/a".to_string(),
            hardware_id: "n/a".to_string(),
            device,
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let name = short_name(&info.port_name);
        let (description, hardware_id) = match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                let description = usb
                    .product
                    .clone()
                    .or_else(|| usb.manufacturer.clone())
                    .unwrap_or_else(|| "USB Serial Port".to_string());
                let mut hwid = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
                if let Some(serial) = &usb.serial_number {
                    hwid.push_str(" SER=");
                    hwid.push_str(serial);
                }
                (description, hwid)
            }
            SerialPortType::PciPort => ("PCI Serial Port".to_string(), "PCI".to_string()),
            SerialPortType::BluetoothPort => {
                ("Bluetooth Serial Port".to_string(), "BLUETOOTH".to_string())
            }
            SerialPortType::Unknown => ("n/a".to_string(), "n/a".to_string()),
        };

        Self {
            device: info.port_name,
            name,
            description,
            hardware_id,
        }
    }
}

/// Last path component of a device address (`/dev/ttyUSB0` -> `ttyUSB0`).
fn short_name(device: &str) -> String {
    device
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(device)
        .to_string()
}

/// List the serial ports currently present on this host.
pub fn enumerate_ports() -> Result<Vec<PortInfo>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Pick a port out of an enumeration by operator input.
///
/// `selection` may be a 1-based index into `ports`, a device address, or a
/// short name. A device address that was not enumerated is still accepted, so
/// hidden or virtual ports can be checked directly.
pub fn select_port(ports: &[PortInfo], selection: &str) -> Option<PortInfo> {
    let selection = selection.trim();
    if selection.is_empty() {
        return None;
    }

    if let Ok(index) = selection.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| ports.get(i)).cloned();
    }

    ports
        .iter()
        .find(|p| p.device == selection || p.name == selection)
        .cloned()
        .or_else(|| Some(PortInfo::from_device(selection)))
}
