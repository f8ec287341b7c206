//! Remote device descriptor types
//!
//! A virtual port presents one remote USB device locally. The descriptor
//! data below is captured when the device is plugged and backs the
//! identity and text queries answered on the port's behalf.

use serde::{Deserialize, Serialize};

/// Descriptor of the remote USB device behind a virtual port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Device release number (bcdDevice)
    pub revision: u16,
    /// USB device class
    pub class: u8,
    /// USB device subclass
    pub subclass: u8,
    /// USB device protocol
    pub protocol: u8,
    /// Device speed as reported by the remote side
    pub speed: DeviceSpeed,
    /// Manufacturer string (if available)
    pub manufacturer: Option<String>,
    /// Product string (if available)
    pub product: Option<String>,
    /// Serial number string (if available)
    pub serial_number: Option<String>,
}

/// USB device speed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceSpeed {
    /// Low speed - 1.5 Mbps (USB 1.0)
    Low,
    /// Full speed - 12 Mbps (USB 1.1)
    Full,
    /// High speed - 480 Mbps (USB 2.0)
    High,
    /// SuperSpeed - 5 Gbps (USB 3.0)
    Super,
    /// SuperSpeed+ - 10 Gbps (USB 3.1)
    SuperPlus,
}
