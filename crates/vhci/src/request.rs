//! Device-management request types
//!
//! A request is an ordinal minor-function code plus the parameters
//! specific to that subtype. The ordinals and their order are fixed by
//! the host device framework; [`crate::pnp`] maps them to handlers
//! through a bounded table.

use std::ops::{BitOr, BitOrAssign};

/// Minor-function ordinals, in dispatch-table order
pub mod minor {
    pub const START_DEVICE: u8 = 0x00;
    pub const QUERY_REMOVE_DEVICE: u8 = 0x01;
    pub const REMOVE_DEVICE: u8 = 0x02;
    pub const CANCEL_REMOVE_DEVICE: u8 = 0x03;
    pub const STOP_DEVICE: u8 = 0x04;
    pub const QUERY_STOP_DEVICE: u8 = 0x05;
    pub const CANCEL_STOP_DEVICE: u8 = 0x06;
    pub const QUERY_DEVICE_RELATIONS: u8 = 0x07;
    pub const QUERY_INTERFACE: u8 = 0x08;
    pub const QUERY_CAPABILITIES: u8 = 0x09;
    pub const QUERY_RESOURCES: u8 = 0x0A;
    pub const QUERY_RESOURCE_REQUIREMENTS: u8 = 0x0B;
    pub const QUERY_DEVICE_TEXT: u8 = 0x0C;
    pub const FILTER_RESOURCE_REQUIREMENTS: u8 = 0x0D;
    pub const READ_CONFIG: u8 = 0x0F;
    pub const WRITE_CONFIG: u8 = 0x10;
    pub const EJECT: u8 = 0x11;
    pub const SET_LOCK: u8 = 0x12;
    pub const QUERY_ID: u8 = 0x13;
    pub const QUERY_PNP_DEVICE_STATE: u8 = 0x14;
    pub const QUERY_BUS_INFORMATION: u8 = 0x15;
    pub const DEVICE_USAGE_NOTIFICATION: u8 = 0x16;
    pub const SURPRISE_REMOVAL: u8 = 0x17;
    pub const QUERY_LEGACY_BUS_INFORMATION: u8 = 0x18;
    pub const DEVICE_ENUMERATED: u8 = 0x19;
}

/// One inbound device-management request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PnpRequest {
    /// Minor-function ordinal; codes beyond the known table degrade to
    /// pass-through rather than failing
    pub minor: u8,
    pub params: PnpParams,
}

impl PnpRequest {
    pub fn new(minor: u8) -> Self {
        Self {
            minor,
            params: PnpParams::None,
        }
    }

    pub fn with_params(minor: u8, params: PnpParams) -> Self {
        Self { minor, params }
    }
}

/// Request-specific input parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PnpParams {
    None,
    QueryDeviceText { kind: TextKind },
    QueryId { kind: IdKind },
    QueryDeviceRelations { kind: RelationKind },
    QueryInterface { kind: InterfaceKind },
    DeviceUsageNotification { usage: DeviceUsage, in_path: bool },
}

/// Requested device text kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Description,
    LocationInformation,
    /// Text kind this bus does not know about
    Other(u32),
}

/// Requested identifier kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    DeviceId,
    HardwareIds,
    CompatibleIds,
    InstanceId,
}

/// Requested relation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Bus,
    Ejection,
    Removal,
    TargetDevice,
}

/// Bus interface exposed to upper layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    UsbBus,
}

/// Special-file usage announced by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceUsage {
    Paging,
    Hibernation,
    DumpFile,
}

/// Synthesized bus descriptor returned by QueryBusInformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusInformation {
    pub bus_type: BusType,
    pub legacy_bus_type: LegacyBusType,
    /// Arbitrary but stable for the lifetime of the bus
    pub bus_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Usb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyBusType {
    PnpBus,
}

/// Capability record returned for stack-bottom nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub removable: bool,
    pub eject_supported: bool,
    pub surprise_removal_ok: bool,
    pub unique_id: bool,
    pub raw_device_ok: bool,
    pub silent_install: bool,
}

/// Accumulated PnP device-state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStateFlags(u32);

impl DeviceStateFlags {
    pub const DISABLED: Self = Self(1 << 0);
    pub const DONT_DISPLAY_IN_UI: Self = Self(1 << 1);
    pub const FAILED: Self = Self(1 << 2);
    pub const REMOVED: Self = Self(1 << 3);
    pub const NOT_DISABLEABLE: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DeviceStateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DeviceStateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
