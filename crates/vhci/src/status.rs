//! Request completion statuses and payloads
//!
//! Every dispatched request resolves to exactly one [`Completion`]. When a
//! completion carries a payload, ownership of the payload transfers to the
//! caller; the caller releases it by dropping it.

use crate::gate::InterfaceRef;
use crate::request::{BusInformation, DeviceCapabilities, DeviceStateFlags};
use crate::vdev::VdevId;

/// Terminal status of a device-management request
///
/// Statuses returned by a lower stack layer propagate through forwarding
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Request resolved successfully
    Success,
    /// Request arrived after the node completed removal
    NoSuchDevice,
    /// Removal blocked by active interface references
    Unsuccessful,
    /// Allocation failure while building the result
    InsufficientResources,
    /// Unrecognized request-specific sub-kind
    InvalidParameter,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Result payload handed to the caller
///
/// The variants mirror the queries that produce output: text buffers,
/// bus descriptors, identifier lists, capability records, relation lists
/// and granted bus-interface references.
#[derive(Debug)]
pub enum Payload {
    /// Description or location text (caller-owned)
    Text(String),
    /// Synthesized bus descriptor
    BusInfo(BusInformation),
    /// Accumulated device-state flags
    DeviceState(DeviceStateFlags),
    /// Identifier strings, most specific first
    Ids(Vec<String>),
    /// Device capability record
    Capabilities(DeviceCapabilities),
    /// Related node handles
    Relations(Vec<VdevId>),
    /// Granted bus interface; the node stays referenced until this drops
    Interface(InterfaceRef),
}

/// Outcome of one dispatched request
#[derive(Debug)]
pub struct Completion {
    pub status: Status,
    pub payload: Option<Payload>,
}

impl Completion {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    pub fn success() -> Self {
        Self::new(Status::Success)
    }

    pub fn with_payload(status: Status, payload: Payload) -> Self {
        Self {
            status,
            payload: Some(payload),
        }
    }
}
