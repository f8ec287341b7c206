//! Virtual USB host controller core for rust-vusb
//!
//! This crate models the bus-stack hierarchy of a virtual USB host
//! controller: a fixed root / controller / hub stack plus one virtual
//! port per remote device. Device-management requests are delivered to
//! the [`pnp::dispatch`] router, which resolves every request to exactly
//! one terminal [`Completion`] - either locally or by forwarding it
//! unchanged to the next lower stack layer.
//!
//! # Example
//!
//! ```
//! use vhci::{VirtualBus, PnpRequest, Status, minor};
//!
//! let bus = VirtualBus::new();
//! let done = bus.dispatch(bus.hub(), PnpRequest::new(minor::START_DEVICE));
//! assert_eq!(done.status, Status::Success);
//! ```

pub mod bus;
pub mod gate;
pub mod pnp;
pub mod request;
pub mod status;
pub mod transfer;
pub mod vdev;

pub use bus::{BusError, HUB_PORT_COUNT, VirtualBus};
pub use gate::{InterfaceGate, InterfaceRef};
pub use pnp::dispatch;
pub use request::{
    BusInformation, BusType, DeviceCapabilities, DeviceStateFlags, DeviceUsage, IdKind,
    InterfaceKind, LegacyBusType, PnpParams, PnpRequest, RelationKind, TextKind, minor,
};
pub use status::{Completion, Payload, Status};
pub use transfer::Transfer;
pub use vdev::{PnpState, Vdev, VdevId, VdevKind};
