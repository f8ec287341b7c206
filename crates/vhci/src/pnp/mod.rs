//! Device-management request router
//!
//! Requests are dispatched through a fixed ordinal-indexed handler table.
//! The router resolves the node, holds its lifecycle lock for the whole
//! dispatch, fast-fails anything addressed to a removed node, and
//! degrades unknown ordinals to pass-through so future request subtypes
//! keep flowing through the stack.

mod caps;
mod id;
mod intf;
mod lifecycle;
mod query;
mod relations;
mod remove;
mod resources;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::VirtualBus;
use crate::request::PnpRequest;
use crate::status::{Completion, Status};
use crate::vdev::{PnpCell, PnpState, Vdev, VdevId};

pub(crate) type PnpHandler = fn(&VirtualBus, &Arc<Vdev>, &mut PnpCell, PnpRequest) -> Completion;

const PNP_HANDLERS: [PnpHandler; 26] = [
    lifecycle::start_device,                 // 0x00 START_DEVICE
    lifecycle::query_remove_device,          // 0x01
    remove::remove_device,                   // 0x02
    lifecycle::cancel_remove_device,         // 0x03
    lifecycle::stop_device,                  // 0x04
    lifecycle::query_stop_device,            // 0x05
    lifecycle::cancel_stop_device,           // 0x06
    relations::query_device_relations,       // 0x07
    intf::query_interface,                   // 0x08
    caps::query_capabilities,                // 0x09
    resources::query_resources,              // 0x0A
    resources::query_resource_requirements,  // 0x0B
    query::query_device_text,                // 0x0C
    resources::filter_resource_requirements, // 0x0D
    query::undefined_0x0e,                   // 0x0E, undefined
    query::read_config,                      // 0x0F
    query::write_config,                     // 0x10
    query::eject,                            // 0x11
    query::set_lock,                         // 0x12
    id::query_id,                            // 0x13
    query::query_pnp_device_state,           // 0x14
    query::query_bus_information,            // 0x15
    query::device_usage_notification,        // 0x16
    lifecycle::surprise_removal,             // 0x17
    query::query_legacy_bus_information,     // 0x18 QUERY_LEGACY_BUS_INFORMATION
    query::device_enumerated,                // 0x19 DEVICE_ENUMERATED
];

/// Route one request to a node and resolve it to a terminal completion
pub fn dispatch(bus: &VirtualBus, id: VdevId, req: PnpRequest) -> Completion {
    let Some(vdev) = bus.get(id) else {
        debug!("{:?}: node is gone, minor {:#04x}", id, req.minor);
        return Completion::new(Status::NoSuchDevice);
    };

    // Lifecycle lock held across the whole dispatch: the removed-state
    // check and whatever the handler does to the cell are one atomic step
    // with respect to concurrent requests against this node.
    let mut cell = vdev.pnp().lock().unwrap();

    let done = if cell.state() == PnpState::Removed {
        // must not reach the lower layer once removal has completed
        Completion::new(Status::NoSuchDevice)
    } else if (req.minor as usize) < PNP_HANDLERS.len() {
        PNP_HANDLERS[req.minor as usize](bus, &vdev, &mut cell, req)
    } else {
        warn!("{:?}: unknown minor function {:#04x}", vdev.kind(), req.minor);
        pass_down_or_complete(bus, &vdev, req)
    };

    debug!("{:?}: leave {:?}", vdev.kind(), done.status);
    done
}

/// The default completion strategy: forward unchanged to the next lower
/// layer and propagate its result untouched, or resolve locally with
/// success when this node is the bottom of its stack
pub(crate) fn pass_down_or_complete(
    bus: &VirtualBus,
    vdev: &Vdev,
    req: PnpRequest,
) -> Completion {
    match vdev.lower() {
        Some(lower) => dispatch(bus, lower, req),
        None => Completion::success(),
    }
}
