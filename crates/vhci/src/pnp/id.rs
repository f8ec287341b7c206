//! Identifier construction
//!
//! Identifiers are answered by the bottom node of each two-node stack;
//! layered kinds pass the request down so the parent node of the same
//! stack responds. Port identifiers are formatted from the remote
//! device's descriptor.

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::{IdKind, PnpParams, PnpRequest};
use crate::status::{Completion, Payload, Status};
use crate::vdev::{PnpCell, Vdev, VdevKind};

fn device_id(vdev: &Vdev) -> String {
    match vdev.kind() {
        VdevKind::Root => "VUSB\\ROOT".to_string(),
        VdevKind::ControllerParent | VdevKind::Controller => "VUSB\\VHCI".to_string(),
        VdevKind::HubParent | VdevKind::VirtualHub => "VUSB\\VHUB".to_string(),
        VdevKind::VirtualPort => {
            let (vid, pid) = vdev
                .device()
                .map(|d| (d.vendor_id, d.product_id))
                .unwrap_or_default();
            format!("VUSB\\VID_{:04X}&PID_{:04X}", vid, pid)
        }
    }
}

fn hardware_ids(vdev: &Vdev) -> Vec<String> {
    match vdev.device() {
        Some(d) if vdev.kind() == VdevKind::VirtualPort => vec![
            format!(
                "VUSB\\VID_{:04X}&PID_{:04X}&REV_{:04X}",
                d.vendor_id, d.product_id, d.revision
            ),
            format!("VUSB\\VID_{:04X}&PID_{:04X}", d.vendor_id, d.product_id),
        ],
        _ => vec![device_id(vdev)],
    }
}

fn compatible_ids(vdev: &Vdev) -> Vec<String> {
    let Some(d) = vdev.device() else {
        return Vec::new();
    };
    vec![
        format!(
            "USB\\Class_{:02x}&SubClass_{:02x}&Prot_{:02x}",
            d.class, d.subclass, d.protocol
        ),
        format!("USB\\Class_{:02x}&SubClass_{:02x}", d.class, d.subclass),
        format!("USB\\Class_{:02x}", d.class),
    ]
}

fn instance_id(vdev: &Vdev) -> String {
    match vdev.port() {
        Some(port) => format!("{:04}", port),
        None => "0000".to_string(),
    }
}

pub(crate) fn query_id(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    if vdev.lower().is_some() {
        return pass_down_or_complete(bus, vdev, req);
    }

    let PnpParams::QueryId { kind } = req.params else {
        return Completion::new(Status::InvalidParameter);
    };

    let ids = match kind {
        IdKind::DeviceId => vec![device_id(vdev)],
        IdKind::HardwareIds => hardware_ids(vdev),
        IdKind::CompatibleIds => compatible_ids(vdev),
        IdKind::InstanceId => vec![instance_id(vdev)],
    };

    debug!("{:?}: {:?} -> {:?}", vdev.kind(), kind, ids);
    Completion::with_payload(Status::Success, Payload::Ids(ids))
}
