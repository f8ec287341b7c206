//! Descriptive and property query handlers, plus the notification-only
//! requests that just flow through the stack.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::{
    BusInformation, BusType, DeviceStateFlags, LegacyBusType, PnpParams, PnpRequest, TextKind,
};
use crate::status::{Completion, Payload, Status};
use crate::vdev::{PnpCell, PnpState, Vdev, VdevKind};

/// Copy a text result into a caller-owned buffer
fn alloc_text(s: &str) -> Completion {
    let mut out = String::new();
    if out.try_reserve_exact(s.len()).is_err() {
        return Completion::new(Status::InsufficientResources);
    }
    out.push_str(s);
    Completion::with_payload(Status::Success, Payload::Text(out))
}

pub(crate) fn query_device_text(
    _bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    let PnpParams::QueryDeviceText { kind } = req.params else {
        return Completion::new(Status::InvalidParameter);
    };

    let done = match kind {
        TextKind::Description => {
            // The remote device's product string wins for a port.
            let product = vdev.device().and_then(|d| d.product.as_deref());
            match product {
                Some(s) if vdev.kind() == VdevKind::VirtualPort => alloc_text(s),
                _ => alloc_text(vdev.kind().description()),
            }
        }
        TextKind::LocationInformation => match vdev.port() {
            Some(port) => alloc_text(&format!("Port_#{:04}", port)),
            None => alloc_text(vdev.kind().location()),
        },
        TextKind::Other(raw) => {
            warn!("{:?}: unknown device text type {}", vdev.kind(), raw);
            Completion::new(Status::InvalidParameter)
        }
    };

    debug!("{:?}: {:?} -> {:?}", vdev.kind(), kind, done.status);
    done
}

pub(crate) fn query_bus_information(
    _bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    _req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    let info = BusInformation {
        bus_type: BusType::Usb,
        legacy_bus_type: LegacyBusType::PnpBus,
        bus_number: 1, // arbitrary
    };
    Completion::with_payload(Status::Success, Payload::BusInfo(info))
}

pub(crate) fn query_pnp_device_state(
    _bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    _req: PnpRequest,
) -> Completion {
    let mut flags = vdev.flags();
    if cell.state() == PnpState::Removed {
        flags |= DeviceStateFlags::REMOVED;
    }

    debug!("{:?}({:?}): {:#x}", vdev.kind(), vdev.id(), flags.bits());
    Completion::with_payload(Status::Success, Payload::DeviceState(flags))
}

/// Ejection is meaningful only for a port: detach it from the hub
/// topology and complete; every other kind applies the default rule.
pub(crate) fn eject(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    if vdev.kind() == VdevKind::VirtualPort {
        if let Err(e) = bus.detach_port(vdev.id()) {
            warn!("{:?}: eject failed: {}", vdev.id(), e);
        }
        return Completion::success();
    }

    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn device_usage_notification(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    if let PnpParams::DeviceUsageNotification { usage, in_path } = &req.params {
        debug!(
            "{:?}({:?}): usage {:?}, in_path {}",
            vdev.kind(),
            vdev.id(),
            usage,
            in_path
        );
    }

    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn device_enumerated(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn query_legacy_bus_information(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn read_config(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn write_config(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn set_lock(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn undefined_0x0e(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}
