//! Capability reporting

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::{DeviceCapabilities, PnpRequest};
use crate::status::{Completion, Payload, Status};
use crate::vdev::{PnpCell, Vdev, VdevKind};

pub(crate) fn query_capabilities(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    if vdev.lower().is_some() {
        return pass_down_or_complete(bus, vdev, req);
    }

    let is_port = vdev.kind() == VdevKind::VirtualPort;
    let caps = DeviceCapabilities {
        removable: is_port,
        eject_supported: is_port,
        surprise_removal_ok: true,
        unique_id: false,
        raw_device_ok: matches!(
            vdev.kind(),
            VdevKind::ControllerParent | VdevKind::HubParent
        ),
        silent_install: true,
    };

    debug!("{:?}({:?}): {:?}", vdev.kind(), vdev.id(), caps);
    Completion::with_payload(Status::Success, Payload::Capabilities(caps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::minor;
    use crate::status::Payload;
    use common::{DeviceDescriptor, DeviceSpeed};

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            vendor_id: 1,
            product_id: 2,
            revision: 0,
            class: 0,
            subclass: 0,
            protocol: 0,
            speed: DeviceSpeed::High,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }

    #[test]
    fn test_only_ports_are_ejectable() {
        let bus = VirtualBus::new();
        let port = bus.plug_port(descriptor()).unwrap();

        let done = bus.dispatch(port, PnpRequest::new(minor::QUERY_CAPABILITIES));
        let Some(Payload::Capabilities(caps)) = done.payload else {
            panic!("expected capabilities, got {:?}", done.payload);
        };
        assert!(caps.removable);
        assert!(caps.eject_supported);
        assert!(!caps.raw_device_ok);

        let done = bus.dispatch(bus.hub(), PnpRequest::new(minor::QUERY_CAPABILITIES));
        let Some(Payload::Capabilities(caps)) = done.payload else {
            panic!("expected capabilities, got {:?}", done.payload);
        };
        // answered by the hub parent underneath
        assert!(!caps.removable);
        assert!(caps.raw_device_ok);
    }
}
