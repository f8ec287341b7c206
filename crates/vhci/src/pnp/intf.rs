//! Bus interface grants
//!
//! The acquire side of the interface reference gate: a granted
//! [`InterfaceRef`] keeps the node referenced until the caller drops it,
//! and a referenced node fails `QueryRemove`.

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::gate::InterfaceRef;
use crate::pnp::pass_down_or_complete;
use crate::request::{InterfaceKind, PnpParams, PnpRequest};
use crate::status::{Completion, Payload, Status};
use crate::vdev::{PnpCell, Vdev};

pub(crate) fn query_interface(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    if vdev.lower().is_some() {
        return pass_down_or_complete(bus, vdev, req);
    }

    let PnpParams::QueryInterface { kind } = &req.params else {
        return Completion::new(Status::InvalidParameter);
    };

    match kind {
        InterfaceKind::UsbBus => {
            let granted = InterfaceRef::new(Arc::clone(vdev));
            debug!(
                "{:?}({:?}): bus interface granted, {} active reference(s)",
                vdev.kind(),
                vdev.id(),
                vdev.gate().active()
            );
            Completion::with_payload(Status::Success, Payload::Interface(granted))
        }
    }
}
