//! Removal finalization
//!
//! The commit side of the remove sequence: mark the node removed, let
//! the lower layer observe the removal, take a port out of the hub
//! topology, and tear the arena entry down once no interface reference
//! is left. Outstanding references keep the node's memory valid until
//! they drop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::PnpRequest;
use crate::status::Completion;
use crate::vdev::{PnpCell, PnpState, Vdev, VdevKind};

pub(crate) fn remove_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    cell.set(PnpState::Removed);
    let done = pass_down_or_complete(bus, vdev, req);

    if vdev.kind() == VdevKind::VirtualPort {
        // may already be detached by an earlier eject
        let _ = bus.detach_port(vdev.id());
    }

    if vdev.gate().poll_idle() {
        bus.destroy(vdev.id());
    } else {
        warn!(
            "{:?}({:?}): {} interface reference(s) still held, deferring node teardown",
            vdev.kind(),
            vdev.id(),
            vdev.gate().active()
        );
    }

    done
}
