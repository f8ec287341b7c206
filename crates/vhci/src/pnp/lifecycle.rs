//! Lifecycle transition handlers
//!
//! Stop and remove run as query/commit pairs with a one-level rollback:
//! the query captures the current state before entering the pending
//! state, and the matching cancel restores it. Cancels are ordinary
//! requests and are safe to receive at any time; outside the matching
//! pending state they are no-ops, never errors.

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::PnpRequest;
use crate::status::{Completion, Status};
use crate::vdev::{PnpCell, PnpState, Vdev};

pub(crate) fn start_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    let done = pass_down_or_complete(bus, vdev, req);
    if done.status.is_success() {
        cell.set(PnpState::Started);
    }
    done
}

pub(crate) fn query_stop_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    cell.save_and_set(PnpState::StopPending);
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn cancel_stop_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    if cell.state() == PnpState::StopPending {
        cell.restore();
    }

    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn stop_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    cell.set(PnpState::Stopped);
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn query_remove_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    if vdev.gate().poll_idle() {
        cell.save_and_set(PnpState::RemovePending);
        pass_down_or_complete(bus, vdev, req)
    } else {
        debug!(
            "{:?}({:?}): can't be removed, {} interface reference(s) held",
            vdev.kind(),
            vdev.id(),
            vdev.gate().active()
        );
        Completion::new(Status::Unsuccessful)
    }
}

pub(crate) fn cancel_remove_device(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    if cell.state() == PnpState::RemovePending {
        cell.restore();
    }

    pass_down_or_complete(bus, vdev, req)
}

// Host-forced: no interface reference check, no rollback capture.
pub(crate) fn surprise_removal(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());

    cell.set(PnpState::SurpriseRemovePending);
    pass_down_or_complete(bus, vdev, req)
}
