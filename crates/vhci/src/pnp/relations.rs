//! Device relation reporting
//!
//! Bus relations are answered by the enumerating kinds: the root reports
//! the controller parent, the controller reports the hub parent, and the
//! hub reports its attached ports. Target relations resolve at the
//! bottom of each stack.

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::{PnpParams, PnpRequest, RelationKind};
use crate::status::{Completion, Payload, Status};
use crate::vdev::{PnpCell, Vdev, VdevKind};

pub(crate) fn query_device_relations(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    let PnpParams::QueryDeviceRelations { kind } = &req.params else {
        return Completion::new(Status::InvalidParameter);
    };

    match *kind {
        RelationKind::Bus => match vdev.kind() {
            VdevKind::Root | VdevKind::Controller | VdevKind::VirtualHub => {
                let children = bus.children_of(vdev.id());
                debug!(
                    "{:?}({:?}): {} child node(s)",
                    vdev.kind(),
                    vdev.id(),
                    children.len()
                );
                Completion::with_payload(Status::Success, Payload::Relations(children))
            }
            _ => pass_down_or_complete(bus, vdev, req),
        },
        RelationKind::TargetDevice => {
            if vdev.lower().is_none() {
                Completion::with_payload(Status::Success, Payload::Relations(vec![vdev.id()]))
            } else {
                pass_down_or_complete(bus, vdev, req)
            }
        }
        RelationKind::Ejection | RelationKind::Removal => pass_down_or_complete(bus, vdev, req),
    }
}
