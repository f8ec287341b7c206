//! Resource queries
//!
//! Virtual nodes own no hardware resources; these requests just flow
//! through the stack under the default rule.

use std::sync::Arc;

use tracing::debug;

use crate::bus::VirtualBus;
use crate::pnp::pass_down_or_complete;
use crate::request::PnpRequest;
use crate::status::Completion;
use crate::vdev::{PnpCell, Vdev};

pub(crate) fn query_resources(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn query_resource_requirements(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}

pub(crate) fn filter_resource_requirements(
    bus: &VirtualBus,
    vdev: &Arc<Vdev>,
    _cell: &mut PnpCell,
    req: PnpRequest,
) -> Completion {
    debug!("{:?}({:?})", vdev.kind(), vdev.id());
    pass_down_or_complete(bus, vdev, req)
}
