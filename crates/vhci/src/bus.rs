//! The virtual bus arena
//!
//! All nodes live in one registry addressed by stable [`VdevId`] handles.
//! The five-node root/controller/hub stack is built once at construction;
//! virtual ports come and go with remote plug events. The strictly
//! layered structure is wired here, so forwarding cannot form a cycle.
//!
//! Lock order: the registry lock is never held while taking a node's
//! lifecycle lock. Handlers holding a lifecycle lock may take the
//! registry lock (plug, detach, destroy, child listing).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use common::DeviceDescriptor;
use thiserror::Error;
use tracing::{debug, info};

use crate::pnp;
use crate::request::PnpRequest;
use crate::status::Completion;
use crate::vdev::{Vdev, VdevId, VdevKind};

/// Ports exposed by the virtual hub
pub const HUB_PORT_COUNT: u8 = 8;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no free port on the virtual hub")]
    NoFreePort,

    #[error("no such device: {0:?}")]
    NoSuchDevice(VdevId),
}

/// Arena of virtual device nodes
pub struct VirtualBus {
    nodes: RwLock<HashMap<VdevId, Arc<Vdev>>>,
    next_id: AtomicU32,
    root: VdevId,
    controller: VdevId,
    hub: VdevId,
}

impl VirtualBus {
    /// Build the fixed bus stack: root, controller parent, controller,
    /// hub parent, virtual hub
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        let mut next = 1u32;
        let mut alloc = || {
            let id = VdevId(next);
            next += 1;
            id
        };

        let root = alloc();
        let controller_parent = alloc();
        let controller = alloc();
        let hub_parent = alloc();
        let hub = alloc();

        nodes.insert(root, Arc::new(Vdev::new(root, VdevKind::Root, None, None)));
        nodes.insert(
            controller_parent,
            Arc::new(Vdev::new(
                controller_parent,
                VdevKind::ControllerParent,
                Some(root),
                None,
            )),
        );
        nodes.insert(
            controller,
            Arc::new(Vdev::new(
                controller,
                VdevKind::Controller,
                Some(controller_parent),
                Some(controller_parent),
            )),
        );
        nodes.insert(
            hub_parent,
            Arc::new(Vdev::new(
                hub_parent,
                VdevKind::HubParent,
                Some(controller),
                None,
            )),
        );
        nodes.insert(
            hub,
            Arc::new(Vdev::new(
                hub,
                VdevKind::VirtualHub,
                Some(hub_parent),
                Some(hub_parent),
            )),
        );

        debug!("Virtual bus stack built with {} nodes", nodes.len());

        Self {
            nodes: RwLock::new(nodes),
            next_id: AtomicU32::new(next),
            root,
            controller,
            hub,
        }
    }

    pub fn root(&self) -> VdevId {
        self.root
    }

    pub fn controller(&self) -> VdevId {
        self.controller
    }

    pub fn hub(&self) -> VdevId {
        self.hub
    }

    /// Resolve a handle; the registry lock is dropped before returning
    pub fn get(&self, id: VdevId) -> Option<Arc<Vdev>> {
        self.nodes.read().unwrap().get(&id).cloned()
    }

    /// Dispatch a request to a node
    pub fn dispatch(&self, id: VdevId, req: PnpRequest) -> Completion {
        pnp::dispatch(self, id, req)
    }

    /// Attach a remote device on the lowest free hub port
    pub fn plug_port(&self, device: DeviceDescriptor) -> Result<VdevId, BusError> {
        let mut nodes = self.nodes.write().unwrap();

        let mut used = [false; HUB_PORT_COUNT as usize];
        for node in nodes.values() {
            if let Some(port) = node.port() {
                if let Some(slot) = used.get_mut(port as usize - 1) {
                    *slot = true;
                }
            }
        }
        let port = used
            .iter()
            .position(|&taken| !taken)
            .map(|idx| idx as u8 + 1)
            .ok_or(BusError::NoFreePort)?;

        let id = VdevId(self.next_id.fetch_add(1, Ordering::Relaxed));
        info!(
            "Plugged device {:04x}:{:04x} as {:?} on port {}",
            device.vendor_id, device.product_id, id, port
        );
        nodes.insert(id, Arc::new(Vdev::new_port(id, self.hub, port, device)));

        Ok(id)
    }

    /// Detach a port from the hub topology without destroying the node
    ///
    /// The node keeps answering requests until removal completes; it just
    /// stops appearing in the hub's bus relations.
    pub fn detach_port(&self, id: VdevId) -> Result<(), BusError> {
        let node = self.get(id).ok_or(BusError::NoSuchDevice(id))?;
        if node.kind() != VdevKind::VirtualPort {
            return Err(BusError::NoSuchDevice(id));
        }
        if node.mark_unplugged() {
            info!("Detached {:?} from hub port {:?}", id, node.port());
        }
        Ok(())
    }

    /// Children of a node in bus-relation order, detached ports excluded
    pub fn children_of(&self, id: VdevId) -> Vec<VdevId> {
        let nodes = self.nodes.read().unwrap();
        let mut children: Vec<_> = nodes
            .values()
            .filter(|n| n.parent() == Some(id) && !n.is_unplugged())
            .map(|n| (n.port(), n.id()))
            .collect();
        drop(nodes);

        children.sort();
        children.into_iter().map(|(_, id)| id).collect()
    }

    /// Drop the arena entry; memory is reclaimed when the last handle drops
    pub(crate) fn destroy(&self, id: VdevId) -> bool {
        let removed = self.nodes.write().unwrap().remove(&id);
        if let Some(node) = &removed {
            debug!("Destroyed {:?} ({:?})", id, node.kind());
        }
        removed.is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VirtualBus {
    fn default() -> Self {
        Self::new()
    }
}
