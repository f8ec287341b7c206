//! Virtual device nodes and their lifecycle state
//!
//! A [`Vdev`] is one layer of the virtual bus stack. Its lifecycle state
//! lives in a [`PnpCell`] guarded by a per-node mutex; all mutation goes
//! through the router-dispatched handlers in [`crate::pnp`].

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use common::DeviceDescriptor;

use crate::gate::InterfaceGate;
use crate::request::DeviceStateFlags;

/// Stable arena handle of a virtual device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VdevId(pub u32);

/// Bus-stack layer kinds, in stack order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdevKind {
    Root,
    ControllerParent,
    Controller,
    HubParent,
    VirtualHub,
    VirtualPort,
}

const VDEV_DESCRIPTIONS: [&str; 6] = [
    "vusb root",
    "vusb controller parent",
    "vusb virtual host controller",
    "vusb hub parent",
    "vusb virtual hub",
    "vusb virtual port",
];

const VDEV_LOCATIONS: [&str; 6] = [
    "vusb virtual bus",
    "vusb virtual bus",
    "on vusb root",
    "on vusb virtual host controller",
    "on vusb virtual host controller",
    "on vusb virtual hub",
];

impl VdevKind {
    fn index(self) -> usize {
        match self {
            VdevKind::Root => 0,
            VdevKind::ControllerParent => 1,
            VdevKind::Controller => 2,
            VdevKind::HubParent => 3,
            VdevKind::VirtualHub => 4,
            VdevKind::VirtualPort => 5,
        }
    }

    /// Canned description, overridden for a port by the remote product string
    pub fn description(self) -> &'static str {
        VDEV_DESCRIPTIONS[self.index()]
    }

    pub fn location(self) -> &'static str {
        VDEV_LOCATIONS[self.index()]
    }
}

/// Device lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnpState {
    NotStarted,
    Started,
    StopPending,
    Stopped,
    RemovePending,
    SurpriseRemovePending,
    /// Terminal: no transition leaves this state and no request is
    /// forwarded once it is reached
    Removed,
}

/// Current state plus the single saved prior state
///
/// The saved slot is written only on entry to `StopPending` or
/// `RemovePending` and holds at most one state; the matching cancel
/// restores it and clears the slot. One level of rollback, never a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnpCell {
    state: PnpState,
    previous: Option<PnpState>,
}

impl PnpCell {
    pub(crate) fn new() -> Self {
        Self {
            state: PnpState::NotStarted,
            previous: None,
        }
    }

    pub fn state(&self) -> PnpState {
        self.state
    }

    pub fn previous(&self) -> Option<PnpState> {
        self.previous
    }

    pub(crate) fn set(&mut self, next: PnpState) {
        self.state = next;
    }

    /// Enter a pending state, capturing the then-current state for rollback
    pub(crate) fn save_and_set(&mut self, pending: PnpState) {
        debug_assert!(matches!(
            pending,
            PnpState::StopPending | PnpState::RemovePending
        ));
        self.previous = Some(self.state);
        self.state = pending;
    }

    /// Roll back to the saved state and clear the slot
    pub(crate) fn restore(&mut self) {
        if let Some(prior) = self.previous.take() {
            self.state = prior;
        }
    }
}

/// One node of the virtual bus stack
pub struct Vdev {
    id: VdevId,
    kind: VdevKind,
    /// Non-owning back-reference to the node beneath in the hierarchy
    parent: Option<VdevId>,
    /// Forwarding target for layered kinds
    lower: Option<VdevId>,
    /// Hub port number, ports only
    port: Option<u8>,
    /// Remote device descriptor, ports only
    device: Option<DeviceDescriptor>,
    pnp: Mutex<PnpCell>,
    gate: InterfaceGate,
    flags: AtomicU32,
    unplugged: AtomicBool,
}

impl Vdev {
    pub(crate) fn new(
        id: VdevId,
        kind: VdevKind,
        parent: Option<VdevId>,
        lower: Option<VdevId>,
    ) -> Self {
        Self {
            id,
            kind,
            parent,
            lower,
            port: None,
            device: None,
            pnp: Mutex::new(PnpCell::new()),
            gate: InterfaceGate::new(),
            flags: AtomicU32::new(0),
            unplugged: AtomicBool::new(false),
        }
    }

    pub(crate) fn new_port(
        id: VdevId,
        parent: VdevId,
        port: u8,
        device: DeviceDescriptor,
    ) -> Self {
        Self {
            id,
            kind: VdevKind::VirtualPort,
            parent: Some(parent),
            lower: None,
            port: Some(port),
            device: Some(device),
            pnp: Mutex::new(PnpCell::new()),
            gate: InterfaceGate::new(),
            flags: AtomicU32::new(0),
            unplugged: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> VdevId {
        self.id
    }

    pub fn kind(&self) -> VdevKind {
        self.kind
    }

    pub fn parent(&self) -> Option<VdevId> {
        self.parent
    }

    pub fn lower(&self) -> Option<VdevId> {
        self.lower
    }

    pub fn port(&self) -> Option<u8> {
        self.port
    }

    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    pub fn gate(&self) -> &InterfaceGate {
        &self.gate
    }

    pub(crate) fn pnp(&self) -> &Mutex<PnpCell> {
        &self.pnp
    }

    /// Snapshot of the current lifecycle state
    pub fn state(&self) -> PnpState {
        self.pnp.lock().unwrap().state()
    }

    /// Snapshot of the whole state record, saved slot included
    pub fn pnp_cell(&self) -> PnpCell {
        *self.pnp.lock().unwrap()
    }

    pub fn flags(&self) -> DeviceStateFlags {
        DeviceStateFlags::from_bits(self.flags.load(Ordering::Acquire))
    }

    pub fn or_flags(&self, flags: DeviceStateFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub fn is_unplugged(&self) -> bool {
        self.unplugged.load(Ordering::Acquire)
    }

    pub(crate) fn mark_unplugged(&self) -> bool {
        !self.unplugged.swap(true, Ordering::AcqRel)
    }
}

impl std::fmt::Debug for Vdev {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vdev")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}
