//! Interface reference gate
//!
//! External users of a node's exposed bus interface hold a reference for
//! the duration of their usage window. Removal is gated on the count:
//! `QueryRemove` polls the gate with a zero timeout and fails fast when
//! references are outstanding, so the delivering thread never blocks.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::vdev::Vdev;

/// Per-node count of active interface users
///
/// The count is paired with a condvar signalled when it returns to zero.
/// The only wait performed against it is the zero-timeout poll in
/// [`InterfaceGate::poll_idle`].
pub struct InterfaceGate {
    count: Mutex<u32>,
    idle: Condvar,
}

impl InterfaceGate {
    pub(crate) fn new() -> Self {
        Self {
            count: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    pub fn acquire(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
    }

    pub fn release(&self) {
        let mut count = self.count.lock().unwrap();
        debug_assert!(*count > 0);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    /// Number of references currently held
    pub fn active(&self) -> u32 {
        *self.count.lock().unwrap()
    }

    /// Zero-timeout poll: true iff no reference is held right now
    ///
    /// Bounded by construction; a busy gate reports busy immediately
    /// instead of waiting for the count to drain.
    pub fn poll_idle(&self) -> bool {
        let count = self.count.lock().unwrap();
        let (count, _timed_out) = self
            .idle
            .wait_timeout_while(count, Duration::ZERO, |&mut c| c != 0)
            .unwrap();
        *count == 0
    }
}

/// RAII grant of a node's bus interface
///
/// Granted by the QueryInterface handler; ownership transfers to the
/// caller through the completion payload. The node cannot pass a
/// `QueryRemove` check while any grant is live, and the node's memory
/// stays valid until the last grant drops.
pub struct InterfaceRef {
    vdev: Arc<Vdev>,
}

impl InterfaceRef {
    pub(crate) fn new(vdev: Arc<Vdev>) -> Self {
        vdev.gate().acquire();
        Self { vdev }
    }

    pub fn vdev(&self) -> &Vdev {
        &self.vdev
    }
}

impl Drop for InterfaceRef {
    fn drop(&mut self) {
        self.vdev.gate().release();
    }
}

impl std::fmt::Debug for InterfaceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "InterfaceRef({:?}, {:?})",
            self.vdev.id(),
            self.vdev.kind()
        )
    }
}
