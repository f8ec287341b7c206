//! Transfer-buffer payload copy
//!
//! Moves received bytes from a completed remote submission into the
//! transfer buffer of the originating request. Only receive-direction
//! transfers carry data back; send-direction completions are a no-op.

use bytes::BytesMut;
use tracing::warn;

use crate::status::Status;

/// Direction bit of an endpoint address
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// One in-flight bulk or interrupt transfer
#[derive(Debug)]
pub struct Transfer {
    /// Endpoint address (includes direction bit)
    pub endpoint: u8,
    /// Caller-provided transfer buffer
    pub buffer: BytesMut,
    /// Bytes actually transferred, set when the completion is fetched
    pub actual_length: usize,
}

impl Transfer {
    pub fn new(endpoint: u8, buffer_len: usize) -> Self {
        Self {
            endpoint,
            buffer: BytesMut::zeroed(buffer_len),
            actual_length: 0,
        }
    }

    pub fn is_in(&self) -> bool {
        self.endpoint & ENDPOINT_DIR_IN != 0
    }
}

/// Copy a completion payload into a transfer buffer
///
/// Fails without touching the buffer when the payload does not fit.
pub fn copy_to_transfer_buffer(target: &mut BytesMut, src: &[u8]) -> Status {
    if src.len() > target.len() {
        warn!(
            "payload of {} bytes exceeds transfer buffer of {} bytes",
            src.len(),
            target.len()
        );
        return Status::InvalidParameter;
    }

    target[..src.len()].copy_from_slice(src);
    Status::Success
}

/// Fetch the result of a completed bulk or interrupt submission
pub fn fetch_bulk_or_interrupt(xfer: &mut Transfer, payload: &[u8]) -> Status {
    if !xfer.is_in() {
        return Status::Success;
    }

    let status = copy_to_transfer_buffer(&mut xfer.buffer, payload);
    if status.is_success() {
        xfer.actual_length = payload.len();
    }
    status
}
