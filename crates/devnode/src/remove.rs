//! Device node removal

use common::Result;
use tracing::{debug, info};

use crate::errmsg;
use crate::store::DeviceStore;

#[derive(Debug, Clone)]
pub struct RemoveArgs {
    /// Hardware id to match exactly
    pub hardware_id: String,
    /// Restrict the search to one enumerator
    pub enumerator: Option<String>,
    /// List matching instance ids without removing anything
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// Instance ids whose hardware id matched
    pub matched: Vec<String>,
    /// Nodes actually removed
    pub removed: usize,
    /// Aggregated over all processed devices
    pub reboot_required: bool,
}

/// Remove every device node matching the hardware id
///
/// A failure on one node is logged and skipped; the rest of the batch
/// still runs.
pub fn remove(store: &mut DeviceStore, args: &RemoveArgs) -> Result<RemoveOutcome> {
    let matched: Vec<String> = store
        .devices()
        .iter()
        .filter(|d| {
            args.enumerator
                .as_deref()
                .is_none_or(|e| d.enumerator.eq_ignore_ascii_case(e))
        })
        .filter(|d| d.hardware_id == args.hardware_id)
        .map(|d| d.instance_id.clone())
        .collect();

    debug!(
        "{} device node(s) match hardware id {}",
        matched.len(),
        args.hardware_id
    );

    if args.dry_run {
        return Ok(RemoveOutcome {
            matched,
            ..Default::default()
        });
    }

    let mut removed = 0;
    let reboot_required = false;
    for instance_id in &matched {
        match store.remove_device(instance_id) {
            Ok(()) => removed += 1,
            Err(e) => {
                errmsg("remove_device", instance_id, &e);
                continue;
            }
        }
    }

    if removed > 0 {
        store.save()?;
        info!("Removed {} device node(s)", removed);
    }

    Ok(RemoveOutcome {
        matched,
        removed,
        reboot_required,
    })
}
