//! Device node installation

use std::path::PathBuf;

use common::{Error, Result};
use tracing::info;

use crate::errmsg;
use crate::store::{DEFAULT_ENUMERATOR, DeviceStore};

#[derive(Debug, Clone)]
pub struct InstallArgs {
    /// Path to the driver .inf file; must exist
    pub inf_path: PathBuf,
    /// Hardware id of the device node to create
    pub hardware_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub instance_id: String,
    pub reboot_required: bool,
}

/// Create a device node for the hardware id and register its driver
pub fn install(store: &mut DeviceStore, args: &InstallArgs) -> Result<InstallOutcome> {
    if !args.inf_path.is_file() {
        let err = Error::Config(format!("no such file: {}", args.inf_path.display()));
        errmsg("install", &args.hardware_id, &err);
        return Err(err);
    }

    let instance_id = store.add_device(
        &args.hardware_id,
        DEFAULT_ENUMERATOR,
        &args.inf_path.display().to_string(),
    );
    store.save()?;

    info!(
        "Installed {} from {}",
        instance_id,
        args.inf_path.display()
    );

    Ok(InstallOutcome {
        instance_id,
        reboot_required: false,
    })
}
