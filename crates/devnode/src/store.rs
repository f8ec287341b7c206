//! Persisted device-node and class-filter store
//!
//! One TOML document holds the installed device nodes and, per device
//! class, one ordered filter driver list per level (upper/lower). The
//! document is only written back when its contents actually changed;
//! callers decide that and invoke [`DeviceStore::save`] explicitly.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classfilter::FilterLevel;
use crate::errmsg;

/// Enumerator the install command registers nodes under
pub const DEFAULT_ENUMERATOR: &str = "ROOT";

/// One installed device node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceNode {
    /// Unique instance identifier, `<enumerator>\<hwid>\NNNN`
    pub instance_id: String,
    /// Hardware identifier the node was installed with
    pub hardware_id: String,
    /// Enumerator the node belongs to
    pub enumerator: String,
    /// Driver package the node was installed from
    pub inf_path: String,
}

/// Filter driver lists of one device class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFilters {
    #[serde(default)]
    pub upper: Vec<String>,
    #[serde(default)]
    pub lower: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    devices: Vec<DeviceNode>,
    #[serde(default)]
    class_filters: BTreeMap<String, ClassFilters>,
}

/// The store plus the path it persists to
#[derive(Debug)]
pub struct DeviceStore {
    path: PathBuf,
    data: StoreData,
}

impl DeviceStore {
    /// Default store location under the user configuration directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vusb")
            .join("devnode.toml")
    }

    /// Load the store, or start empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = if path.is_file() {
            let raw = fs::read_to_string(&path).inspect_err(|e| {
                errmsg("read_store", &path.display().to_string(), e);
            })?;
            toml::from_str(&raw).map_err(|e| {
                errmsg("parse_store", &path.display().to_string(), &e);
                Error::Store(format!("invalid store file: {}", e))
            })?
        } else {
            StoreData::default()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn devices(&self) -> &[DeviceNode] {
        &self.data.devices
    }

    /// Register a device node and return its generated instance id
    pub fn add_device(&mut self, hardware_id: &str, enumerator: &str, inf_path: &str) -> String {
        let ordinal = self
            .data
            .devices
            .iter()
            .filter(|d| d.hardware_id == hardware_id)
            .count();
        let instance_id = format!("{}\\{}\\{:04}", enumerator, hardware_id, ordinal);

        self.data.devices.push(DeviceNode {
            instance_id: instance_id.clone(),
            hardware_id: hardware_id.to_string(),
            enumerator: enumerator.to_string(),
            inf_path: inf_path.to_string(),
        });

        debug!("Registered device node {}", instance_id);
        instance_id
    }

    /// Drop a device node by instance id
    pub fn remove_device(&mut self, instance_id: &str) -> Result<()> {
        let before = self.data.devices.len();
        self.data.devices.retain(|d| d.instance_id != instance_id);

        if self.data.devices.len() == before {
            return Err(Error::Store(format!(
                "no device node with instance id {}",
                instance_id
            )));
        }

        debug!("Dropped device node {}", instance_id);
        Ok(())
    }

    /// The ordered filter list of a class at the given level
    pub fn filters(&self, level: FilterLevel, class_name: &str) -> &[String] {
        self.data
            .class_filters
            .get(class_name)
            .map(|c| match level {
                FilterLevel::Upper => c.upper.as_slice(),
                FilterLevel::Lower => c.lower.as_slice(),
            })
            .unwrap_or(&[])
    }

    pub fn set_filters(&mut self, level: FilterLevel, class_name: &str, list: Vec<String>) {
        let entry = self
            .data
            .class_filters
            .entry(class_name.to_string())
            .or_default();
        match level {
            FilterLevel::Upper => entry.upper = list,
            FilterLevel::Lower => entry.lower = list,
        }
    }

    /// Persist the store
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).inspect_err(|e| {
                errmsg("create_store_dir", &parent.display().to_string(), e);
            })?;
        }

        let raw = toml::to_string_pretty(&self.data)
            .map_err(|e| Error::Store(format!("serialize store: {}", e)))?;
        fs::write(&self.path, raw).inspect_err(|e| {
            errmsg("write_store", &self.path.display().to_string(), e);
        })?;

        debug!("Store written to {}", self.path.display());
        Ok(())
    }
}
