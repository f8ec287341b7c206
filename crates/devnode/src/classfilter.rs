//! Class filter driver list maintenance
//!
//! Each device class carries one ordered driver-name list per filter
//! level. Add drops any existing occurrence before appending, so a name
//! appears at most once; remove is an exact match. The store is written
//! back only when the resulting list differs from what was read.

use common::Result;
use tracing::{debug, info};

use crate::store::DeviceStore;

/// Filter level within a class's driver stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterLevel {
    Upper,
    Lower,
}

impl FilterLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterLevel::Upper => "upper",
            FilterLevel::Lower => "lower",
        }
    }
}

impl std::fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClassFilterArgs {
    pub level: FilterLevel,
    pub class_name: String,
    pub driver_name: String,
}

/// Add or remove a filter driver; returns whether the persisted list changed
pub fn classfilter(store: &mut DeviceStore, args: &ClassFilterArgs, add: bool) -> Result<bool> {
    let current = store.filters(args.level, &args.class_name).to_vec();

    let mut next: Vec<String> = current
        .iter()
        .filter(|name| **name != args.driver_name)
        .cloned()
        .collect();
    if add {
        next.push(args.driver_name.clone());
    }

    if next == current {
        debug!(
            "{} filters of class {} already up to date",
            args.level, args.class_name
        );
        return Ok(false);
    }

    store.set_filters(args.level, &args.class_name, next);
    store.save()?;

    info!(
        "{} {} filter {} for class {}",
        if add { "Added" } else { "Removed" },
        args.level,
        args.driver_name,
        args.class_name
    );
    Ok(true)
}
