//! vusb drivers installation utility
//!
//! Creates and removes the virtual host controller's device nodes and
//! maintains the per-class filter driver lists.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::setup_logging;
use devnode::{
    ClassFilterArgs, DeviceStore, FilterLevel, InstallArgs, RemoveArgs, classfilter, install,
    remove,
};

#[derive(Parser, Debug)]
#[command(name = "vusb-devnode")]
#[command(author, version, about = "vusb drivers installation utility")]
#[command(long_about = "
Manage the device nodes and class filter registrations of the vusb
virtual host controller.

EXAMPLES:
    # Install the controller device node
    vusb-devnode install vusb.inf VUSB\\VHCI

    # List what a removal would touch, without removing anything
    vusb-devnode remove VUSB\\VHCI --dry-run

    # Register the filter driver below every USB class device
    vusb-devnode classfilter add lower USB vusb_filter
")]
struct Args {
    /// Override the store location
    #[arg(long, value_name = "PATH")]
    store: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install a device node and its driver
    Install {
        /// Path to driver .inf file
        infpath: PathBuf,
        /// Hardware id of the device
        hwid: String,
    },
    /// Uninstall devices and remove their device nodes
    Remove {
        /// Hardware id of the device
        hwid: String,
        /// An identifier of a device enumerator
        enumerator: Option<String>,
        /// Print instance ids of devices that would be removed instead of
        /// removing them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Add or remove a class filter driver
    #[command(subcommand)]
    Classfilter(ClassFilterCommand),
}

#[derive(Subcommand, Debug)]
enum ClassFilterCommand {
    /// Add a class filter driver
    Add {
        #[arg(value_parser = ["upper", "lower"])]
        level: String,
        /// A name of a device setup class
        class_name: String,
        /// Filter driver name
        driver_name: String,
    },
    /// Remove a class filter driver
    Remove {
        #[arg(value_parser = ["upper", "lower"])]
        level: String,
        /// A name of a device setup class
        class_name: String,
        /// Filter driver name
        driver_name: String,
    },
}

fn filter_level(level: &str) -> FilterLevel {
    match level {
        "upper" => FilterLevel::Upper,
        _ => FilterLevel::Lower,
    }
}

fn store_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
        None => DeviceStore::default_path(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level).context("Failed to setup logging")?;

    let path = store_path(args.store.as_deref());
    let mut store =
        DeviceStore::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;

    match args.command {
        Command::Install { infpath, hwid } => {
            let outcome = install(
                &mut store,
                &InstallArgs {
                    inf_path: infpath,
                    hardware_id: hwid,
                },
            )?;
            println!("{}", outcome.instance_id);
            if outcome.reboot_required {
                println!("Reboot is recommended");
            }
        }
        Command::Remove {
            hwid,
            enumerator,
            dry_run,
        } => {
            let outcome = remove(
                &mut store,
                &RemoveArgs {
                    hardware_id: hwid,
                    enumerator,
                    dry_run,
                },
            )?;
            if dry_run {
                for instance_id in &outcome.matched {
                    println!("{}", instance_id);
                }
            }
            if outcome.reboot_required {
                println!("Reboot is recommended");
            }
        }
        Command::Classfilter(cmd) => {
            let (raw_level, class_name, driver_name, add) = match cmd {
                ClassFilterCommand::Add {
                    level,
                    class_name,
                    driver_name,
                } => (level, class_name, driver_name, true),
                ClassFilterCommand::Remove {
                    level,
                    class_name,
                    driver_name,
                } => (level, class_name, driver_name, false),
            };
            classfilter(
                &mut store,
                &ClassFilterArgs {
                    level: filter_level(&raw_level),
                    class_name,
                    driver_name,
                },
                add,
            )?;
        }
    }

    Ok(())
}
