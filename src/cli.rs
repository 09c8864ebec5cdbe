use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::usb_id::{HexCode, UsbId};

#[derive(Parser, Debug)]
#[command(name = "vfio-usb", about = "VFIO-USB handler: attach USB devices to libvirt VMs on hotplug")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// virsh binary used to attach and detach devices
    #[arg(long, global = true, env = "VFIO_USB_VIRSH", default_value = "virsh")]
    pub virsh: String,

    /// libvirt connection URI passed to virsh (e.g. qemu:///system)
    #[arg(long, global = true, env = "VFIO_USB_CONNECT")]
    pub connect: Option<String>,

    /// Append debug logs to this file (udev discards stdout/stderr)
    #[arg(long, global = true, env = "VFIO_USB_LOG")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attaches device to configured VM
    Add(DeviceArgs),

    /// Detaches device from configured VM
    Remove(DeviceArgs),

    /// Generate udev rules
    Udev,
}

#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// USB vendor id (4 hex digits, e.g. 046d)
    #[arg(long)]
    pub vendor: HexCode,

    /// USB product id (4 hex digits, e.g. c077)
    #[arg(long)]
    pub product: HexCode,
}

impl DeviceArgs {
    pub fn usb_id(&self) -> UsbId {
        UsbId::new(self.vendor.clone(), self.product.clone())
    }
}
