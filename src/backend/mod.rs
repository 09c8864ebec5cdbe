pub mod virsh;

use std::path::Path;

use crate::error::VfioError;

/// Which way a device is moving between host and guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Attach,
    Detach,
}

impl DeviceAction {
    /// The virsh subcommand implementing this action.
    pub fn virsh_command(self) -> &'static str {
        match self {
            Self::Attach => "attach-device",
            Self::Detach => "detach-device",
        }
    }

    /// Human-readable status line, e.g. `Attaching mouse to win10`.
    pub fn status_line(self, label: &str, vm: &str) -> String {
        match self {
            Self::Attach => format!("Attaching {label} to {vm}"),
            Self::Detach => format!("Detaching {label} from {vm}"),
        }
    }
}

pub trait Backend {
    /// Apply `action` for the device described by the XML file at `xml_path`.
    fn apply(&self, action: DeviceAction, vm: &str, xml_path: &Path) -> Result<(), VfioError>;
}

pub fn create_backend(program: impl Into<String>, connect: Option<String>) -> virsh::VirshBackend {
    virsh::VirshBackend::new(program, connect)
}
