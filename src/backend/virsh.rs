use std::path::Path;
use std::process::{Command, Stdio};

use super::{Backend, DeviceAction};
use crate::error::VfioError;

/// Runs `virsh attach-device` / `virsh detach-device`.
#[derive(Debug, Clone)]
pub struct VirshBackend {
    program: String,
    /// libvirt URI passed as `virsh -c`; virsh picks its default when unset.
    connect: Option<String>,
}

impl VirshBackend {
    pub fn new(program: impl Into<String>, connect: Option<String>) -> Self {
        Self {
            program: program.into(),
            connect,
        }
    }

    fn command(&self, action: DeviceAction, vm: &str, xml_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(uri) = &self.connect {
            cmd.args(["-c", uri]);
        }
        cmd.args([action.virsh_command(), vm]).arg(xml_path);
        cmd
    }
}

impl Backend for VirshBackend {
    fn apply(&self, action: DeviceAction, vm: &str, xml_path: &Path) -> Result<(), VfioError> {
        let command = format!("{} {}", self.program, action.virsh_command());
        tracing::debug!(%command, vm, xml = %xml_path.display(), "running virsh");

        let output = self
            .command(action, vm, xml_path)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| VfioError::ExternalCommand {
                command: command.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(vm, "virsh: {}", stdout.trim());
        }

        if !output.status.success() {
            return Err(VfioError::ExternalCommand {
                command,
                message: format!("exited with {}", output.status),
            });
        }

        tracing::info!(vm, action = action.virsh_command(), "virsh completed");
        Ok(())
    }
}
