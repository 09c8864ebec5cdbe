//! Attach and detach configured USB devices on hotplug events.

use std::io::Write;

use crate::backend::{Backend, DeviceAction};
use crate::config::Config;
use crate::error::VfioError;
use crate::hostdev_xml;
use crate::usb_id::UsbId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugOutcome {
    /// The device matched `label` and the backend was invoked for `vm`.
    Applied { label: String, vm: String },
    /// No configured device has this id; nothing was done.
    NoMatch,
}

pub fn attach(config: &Config, backend: &impl Backend, id: &UsbId) -> Result<HotplugOutcome, VfioError> {
    apply(config, backend, DeviceAction::Attach, id)
}

pub fn detach(config: &Config, backend: &impl Backend, id: &UsbId) -> Result<HotplugOutcome, VfioError> {
    apply(config, backend, DeviceAction::Detach, id)
}

fn apply(
    config: &Config,
    backend: &impl Backend,
    action: DeviceAction,
    id: &UsbId,
) -> Result<HotplugOutcome, VfioError> {
    let key = id.to_string();
    let Some(found) = config.match_id(&key)? else {
        tracing::warn!(id = %key, config = %config.path.display(), "no configured device matches");
        return Ok(HotplugOutcome::NoMatch);
    };

    let xml = hostdev_xml::generate_hostdev_xml(&id.vendor, &id.product);

    let mut xml_file = tempfile::Builder::new()
        .prefix("vfio-usb-")
        .suffix(".xml")
        .tempfile()
        .map_err(|e| VfioError::Io {
            context: "creating hostdev XML file".into(),
            source: e,
        })?;
    let xml_path = xml_file.path().to_path_buf();
    xml_file
        .write_all(xml.as_bytes())
        .and_then(|()| xml_file.flush())
        .map_err(|e| VfioError::Io {
            context: format!("writing {}", xml_path.display()),
            source: e,
        })?;

    println!("{}", action.status_line(found.label, found.vm));

    // virsh's result never changes our exit status; it is only reported.
    if let Err(e) = backend.apply(action, found.vm, &xml_path) {
        tracing::warn!(label = found.label, vm = found.vm, "{e}");
    }

    xml_file.close().map_err(|e| VfioError::Io {
        context: format!("removing {}", xml_path.display()),
        source: e,
    })?;

    Ok(HotplugOutcome::Applied {
        label: found.label.to_string(),
        vm: found.vm.to_string(),
    })
}
