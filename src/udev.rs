//! udev rule generation.
//!
//! The `udev` subcommand prints one add/remove rule pair per configured
//! device. Installing them (e.g. into `/etc/udev/rules.d/`) is left to the
//! operator.

use crate::config::Config;
use crate::error::VfioError;
use crate::usb_id::UsbId;

/// Program name used when the running executable's path is unavailable.
const FALLBACK_PROGRAM: &str = "vfio-usb";

/// Generate the add/remove rule pair for one device.
///
/// `program` is the command prefix udev should run, e.g.
/// `/usr/local/bin/vfio-usb --config /etc/vfio-usb.conf`.
pub fn generate_udev_rule(id: &UsbId, program: &str) -> String {
    let vendor = &id.vendor;
    let product = &id.product;
    format!(
        r#"ACTION=="add", \
    SUBSYSTEM=="usb", \
    ENV{{ID_VENDOR_ID}}=="{vendor}", \
    ENV{{ID_MODEL_ID}}=="{product}", \
    RUN+="{program} add --vendor {vendor} --product {product}"
ACTION=="remove", \
    SUBSYSTEM=="usb", \
    ENV{{ID_VENDOR_ID}}=="{vendor}", \
    ENV{{ID_MODEL_ID}}=="{product}", \
    RUN+="{program} remove --vendor {vendor} --product {product}""#
    )
}

/// Generate rules for every configured device, in config order.
pub fn generate_udev_rules(config: &Config, program: &str) -> Result<String, VfioError> {
    let mut out = String::new();
    for entry in &config.devices {
        let raw = entry.id()?;
        let id: UsbId = raw.parse().map_err(|e: VfioError| VfioError::MalformedEntry {
            label: entry.label.clone(),
            message: e.to_string(),
        })?;
        out.push_str(&generate_udev_rule(&id, program));
        out.push('\n');
    }
    Ok(out)
}

/// The command udev should run to reach this program with the same config.
///
/// udev runs `RUN` programs from `/`, so both paths are absolute.
pub fn self_invocation(config: &Config) -> Result<String, VfioError> {
    let program = match std::env::current_exe() {
        Ok(exe) => rule_arg(&exe.display().to_string())?,
        Err(_) => FALLBACK_PROGRAM.to_string(),
    };
    let config_path = rule_arg(&config.path.display().to_string())?;
    Ok(format!("{program} --config {config_path}"))
}

/// Render one argument of a `RUN+="..."` command.
///
/// udev splits on whitespace unless an argument is single-quoted, and
/// expands `%` and `$` unless doubled. Quotes and backslashes have no
/// escape, so paths containing them are refused.
fn rule_arg(arg: &str) -> Result<String, VfioError> {
    if let Some(c) = arg
        .chars()
        .find(|&c| matches!(c, '\'' | '"' | '\\') || c.is_control())
    {
        return Err(VfioError::UnsupportedRulePath {
            path: arg.to_string(),
            message: format!("contains {c:?}"),
        });
    }
    let escaped = arg.replace('%', "%%").replace('$', "$$");
    if escaped.chars().any(char::is_whitespace) {
        Ok(format!("'{escaped}'"))
    } else {
        Ok(escaped)
    }
}
