use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, Visitor};

use crate::error::VfioError;

/// Top-level key holding the label → device mapping.
pub const DEVICES_KEY: &str = "usb-devices";

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vfio-usb.conf";

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "usb-devices", deserialize_with = "ordered_devices")]
    usb_devices: Vec<DeviceEntry>,
}

/// One `usb-devices` entry.
///
/// `id` and `vm` are optional here: a missing field is only an error once
/// the entry is actually used for matching or rule generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub label: String,
    pub id: Option<String>,
    pub vm: Option<String>,
}

impl DeviceEntry {
    pub fn id(&self) -> Result<&str, VfioError> {
        self.id.as_deref().ok_or_else(|| self.missing("id"))
    }

    pub fn vm(&self) -> Result<&str, VfioError> {
        self.vm.as_deref().ok_or_else(|| self.missing("vm"))
    }

    fn missing(&self, field: &str) -> VfioError {
        VfioError::MalformedEntry {
            label: self.label.clone(),
            message: format!("missing '{field}'"),
        }
    }
}

/// Result of a successful [`Config::match_id`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMatch<'a> {
    pub label: &'a str,
    pub vm: &'a str,
}

/// Device mapping in file order, plus where it was loaded from.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonicalized path to the config file.
    pub path: PathBuf,
    pub devices: Vec<DeviceEntry>,
}

impl Config {
    /// Find the first device (in file order) whose id equals `id` exactly.
    ///
    /// Comparison is case-sensitive. Entries after the first match are not
    /// inspected, so a malformed entry further down does not fail a lookup.
    pub fn match_id(&self, id: &str) -> Result<Option<DeviceMatch<'_>>, VfioError> {
        for entry in &self.devices {
            if entry.id()? == id {
                return Ok(Some(DeviceMatch {
                    label: &entry.label,
                    vm: entry.vm()?,
                }));
            }
        }
        Ok(None)
    }
}

// ── parsing ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    vm: Option<String>,
}

/// Reads `usb-devices` as a list so file order survives. Scalars are taken
/// as their literal text: `vm: 0x10` stays `"0x10"`.
fn ordered_devices<'de, D>(deserializer: D) -> Result<Vec<DeviceEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(DevicesVisitor)
}

struct DevicesVisitor;

impl<'de> Visitor<'de> for DevicesVisitor {
    type Value = Vec<DeviceEntry>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{DEVICES_KEY}` to be a mapping of device labels to {{id, vm}}")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut devices: Vec<DeviceEntry> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(label) = map.next_key::<String>()? {
            if devices.iter().any(|d| d.label == label) {
                return Err(de::Error::custom(format_args!(
                    "duplicate device label `{label}`"
                )));
            }
            let RawEntry { id, vm } = map.next_value()?;
            devices.push(DeviceEntry { label, id, vm });
        }
        Ok(devices)
    }
}

// ── public API ────────────────────────────────────────────

/// Load the device mapping from `path`.
///
/// Every failure (unreadable file, bad YAML, missing `usb-devices`) is
/// reported as [`VfioError::InvalidConfig`]. There is no partial result.
pub fn load_config(path: &Path) -> Result<Config, VfioError> {
    let invalid = |reason: String| VfioError::InvalidConfig {
        path: path.display().to_string(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let raw: RawConfig = serde_yaml::from_str(&contents).map_err(|e| invalid(e.to_string()))?;
    let devices = raw.usb_devices;
    let canonical = path.canonicalize().map_err(|e| invalid(e.to_string()))?;

    tracing::debug!(path = %canonical.display(), devices = devices.len(), "loaded config");

    Ok(Config {
        path: canonical,
        devices,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn entry(label: &str, id: &str, vm: &str) -> DeviceEntry {
        DeviceEntry {
            label: label.into(),
            id: Some(id.into()),
            vm: Some(vm.into()),
        }
    }

    pub fn test_config(devices: Vec<DeviceEntry>) -> Config {
        Config {
            path: PathBuf::from("/etc/vfio-usb.conf"),
            devices,
        }
    }

    fn load_str(contents: &str) -> Result<Config, VfioError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vfio-usb.conf");
        std::fs::write(&path, contents).unwrap();
        load_config(&path)
    }

    #[test]
    fn load_preserves_file_order() {
        let config = load_str(
            r#"
usb-devices:
  zebra:
    id: "1111:2222"
    vm: one
  alpha:
    id: "3333:4444"
    vm: two
  mouse:
    id: "046d:c077"
    vm: win10
"#,
        )
        .unwrap();
        let labels: Vec<&str> = config.devices.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["zebra", "alpha", "mouse"]);
        assert_eq!(config.devices[2], entry("mouse", "046d:c077", "win10"));
        assert!(config.path.is_absolute());
    }

    #[test]
    fn load_keeps_unquoted_ids_as_strings() {
        let config = load_str("usb-devices:\n  kbd:\n    id: 0000:0001\n    vm: 42\n").unwrap();
        assert_eq!(config.devices[0].id.as_deref(), Some("0000:0001"));
        assert_eq!(config.devices[0].vm.as_deref(), Some("42"));
    }

    #[test]
    fn load_keeps_literal_scalar_text() {
        let config = load_str(
            r#"
usb-devices:
  hex:
    id: "1234:5678"
    vm: 0x10
  version:
    id: "1234:5679"
    vm: 1.10
  exponent:
    id: "1234:567a"
    vm: 1e3
  flag:
    id: "1234:567b"
    vm: true
  2024:
    id: "1234:567c"
    vm: +5
"#,
        )
        .unwrap();
        let vms: Vec<&str> = config.devices.iter().map(|d| d.vm.as_deref().unwrap()).collect();
        assert_eq!(vms, ["0x10", "1.10", "1e3", "true", "+5"]);
        assert_eq!(config.devices[4].label, "2024");
    }

    #[test]
    fn matched_vm_name_is_passed_through_verbatim() {
        let config = load_str("usb-devices:\n  pad:\n    id: \"046d:c077\"\n    vm: 007\n").unwrap();
        let found = config.match_id("046d:c077").unwrap().unwrap();
        assert_eq!(found.vm, "007");
    }

    #[test]
    fn load_rejects_duplicate_labels() {
        let err = load_str(
            "usb-devices:\n  a: {id: \"1234:5678\", vm: x}\n  a: {id: \"1234:5679\", vm: y}\n",
        )
        .unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
    }

    #[test]
    fn load_rejects_non_mapping_entry() {
        let err = load_str("usb-devices:\n  mouse: just-a-string\n").unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
    }

    #[test]
    fn load_ignores_unrelated_top_level_keys() {
        let config = load_str("other: 1\nusb-devices:\n  a: {id: \"1234:5678\", vm: x}\n").unwrap();
        assert_eq!(config.devices.len(), 1);
    }

    #[test]
    fn load_defers_missing_fields() {
        let config = load_str("usb-devices:\n  broken: {vm: x}\n  novm: {id: \"1234:5678\"}\n")
            .unwrap();
        assert_eq!(config.devices[0].id, None);
        assert_eq!(config.devices[1].vm, None);
    }

    #[test]
    fn load_rejects_missing_key() {
        let err = load_str("devices:\n  a: {id: \"1234:5678\", vm: x}\n").unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
        assert!(err.to_string().contains("usb-devices"), "got: {err}");
    }

    #[test]
    fn load_rejects_non_mapping_devices() {
        let err = load_str("usb-devices:\n  - a\n  - b\n").unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
    }

    #[test]
    fn load_rejects_bad_yaml() {
        let err = load_str("usb-devices: [unclosed\n").unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = load_config(Path::new("/nonexistent/vfio-usb.conf")).unwrap_err();
        assert!(matches!(err, VfioError::InvalidConfig { .. }));
        assert!(err.to_string().contains("/nonexistent/vfio-usb.conf"));
    }

    #[test]
    fn match_returns_first_in_order() {
        let config = test_config(vec![
            entry("first", "1234:5678", "vm-a"),
            entry("second", "1234:5678", "vm-b"),
        ]);
        let found = config.match_id("1234:5678").unwrap().unwrap();
        assert_eq!(found.label, "first");
        assert_eq!(found.vm, "vm-a");
    }

    #[test]
    fn match_not_found() {
        let config = test_config(vec![entry("mouse", "046d:c077", "win10")]);
        assert_eq!(config.match_id("0000:0000").unwrap(), None);
    }

    #[test]
    fn match_is_case_sensitive() {
        let config = test_config(vec![entry("mouse", "046d:c077", "win10")]);
        assert_eq!(config.match_id("046D:C077").unwrap(), None);
    }

    #[test]
    fn match_reports_entry_without_id() {
        let mut broken = entry("broken", "", "x");
        broken.id = None;
        let config = test_config(vec![broken, entry("mouse", "046d:c077", "win10")]);
        let err = config.match_id("046d:c077").unwrap_err();
        assert!(matches!(err, VfioError::MalformedEntry { ref label, .. } if label == "broken"));
    }

    #[test]
    fn match_stops_before_later_malformed_entries() {
        let mut broken = entry("broken", "", "x");
        broken.id = None;
        let config = test_config(vec![entry("mouse", "046d:c077", "win10"), broken]);
        assert!(config.match_id("046d:c077").unwrap().is_some());
    }

    #[test]
    fn match_reports_matched_entry_without_vm() {
        let mut novm = entry("novm", "046d:c077", "");
        novm.vm = None;
        let config = test_config(vec![novm]);
        let err = config.match_id("046d:c077").unwrap_err();
        assert!(err.to_string().contains("missing 'vm'"));
    }
}
