use std::fmt;
use std::str::FromStr;

use crate::error::VfioError;

/// A four-digit hexadecimal USB vendor or product code, e.g. `046d`.
///
/// Case is kept as given. Matching against the config is case-sensitive,
/// and udev reports these codes in lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexCode(String);

impl HexCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HexCode {
    type Err = VfioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VfioError::InvalidUsbId {
                value: s.to_string(),
                message: "expected exactly 4 hex digits".into(),
            });
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for HexCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vendor/product pair, written `VVVV:PPPP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbId {
    pub vendor: HexCode,
    pub product: HexCode,
}

impl UsbId {
    pub fn new(vendor: HexCode, product: HexCode) -> Self {
        Self { vendor, product }
    }
}

impl FromStr for UsbId {
    type Err = VfioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vendor, product) = s.split_once(':').ok_or_else(|| VfioError::InvalidUsbId {
            value: s.to_string(),
            message: "expected VVVV:PPPP".into(),
        })?;
        Ok(Self {
            vendor: vendor.parse()?,
            product: product.parse()?,
        })
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vendor, self.product)
    }
}
