use crate::usb_id::HexCode;

/// Generate a libvirt `<hostdev>` fragment selecting a USB device by
/// vendor and product code.
pub fn generate_hostdev_xml(vendor: &HexCode, product: &HexCode) -> String {
    format!(
        r#"<hostdev mode='subsystem' type='usb'>
  <source>
    <vendor id='0x{vendor}'/>
    <product id='0x{product}'/>
  </source>
</hostdev>"#
    )
}
