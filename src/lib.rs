#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod hostdev_xml;
pub mod hotplug;
pub mod logging;
pub mod udev;
pub mod usb_id;
