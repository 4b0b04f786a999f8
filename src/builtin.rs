//! Bundled profiles for common pads, registered by [`ControllerRegistry::builtin`].
//!
//! [`ControllerRegistry::builtin`]: crate::profile::ControllerRegistry::builtin

use std::collections::HashMap;

use crate::profile::{ControllerProfile, DeviceId};

pub const MICROSOFT_VENDOR_ID: u16 = 1118;
pub const XB1S_WIRED_PRODUCT_ID: u16 = 746;
pub const XB1S_WIRELESS_PRODUCT_ID: u16 = 736;

pub const SONY_VENDOR_ID: u16 = 1356;
pub const DS4_PRODUCT_ID: u16 = 2508;

const DS4_MOTION_NODE: &str = "Sony Interactive Entertainment Wireless Controller Motion Sensors";
const DS4_TOUCHPAD_NODE: &str = "Sony Interactive Entertainment Wireless Controller Touchpad";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn profiles() -> Vec<ControllerProfile> {
    vec![wired_xbox_one_s(), wireless_xbox_one_s(), dualshock4()]
}

/// Wired XBox One S pad. Codes and ranges differ from the same pad over bluetooth.
pub fn wired_xbox_one_s() -> ControllerProfile {
    ControllerProfile {
        name: "Wired XBox One S".to_string(),
        ids: vec![DeviceId::new(MICROSOFT_VENDOR_ID, XB1S_WIRED_PRODUCT_ID)],
        buttons: strings(&[
            "X:307:square",
            "Y:308:triangle",
            "B:305:circle",
            "A:304:cross",
            "Right Stick:318:rs",
            "Left Stick:317:ls",
            "View:314:select",
            "Menu:315:start",
            "XBox:316:home",
            "LB:310:l1",
            "RB:311:r1",
        ]),
        centred_axes: strings(&[
            "Left Horizontal:-32768:32768:0:lx",
            "Left Vertical:32768:-32768:1:ly",
            "Right Horizontal:-32768:32768:3:rx",
            "Right Vertical:32768:-32768:4:ry",
        ]),
        trigger_axes: strings(&["Left Trigger:0:1023:2:lt", "Right Trigger:0:1023:5:rt"]),
        binary_axes: strings(&["D-pad Horizontal:16:dleft:dright", "D-pad Vertical:17:dup:ddown"]),
        dead_zone: Some(0.1),
        hot_zone: Some(0.05),
        node_mappings: HashMap::new(),
    }
}

pub fn wireless_xbox_one_s() -> ControllerProfile {
    ControllerProfile {
        name: "Wireless XBox One S".to_string(),
        ids: vec![DeviceId::new(MICROSOFT_VENDOR_ID, XB1S_WIRELESS_PRODUCT_ID)],
        buttons: strings(&[
            "X:306:square",
            "Y:307:triangle",
            "B:305:circle",
            "A:304:cross",
            "Right Stick:313:rs",
            "Left Stick:312:ls",
            "View:310:select",
            "Menu:311:start",
            "XBox:139:home",
            "LB:308:l1",
            "RB:309:r1",
        ]),
        centred_axes: strings(&[
            "Left Horizontal:0:65535:0:lx",
            "Left Vertical:65535:0:1:ly",
            "Right Horizontal:0:65535:3:rx",
            "Right Vertical:65535:0:4:ry",
        ]),
        trigger_axes: strings(&["Left Trigger:0:1023:2:lt", "Right Trigger:0:1023:5:rt"]),
        binary_axes: strings(&["D-pad Horizontal:16:dleft:dright", "D-pad Vertical:17:dup:ddown"]),
        dead_zone: Some(0.1),
        hot_zone: Some(0.05),
        node_mappings: HashMap::new(),
    }
}

/// DualShock 4 on the hid-sony driver. The pad shows up as three nodes; motion
/// sensor axes reuse the stick codes so they're routed through a prefix.
pub fn dualshock4() -> ControllerProfile {
    let mut node_mappings = HashMap::new();
    node_mappings.insert(DS4_MOTION_NODE.to_string(), "motion".to_string());
    node_mappings.insert(DS4_TOUCHPAD_NODE.to_string(), "touchpad".to_string());

    ControllerProfile {
        name: "DualShock4".to_string(),
        ids: vec![DeviceId::new(SONY_VENDOR_ID, DS4_PRODUCT_ID)],
        buttons: strings(&[
            "Cross:304:cross",
            "Circle:305:circle",
            "Triangle:307:triangle",
            "Square:308:square",
            "L1:310:l1",
            "R1:311:r1",
            "L2:312:l2",
            "R2:313:r2",
            "Share:314:select",
            "Options:315:start",
            "PS:316:home",
            "Left Stick:317:ls",
            "Right Stick:318:rs",
        ]),
        centred_axes: strings(&[
            "Left Horizontal:0:255:0:lx",
            "Left Vertical:255:0:1:ly",
            "Right Horizontal:0:255:3:rx",
            "Right Vertical:255:0:4:ry",
            "Accel X:-32768:32768:motion/0:ax",
            "Accel Y:-32768:32768:motion/1:ay",
            "Accel Z:-32768:32768:motion/2:az",
            "Gyro X:-32768:32768:motion/3:gx",
            "Gyro Y:-32768:32768:motion/4:gy",
            "Gyro Z:-32768:32768:motion/5:gz",
        ]),
        trigger_axes: strings(&["Left Trigger:0:255:2:lt", "Right Trigger:0:255:5:rt"]),
        binary_axes: strings(&["D-pad Horizontal:16:dleft:dright", "D-pad Vertical:17:dup:ddown"]),
        dead_zone: Some(0.05),
        hot_zone: Some(0.05),
        node_mappings,
    }
}
