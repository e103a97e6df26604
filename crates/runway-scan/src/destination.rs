//! `-destination` selector strings.

use runway_core::{Device, Version};

/// Builds `platform=<name>[ Simulator][,id=<udid>]`.
///
/// The `Simulator` suffix and the `id` clause are only present when a device is known.
pub fn destination(platform_name: &str, device: Option<&Device>) -> String {
    let mut destination = format!("platform={platform_name}");
    if let Some(device) = device {
        if device.is_simulator {
            destination.push_str(" Simulator");
        }
        destination.push_str(",id=");
        destination.push_str(&device.udid);
    }
    destination
}

/// Desktop platform name understood by the given toolchain: `macOS` from version 8 on,
/// `OS X` before.
pub fn desktop_platform_name(toolchain: &Version) -> &'static str {
    if toolchain.major() >= 8 {
        "macOS"
    } else {
        "OS X"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runway_core::Platform;

    fn device(is_simulator: bool) -> Device {
        Device {
            name: "iPhone 8".to_string(),
            os_version: "14.0".to_string(),
            udid: "XYZ".to_string(),
            platform: Platform::Ios,
            is_simulator,
        }
    }

    #[test]
    fn test_simulator_destination() {
        assert_eq!(
            destination("iOS", Some(&device(true))),
            "platform=iOS Simulator,id=XYZ"
        );
    }

    #[test]
    fn test_physical_device_destination() {
        assert_eq!(
            destination("iOS", Some(&device(false))),
            "platform=iOS,id=XYZ"
        );
    }

    #[test]
    fn test_desktop_destination_by_toolchain() {
        let modern = Version::parse("9").unwrap();
        let legacy = Version::parse("7").unwrap();
        assert_eq!(
            destination(desktop_platform_name(&modern), None),
            "platform=macOS"
        );
        assert_eq!(
            destination(desktop_platform_name(&legacy), None),
            "platform=OS X"
        );
    }
}
