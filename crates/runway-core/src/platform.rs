use std::fmt;

/// Platform family of a project or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Tvos,
    Macos,
    Other,
}

impl Platform {
    /// Infers the platform from an SDK or platform name such as `iphonesimulator`.
    ///
    /// SDK paths are reduced to their last component (`.../iPhoneOS14.0.sdk`).
    pub fn from_sdk_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        if name.starts_with("iphone") {
            Some(Platform::Ios)
        } else if name.starts_with("appletv") {
            Some(Platform::Tvos)
        } else if name.starts_with("macosx") {
            Some(Platform::Macos)
        } else if name.is_empty() {
            None
        } else {
            Some(Platform::Other)
        }
    }

    /// Name used by simulator runtimes and `-destination` strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Tvos => "tvOS",
            Platform::Macos => "macOS",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
