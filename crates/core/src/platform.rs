//! Platform detection
//!
//! Provides the OS name using standard Unix conventions:
//! - macOS → `"darwin"` (kernel name)
//! - Linux → `"linux"`
//! - Windows → `"windows"`
//!
//! Platform info is cached on first access.

use std::sync::LazyLock;

/// Current platform information (cached)
///
/// # Example
/// ```
/// use lohup_core::platform::CURRENT_PLATFORM;
///
/// if CURRENT_PLATFORM.is_windows() {
///     println!("build files go under AppData");
/// }
/// ```
pub static CURRENT_PLATFORM: LazyLock<Platform> = LazyLock::new(Platform::detect);

/// Platform information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS: "darwin" (macOS), "linux", "windows", "unknown"
    pub os: &'static str,
}

impl Platform {
    /// Detect the platform this binary was compiled for
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Whether this is a Windows host
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    const fn detect_os() -> &'static str {
        #[cfg(target_os = "macos")]
        {
            "darwin"
        }

        #[cfg(target_os = "linux")]
        {
            "linux"
        }

        #[cfg(target_os = "windows")]
        {
            "windows"
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            "unknown"
        }
    }
}
