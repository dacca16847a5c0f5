//! Default locations used when the config does not override them

use lohup_core::platform::CURRENT_PLATFORM;
use std::path::PathBuf;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "lohup.toml";

/// Name of the per-user build directory
const BUILD_DIR_NAME: &str = "lohup";

/// Get the default build directory
///
/// Returns `/tmp/lohup`, or `~/AppData/Local/Temp/lohup` on Windows.
#[must_use]
pub fn default_build_dir() -> PathBuf {
    if CURRENT_PLATFORM.is_windows()
        && let Some(home) = ::dirs::home_dir()
    {
        return home
            .join("AppData")
            .join("Local")
            .join("Temp")
            .join(BUILD_DIR_NAME);
    }
    PathBuf::from("/tmp").join(BUILD_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dir_ends_with_lohup() {
        let dir = default_build_dir();
        assert_eq!(
            dir.file_name().and_then(|n| n.to_str()),
            Some(BUILD_DIR_NAME)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_build_dir_is_under_tmp_on_unix() {
        assert_eq!(default_build_dir(), PathBuf::from("/tmp/lohup"));
    }

    #[test]
    fn test_default_config_file_is_relative() {
        assert!(std::path::Path::new(DEFAULT_CONFIG_FILE).is_relative());
    }
}
