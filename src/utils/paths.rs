//! Cross-platform path utilities

use std::path::PathBuf;

const APP_DIR: &str = "callrange";

/// Get config directory
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir().map(|h| h.join(".config")) // keep dotfile layout on macOS
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
    }
}

/// `<config dir>/callrange/config.toml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}
