// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{LauncherConfig, RawLauncherConfig};
use crate::errors::Result;

/// Read and deserialize a launcher file without validating it.
///
/// Durations are still strings here and nothing is range-checked.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawLauncherConfig> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(toml::from_str(&text)?)
}

/// Read a launcher file, fill in defaults and validate it.
///
/// Duration strings are parsed and ports, timeouts and backoff bounds are
/// checked; the first problem found is returned as a `ConfigError`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LauncherConfig> {
    LauncherConfig::try_from(load_from_path(path)?)
}

/// [`load_and_validate`] for a TOML document already in memory.
pub fn parse_and_validate(contents: &str) -> Result<LauncherConfig> {
    let raw: RawLauncherConfig = toml::from_str(contents)?;
    LauncherConfig::try_from(raw)
}

/// Base directory for the relative `script` and `working_dir` entries.
///
/// That is the directory holding the config file, or the process cwd when
/// the path is a bare file name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
