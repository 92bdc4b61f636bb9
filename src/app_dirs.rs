//! Resolve the configuration directory for `codesift`.
//!
//! An environment override wins; otherwise the platform location provided by
//! the `directories` crate is used.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "codesift";
const APPLICATION: &str = "codesift";

/// Environment variable that replaces the platform configuration directory.
pub const CONFIG_DIR_ENV: &str = "CODESIFT_CONFIG_DIR";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| anyhow!("unable to determine project directories for codesift"))
}

/// Resolve an override directory from an environment variable.
///
/// An empty string is treated the same as an unset value.
fn dir_from_env(name: &str) -> Option<PathBuf> {
    let value = env::var_os(name)?;
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

/// Return the directory holding the user's `config.toml`.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = dir_from_env(CONFIG_DIR_ENV) {
        return Ok(dir);
    }

    Ok(project_dirs()?.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_override_is_ignored() {
        assert_eq!(dir_from_env("CODESIFT_TEST_UNSET_DIRECTORY_OVERRIDE"), None);
    }

    #[test]
    fn config_dir_mentions_application() {
        if env::var_os(CONFIG_DIR_ENV).is_some() {
            return;
        }
        if let Ok(dir) = get_config_dir() {
            assert!(dir.to_string_lossy().contains("codesift"));
        }
    }
}
