//! Centralized path resolution for console-local files.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Directory name under the platform config dir.
const APP_DIR: &str = "opsdesk";

/// Resolves where console-local state lives on disk.
///
/// An explicit base directory overrides the platform default, which is
/// what tests and portable installs use.
#[derive(Debug, Clone)]
pub struct ConsolePaths {
    base: Option<PathBuf>,
}

impl ConsolePaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// The base config directory, created on demand by writers.
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        let dir = dirs::config_dir().context("no platform config directory available")?;
        Ok(dir.join(APP_DIR))
    }

    /// Location of the key-value store document (templates, activity).
    pub fn store_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("console_state.toml"))
    }
}

impl Default for ConsolePaths {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_base_wins() {
        let paths = ConsolePaths::new(Some(PathBuf::from("/tmp/opsdesk-test")));
        assert_eq!(
            paths.store_file().unwrap(),
            PathBuf::from("/tmp/opsdesk-test/console_state.toml")
        );
    }
}
