//! Versioned partition names.

use crate::config::{Config, Role};

/// The current shell and data partition names for one app, role and version.
///
/// Names follow `<app>-<role>-cache-v<version>` and `<app>-<role>-data-v<version>`.
/// The `<app>-<role>-cache-` / `<app>-<role>-data-` prefixes identify partitions
/// this worker owns; anything else in the registry is left alone on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    pub shell: String,
    pub data: String,
    pub shell_prefix: String,
    pub data_prefix: String,
    pub version: String,
}

impl PartitionNames {
    pub fn new(app: &str, role: Role, version: &str) -> Self {
        let shell_prefix = format!("{}-{}-cache-", app, role);
        let data_prefix = format!("{}-{}-data-", app, role);
        Self {
            shell: format!("{}v{}", shell_prefix, version),
            data: format!("{}v{}", data_prefix, version),
            shell_prefix,
            data_prefix,
            version: version.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.app_name, config.role, &config.version)
    }

    /// Role prefixes owned by this worker.
    pub fn prefixes(&self) -> [&str; 2] {
        [&self.shell_prefix, &self.data_prefix]
    }

    /// Names that survive activation.
    pub fn current(&self) -> [&str; 2] {
        [&self.shell, &self.data]
    }
}
