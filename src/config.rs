// Parse a TOML configuration file into DaxConfig.
//
// The config file mirrors the CLI arguments defined in arg_parser so that
// the same set of parameters can be supplied via file instead of flags.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::DaxError;
use crate::fill::{FillMode, PATTERN_SIZE};

// default values for config parameters
pub const DEFAULT_DEVICE: &str = "dax0.0";
pub const DEFAULT_STEP_SIZE: usize = 64; // 64 bytes
pub const DEFAULT_ALIGNMENT: usize = 2 * 1024 * 1024; // 2 MiB
pub const DEFAULT_MAX_PATH_LEN: usize = 256;
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/bus/dax/devices";
pub const DEFAULT_DEV_ROOT: &str = "/dev";

/// Raw deserialized representation of the TOML config file.
/// All fields are optional during deserialization, missing fields keep their
/// default value. Can be checked with validate()
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DaxConfig {
    pub device: String,
    pub step_size: usize,
    pub fill_mode: FillMode,
    pub alignment: usize,
    pub max_path_len: usize,
    pub sysfs_root: PathBuf,
    pub dev_root: PathBuf,
}

impl Default for DaxConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            step_size: DEFAULT_STEP_SIZE,
            fill_mode: FillMode::Reference,
            alignment: DEFAULT_ALIGNMENT,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dev_root: PathBuf::from(DEFAULT_DEV_ROOT),
        }
    }
}

impl DaxConfig {
    /// Read and parse a TOML config file from the given path.
    pub fn from_file(path: &str) -> Result<Self, DaxError> {
        let content = fs::read_to_string(path)
            .map_err(|e| DaxError::Config(format!("Failed to read config file '{}': {}", path, e)))?;

        Self::from_toml(&content)
            .map_err(|e| DaxError::Config(format!("Failed to parse config file '{}': {}", path, e)))
    }

    // deserialize into DaxConfig. Missing fields take the default value
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), DaxError> {
        if self.device.is_empty() {
            return Err(DaxError::Config("device name must not be empty".to_string()));
        }

        // the name is a single path component under both roots
        if self.device.contains('/') {
            return Err(DaxError::Config(format!(
                "device name '{}' must not contain '/'",
                self.device
            )));
        }

        if self.step_size == 0 || self.step_size % PATTERN_SIZE != 0 {
            return Err(DaxError::Config(format!(
                "step size {} must be a non-zero multiple of {}",
                self.step_size, PATTERN_SIZE
            )));
        }

        if !self.alignment.is_power_of_two() {
            return Err(DaxError::Config(format!(
                "alignment {} must be a power of two",
                self.alignment
            )));
        }

        // one byte is reserved for the terminator
        if self.max_path_len < 2 {
            return Err(DaxError::Config(format!(
                "max path length {} leaves no room for a path",
                self.max_path_len
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = DaxConfig::from_toml("").expect("empty config should parse");
        assert_eq!(config, DaxConfig::default());
        assert_eq!(config.device, "dax0.0");
        assert_eq!(config.step_size, 64);
        assert_eq!(config.alignment, 2097152);
        assert_eq!(config.max_path_len, 256);
        assert_eq!(config.sysfs_root, PathBuf::from("/sys/bus/dax/devices"));
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
        assert_eq!(config.fill_mode, FillMode::Reference);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_overrides() {
        let config = DaxConfig::from_toml(
            r#"
            device = "dax1.0"
            step_size = 128
            fill_mode = "full"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.device, "dax1.0");
        assert_eq!(config.step_size, 128);
        assert_eq!(config.fill_mode, FillMode::Full);
        // untouched keys keep their defaults
        assert_eq!(config.dev_root, PathBuf::from("/dev"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fill_mode_rejected() {
        assert!(DaxConfig::from_toml("fill_mode = \"sparse\"").is_err());
    }

    #[test]
    fn test_validate_step_size() {
        let mut config = DaxConfig::default();
        config.step_size = 0;
        assert!(matches!(config.validate(), Err(DaxError::Config(_))));
        config.step_size = 96;
        assert!(matches!(config.validate(), Err(DaxError::Config(_))));
        config.step_size = 4096;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_device_name() {
        let mut config = DaxConfig::default();
        config.device = String::new();
        assert!(config.validate().is_err());
        config.device = "../dax0.0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_alignment_and_path_len() {
        let mut config = DaxConfig::default();
        config.alignment = 3;
        assert!(config.validate().is_err());

        let mut config = DaxConfig::default();
        config.max_path_len = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = DaxConfig::from_file("/nonexistent/dax_fill.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
