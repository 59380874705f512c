use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::DaxConfig;
use crate::error::DaxError;

/// The two filesystem locations derived from a device-DAX name: the
/// character device node and its sysfs `size` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    pub name: String,
    pub device: PathBuf,
    pub size_attr: PathBuf,
}

impl DevicePaths {
    pub fn new(
        name: &str,
        dev_root: &Path,
        sysfs_root: &Path,
        max_len: usize,
    ) -> Result<Self, DaxError> {
        let device = dev_root.join(name);
        let size_attr = sysfs_root.join(name).join("size");

        check_len(&device, max_len)?;
        check_len(&size_attr, max_len)?;

        Ok(DevicePaths {
            name: name.to_string(),
            device,
            size_attr,
        })
    }

    pub fn from_config(config: &DaxConfig) -> Result<Self, DaxError> {
        Self::new(
            &config.device,
            &config.dev_root,
            &config.sysfs_root,
            config.max_path_len,
        )
    }
}

// max_len counts the terminating NUL, so the usable length is one less
fn check_len(path: &Path, max_len: usize) -> Result<(), DaxError> {
    let len = path.as_os_str().len();
    if len >= max_len {
        return Err(DaxError::PathTooLong {
            path: path.display().to_string(),
            max: max_len,
        });
    }
    Ok(())
}

/// Read the capacity the kernel publishes for the device, in bytes.
pub fn read_capacity(paths: &DevicePaths) -> Result<u64, DaxError> {
    let contents = fs::read_to_string(&paths.size_attr).map_err(|e| DaxError::SizeOpen {
        path: paths.size_attr.clone(),
        source: e,
    })?;

    let size = parse_size(&contents).ok_or_else(|| DaxError::SizeParse {
        path: paths.size_attr.clone(),
        contents: contents.clone(),
    })?;
    debug!("{} reports {} bytes", paths.size_attr.display(), size);
    Ok(size)
}

/// Parse the leading decimal integer of a sysfs attribute. Leading whitespace
/// and trailing content are ignored; a sign other than `+` is rejected.
pub fn parse_size(contents: &str) -> Option<u64> {
    let s = contents.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}

/// Open the device node for read and write access.
pub fn open_device(paths: &DevicePaths) -> Result<File, DaxError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(&paths.device)
        .map_err(|e| DaxError::DeviceOpen {
            path: paths.device.clone(),
            source: e,
        })
}
