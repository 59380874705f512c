use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every way a fill run can fail. All of them end the process with status 1.
#[derive(Debug, Error)]
pub enum DaxError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Path '{path}' exceeds the maximum length of {max} bytes")]
    PathTooLong { path: String, max: usize },

    #[error("Failed to open sysfs file '{}': {source}", path.display())]
    SizeOpen { path: PathBuf, source: io::Error },

    #[error("Failed to read device size from sysfs '{}': {contents:?}", path.display())]
    SizeParse { path: PathBuf, contents: String },

    #[error("Device size {0} does not fit in the address space")]
    CapacityOverflow(u64),

    #[error("Failed to open the device '{}': {source}", path.display())]
    DeviceOpen { path: PathBuf, source: io::Error },

    #[error("Memory mapping of {len} bytes from '{}' failed: {source}", path.display())]
    Map {
        path: PathBuf,
        len: usize,
        source: io::Error,
    },

    #[error("Unmapping failed: {0}")]
    Unmap(io::Error),
}
