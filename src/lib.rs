//! Write a fixed 64-byte test pattern into a memory-mapped device-DAX node.
//!
//! A run reads the capacity the kernel publishes in sysfs, opens the device,
//! maps all of it shared and read/write, fills it with `fill::PATTERN` at a
//! fixed stride and unmaps it again. Any failure aborts the run.
use log::{debug, warn};

pub mod config;
pub mod device;
pub mod error;
pub mod fill;
pub mod mapping;
pub mod utils;

pub use config::DaxConfig;
pub use device::DevicePaths;
pub use error::DaxError;
pub use fill::{FillMode, PATTERN, PATTERN_SIZE};
pub use mapping::DaxMapping;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub capacity: usize,
    pub writes: usize,
    pub last_offset: Option<usize>,
}

const FALLBACK_PAGE_SIZE: usize = 4096;

pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    // -1 on failure
    usize::try_from(size).unwrap_or(FALLBACK_PAGE_SIZE)
}

/// Run the whole sequence for `config`: size query, open, map, fill, unmap.
/// Progress lines go to stdout. The device is closed when this returns,
/// on every path.
pub fn run(config: &DaxConfig) -> Result<FillReport, DaxError> {
    config.validate()?;
    let paths = DevicePaths::from_config(config)?;
    debug!("config: {:?}", config);

    println!("Device Path: {}", paths.device.display());
    println!("Page size: {} bytes", page_size());

    // the size attribute is read before the device is touched
    let size = device::read_capacity(&paths)?;
    println!("Device size: {} bytes", size);
    let capacity = usize::try_from(size).map_err(|_| DaxError::CapacityOverflow(size))?;

    if capacity % config.alignment != 0 {
        warn!(
            "device size {} is not a multiple of the {} byte alignment",
            capacity, config.alignment
        );
    }

    let file = device::open_device(&paths)?;
    let mut mapping = DaxMapping::map(&file, &paths.device, capacity)?;
    println!("MMAP at {:p}", mapping.base());

    debug!(
        "{:?} fill: {} writes of {} bytes every {} bytes",
        config.fill_mode,
        fill::fill_count(capacity, config.step_size, config.fill_mode),
        PATTERN_SIZE,
        config.step_size
    );

    let mut last_offset = None;
    let writes = fill::fill_region(
        mapping.as_mut_slice(),
        config.step_size,
        config.fill_mode,
        |offset| {
            println!("Data written at offset 0x{:x}", offset);
            last_offset = Some(offset);
        },
    );

    mapping.unmap()?;
    drop(file);

    Ok(FillReport {
        capacity,
        writes,
        last_offset,
    })
}
