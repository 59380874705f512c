use libc::{mmap, munmap, MAP_SHARED, PROT_READ, PROT_WRITE};
use std::fs::File;
use std::mem::ManuallyDrop;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::error::DaxError;

/// A shared read/write mapping of a device, starting at offset 0.
/// Writes go straight to the backing device.
pub struct DaxMapping {
    addr: *mut u8,
    len: usize,
}

impl DaxMapping {
    /// Map `len` bytes of `file`, letting the kernel choose the address.
    /// `path` is only used for diagnostics.
    pub fn map(file: &File, path: &Path, len: usize) -> Result<Self, DaxError> {
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                len,
                PROT_READ | PROT_WRITE,
                MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(DaxError::Map {
                path: path.to_path_buf(),
                len,
                source: std::io::Error::last_os_error(),
            });
        }

        Ok(DaxMapping {
            addr: ptr as *mut u8,
            len,
        })
    }

    pub fn base(&self) -> *const u8 {
        self.addr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the mapping is valid for `len` bytes until unmapped, and
        // nothing else in this process aliases it
        unsafe { std::slice::from_raw_parts(self.addr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: see as_slice; &mut self guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.addr, self.len) }
    }

    /// Release the mapping, reporting failure instead of ignoring it as
    /// Drop does.
    pub fn unmap(self) -> Result<(), DaxError> {
        let this = ManuallyDrop::new(self);
        let ret = unsafe { munmap(this.addr as *mut libc::c_void, this.len) };
        if ret == -1 {
            return Err(DaxError::Unmap(std::io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for DaxMapping {
    fn drop(&mut self) {
        unsafe {
            munmap(self.addr as *mut libc::c_void, self.len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{remove_file, OpenOptions};

    fn tmp_file(name: &str, size: u64) -> (std::path::PathBuf, File) {
        let path = std::env::temp_dir().join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .expect("Failed to create/open tmp file");
        file.set_len(size).expect("Failed to set file length");
        (path, file)
    }

    #[test]
    fn test_map_file() {
        let size = 4096;
        let (path, file) = tmp_file("dax_fill_mapping_test", size as u64);

        let mut mapping = DaxMapping::map(&file, &path, size).expect("mmap should succeed");
        assert!(!mapping.base().is_null());
        assert_eq!(mapping.len(), size);
        assert!(mapping.as_slice().iter().all(|&b| b == 0));

        mapping.as_mut_slice()[100] = 0xab;
        mapping.unmap().expect("munmap should succeed");

        // shared mapping: the write reached the file
        let contents = std::fs::read(&path).expect("Failed to read back file");
        assert_eq!(contents[100], 0xab);

        remove_file(&path).expect("Failed to remove tmp file");
    }

    #[test]
    fn test_map_zero_length_fails() {
        let (path, file) = tmp_file("dax_fill_mapping_zero", 0);

        let err = DaxMapping::map(&file, &path, 0).err().expect("mmap of 0 bytes should fail");
        assert!(matches!(err, DaxError::Map { len: 0, .. }));

        remove_file(&path).expect("Failed to remove tmp file");
    }

    #[test]
    fn test_map_read_only_file_fails() {
        let (path, _) = tmp_file("dax_fill_mapping_ro", 4096);
        let ro = File::open(&path).expect("Failed to open read-only");

        assert!(DaxMapping::map(&ro, &path, 4096).is_err());

        remove_file(&path).expect("Failed to remove tmp file");
    }

    #[test]
    fn test_unmap_failure_reported() {
        // munmap rejects an address that is not page aligned
        let mapping = DaxMapping {
            addr: 1 as *mut u8,
            len: 4096,
        };

        match mapping.unmap() {
            Err(DaxError::Unmap(e)) => assert_eq!(e.raw_os_error(), Some(libc::EINVAL)),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
