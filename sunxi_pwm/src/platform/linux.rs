//! Linux `/dev/mem` mapping of the register block

use crate::error::{PwmError, PwmResult};
use crate::registers::{Register, RegisterIo};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use sunxi::config::{ConfigError, DeviceConfig};
use sunxi::consts::{MAPPING_PAGES, REGISTER_BLOCK_SIZE};
use tracing::{debug, info};

/// Page geometry of the window over a physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingLayout {
    /// Page-aligned physical address where the mapping starts
    pub page_start: u64,
    /// Offset of the register block inside the first page
    pub page_offset: usize,
    /// Mapping length in bytes
    pub length: usize,
}

/// Native page size, falling back to 4 KiB if `sysconf` reports nothing.
pub fn page_size() -> usize {
    // SAFETY: sysconf only reads a system constant and has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 { raw as usize } else { 4096 }
}

/// Compute the window covering `physical` for a given page size.
pub fn mapping_layout(physical: u64, page_size: usize) -> MappingLayout {
    let page_mask = !(page_size as u64 - 1);
    MappingLayout {
        page_start: physical & page_mask,
        page_offset: (physical & !page_mask) as usize,
        length: page_size * MAPPING_PAGES,
    }
}

/// Open the memory device for read/write with synchronous semantics.
fn open_mem_device(path: &Path) -> PwmResult<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
        .map_err(|source| PwmError::Mapping {
            stage: "open",
            source,
        })
}

/// Map the register block described by `device`.
///
/// The device file is closed once the mapping exists; the mapping itself
/// lives until the returned value is dropped.
pub fn map_register_window(device: &DeviceConfig) -> PwmResult<MappedRegisters> {
    if device.base_address % 4 != 0 {
        return Err(ConfigError::ValidationError(format!(
            "base address {:#x} is not word aligned",
            device.base_address
        ))
        .into());
    }

    let layout = mapping_layout(device.base_address, page_size());
    let file = open_mem_device(&device.mem_path)?;

    // SAFETY: `file` is the opened memory device and outlives the call; the
    // offset is page-aligned and the length spans the whole register block.
    // The mapping aliases device memory, so it is only touched through
    // volatile accesses.
    let mmap = unsafe {
        MmapOptions::new()
            .offset(layout.page_start)
            .len(layout.length)
            .map_mut(&file)
    }
    .map_err(|source| PwmError::Mapping {
        stage: "map",
        source,
    })?;

    info!(
        "Mapped PWM block at {:#x} via {} ({} bytes from {:#x})",
        device.base_address,
        device.mem_path.display(),
        layout.length,
        layout.page_start
    );

    Ok(MappedRegisters {
        mmap,
        offset: layout.page_offset,
    })
}

/// Register block reached through a shared mapping of physical memory.
///
/// Dropping it unmaps the window.
pub struct MappedRegisters {
    mmap: MmapMut,
    offset: usize,
}

impl MappedRegisters {
    /// Offset of the block within the mapping.
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn byte_offset(&self, reg: Register) -> usize {
        let at = self.offset + reg.offset();
        debug_assert!(at + 4 <= self.mmap.len());
        debug_assert!(self.offset + REGISTER_BLOCK_SIZE <= self.mmap.len());
        at
    }
}

impl RegisterIo for MappedRegisters {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        let at = self.byte_offset(reg);
        // SAFETY: `at` is word-aligned (4-aligned base on a page-aligned
        // mapping plus a 4-aligned register offset) and `at + 4` lies inside
        // the two-page mapping, which lives as long as `self`.
        unsafe { std::ptr::read_volatile(self.mmap.as_ptr().add(at) as *const u32) }
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u32) {
        let at = self.byte_offset(reg);
        // SAFETY: as for `read`; `&mut self` makes this the only access
        // through this mapping.
        unsafe { std::ptr::write_volatile(self.mmap.as_mut_ptr().add(at) as *mut u32, value) }
    }
}

impl Drop for MappedRegisters {
    fn drop(&mut self) {
        debug!("Unmapping PWM register window ({} bytes)", self.mmap.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_for_hardware_address() {
        let layout = mapping_layout(0x01c2_0e00, 4096);
        assert_eq!(layout.page_start, 0x01c2_0000);
        assert_eq!(layout.page_offset, 0xe00);
        assert_eq!(layout.length, 8192);
    }

    #[test]
    fn test_layout_with_large_pages() {
        let layout = mapping_layout(0x01c2_0e00, 65536);
        assert_eq!(layout.page_start, 0x01c2_0000);
        assert_eq!(layout.page_offset, 0x0e00);
        assert_eq!(layout.length, 2 * 65536);
    }

    #[test]
    fn test_block_near_page_end_stays_covered() {
        let layout = mapping_layout(0x1ffc, 4096);
        assert_eq!(layout.page_start, 0x1000);
        assert!(layout.page_offset + REGISTER_BLOCK_SIZE <= layout.length);
    }

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
    }

    #[test]
    fn test_missing_device_reports_open_failure() {
        let device = DeviceConfig {
            mem_path: "/nonexistent/sunxi-mem".into(),
            base_address: 0x1000,
        };
        match map_register_window(&device) {
            Err(err @ PwmError::Mapping { stage: "open", .. }) => {
                assert_eq!(err.code(), -libc::ENOENT);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mapping a missing device must fail"),
        }
    }

    #[test]
    fn test_unaligned_base_rejected() {
        let device = DeviceConfig {
            mem_path: "/dev/null".into(),
            base_address: 0x1002,
        };
        assert!(matches!(
            map_register_window(&device),
            Err(PwmError::Config(_))
        ));
    }
}
