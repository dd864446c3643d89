//! Platform-specific access to physical memory.

pub mod linux;

pub use linux::{MappedRegisters, MappingLayout, map_register_window, mapping_layout, page_size};
