// Memory Management Subsystem
//
// Top-level entry point for the kernel memory managers: the physical page
// allocator (`pmm`) and the Sv39 page table builder (`vm`).
//
// Initialization flow:
// - `pmm::init` seeds the free list with the RAM above the kernel image
// - `vm::init` builds the identity-mapped kernel page table from PMM pages
// - `vm::kvminithart` switches the hart onto that table
//
// Design principles:
// - Strict layering: the page table only ever obtains memory through a
//   `FrameAllocator`, so it can be driven by the global PMM on hardware and
//   by a heap-backed arena in host tests

pub mod pmm;
pub mod vm;

pub use pmm::PmmError;

use crate::config::MemoryLayout;

/// Source of zeroed 4 KiB physical pages.
pub trait FrameAllocator {
    /// A zero-filled page, or `None` when memory is exhausted.
    fn alloc_page(&mut self) -> Option<usize>;

    /// Return a page obtained from `alloc_page`.
    fn free_page(&mut self, pa: usize) -> Result<(), PmmError>;
}

/// # Safety
/// `layout` must describe the running image; call once during boot.
pub unsafe fn init(layout: &MemoryLayout) -> Result<(), vm::VmError> {
    pmm::init(layout.kernel_end, layout.phys_top);
    vm::init(layout)?;
    vm::kvminithart();
    Ok(())
}
