// Physical Memory Manager (PMM)
//
// Hands out and reclaims 4 KiB physical pages between the end of the kernel
// image and the top of RAM. Every page table node, process kernel stack and
// file data buffer in the system comes from here.
//
// Key responsibilities:
// - Seed a free list with every whole page in `[kernel_end, phys_top)`
// - Allocate single zero-filled pages
// - Reclaim pages after validating alignment and range
// - Poison reclaimed pages so use-after-free reads are recognizable
// - Expose page counts for diagnostics
//
// Implementation details:
// - The free list is an intrusive LIFO stack: the link to the next free page
//   is stored in the first word of the free page itself
// - Allocation fills the page with zeros; release fills it with `POISON_BYTE`
// - No ordering, coalescing or contiguous allocation
//
// Correctness and safety notes:
// - `FreeList` owns raw memory and is only sound if the range given to
//   `init` is RAM nothing else uses
// - Invalid frees are logged and ignored, the list is left unchanged
// - A double free of a valid page is not detected
//
// Public interface:
// - `FreeList`: the allocator state, usable over any page-aligned range
// - `PMM` plus `init` / `alloc_page` / `free_page` / `stats`: the global
//   kernel instance

use core::ptr::{self, NonNull};

use spin::Mutex;

use super::FrameAllocator;
use crate::config::PAGE_SIZE;
use crate::util::{is_page_aligned, page_round_up};
use crate::{log_error, log_info, log_warn};

const LOG_ORIGIN: &str = "pmm";

/// Fill pattern for released pages.
pub const POISON_BYTE: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmmError {
    Misaligned,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_pages: usize,
    pub free_pages: usize,
}

impl MemoryStats {
    pub const fn used_pages(&self) -> usize {
        self.total_pages - self.free_pages
    }
}

#[repr(C)]
struct Run {
    next: Option<NonNull<Run>>,
}

pub struct FreeList {
    head: Option<NonNull<Run>>,
    base: usize,
    top: usize,
    total_pages: usize,
    free_pages: usize,
}

// The list only links pages inside the range it was given.
unsafe impl Send for FreeList {}

impl FreeList {
    pub const fn empty() -> Self {
        Self {
            head: None,
            base: 0,
            top: 0,
            total_pages: 0,
            free_pages: 0,
        }
    }

    /// Push every whole page of `[round_up(start), end)` onto the list.
    ///
    /// # Safety
    /// The range must be writable memory owned exclusively by this list.
    pub unsafe fn init(&mut self, start: usize, end: usize) {
        self.head = None;
        self.base = page_round_up(start);
        self.top = end;
        self.total_pages = 0;
        self.free_pages = 0;

        let mut page = self.base;
        while page + PAGE_SIZE <= end {
            self.push(page);
            self.total_pages += 1;
            page += PAGE_SIZE;
        }
    }

    unsafe fn push(&mut self, pa: usize) {
        let run = pa as *mut Run;
        run.write(Run { next: self.head });
        self.head = NonNull::new(run);
        self.free_pages += 1;
    }

    pub fn alloc(&mut self) -> Option<usize> {
        let run = self.head?;

        unsafe {
            self.head = run.as_ref().next;
            ptr::write_bytes(run.as_ptr().cast::<u8>(), 0, PAGE_SIZE);
        }
        self.free_pages -= 1;

        Some(run.as_ptr() as usize)
    }

    pub fn free(&mut self, pa: usize) -> Result<(), PmmError> {
        if !is_page_aligned(pa) {
            return Err(PmmError::Misaligned);
        }
        if pa < self.base || pa >= self.top {
            return Err(PmmError::OutOfRange);
        }

        unsafe {
            ptr::write_bytes(pa as *mut u8, POISON_BYTE, PAGE_SIZE);
            self.push(pa);
        }

        Ok(())
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_pages: self.total_pages,
            free_pages: self.free_pages,
        }
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.base, self.top)
    }
}

impl FrameAllocator for FreeList {
    fn alloc_page(&mut self) -> Option<usize> {
        let page = self.alloc();
        if page.is_none() {
            log_warn!(LOG_ORIGIN, "alloc_page: out of physical pages");
        }
        page
    }

    fn free_page(&mut self, pa: usize) -> Result<(), PmmError> {
        let result = self.free(pa);
        if let Err(err) = result {
            log_error!(
                LOG_ORIGIN,
                "free_page: rejected {:#x} ({:?}, valid range [{:#x}, {:#x}))",
                pa,
                err,
                self.base,
                self.top
            );
        }
        result
    }
}

pub static PMM: Mutex<FreeList> = Mutex::new(FreeList::empty());

/// Seed the global allocator with `[kernel_end, phys_top)`.
///
/// # Safety
/// Must be called once, before any other allocation, with a range that
/// holds no live data.
pub unsafe fn init(kernel_end: usize, phys_top: usize) {
    let mut pmm = PMM.lock();
    pmm.init(kernel_end, phys_top);

    let stats = pmm.stats();
    log_info!(
        LOG_ORIGIN,
        "PMM initialized: range=[{:#x}, {:#x}) free_pages={} ({} KiB)",
        pmm.base,
        phys_top,
        stats.free_pages,
        stats.free_pages * PAGE_SIZE / 1024
    );
}

pub fn alloc_page() -> Option<usize> {
    PMM.lock().alloc_page()
}

pub fn free_page(pa: usize) -> Result<(), PmmError> {
    PMM.lock().free_page(pa)
}

pub fn stats() -> MemoryStats {
    PMM.lock().stats()
}

/// Allocate two pages, release them and check LIFO reuse.
pub fn self_test() -> bool {
    let mut pmm = PMM.lock();

    let Some(first) = pmm.alloc_page() else {
        return false;
    };
    let Some(second) = pmm.alloc_page() else {
        let _ = pmm.free_page(first);
        return false;
    };

    let distinct = first != second;
    let _ = pmm.free_page(first);
    let _ = pmm.free_page(second);

    let reused = pmm.alloc_page();
    let lifo = reused == Some(second);
    if let Some(page) = reused {
        let _ = pmm.free_page(page);
    }

    log_info!(
        LOG_ORIGIN,
        "self-test: first={:#x} second={:#x} lifo_reuse={}",
        first,
        second,
        lifo
    );

    distinct && lifo
}
