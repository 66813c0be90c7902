// Virtual Memory Manager (Sv39)
//
// Builds and walks the three-level RISC-V Sv39 page table and installs the
// kernel's identity mapping. There is exactly one table in the system: every
// process runs in the kernel's address space.
//
// Key responsibilities:
// - Allocate table pages from a `FrameAllocator` on demand while walking
// - Map single pages and page-aligned regions with explicit permissions
// - Refuse to remap an already valid leaf (no implicit remap, no unmap)
// - Build the kernel table (UART, RX text, RW data up to `PHYSTOP`)
// - Activate translation on the hart (`satp` + `sfence.vma`)
//
// Page table format:
// - 512 eight-byte entries per 4 KiB table, three levels (2, 1, 0)
// - Level 2 and 1 entries only carry `V` and the next table's PPN
// - Level 0 entries are leaves carrying `R`/`W`/`X`/`U` permissions
// - PTE = (pa >> 12) << 10 | flags; VPN[level] = (va >> (12 + 9*level)) & 0x1FF
//
// Correctness and safety notes:
// - Virtual addresses at or above 2^39 are rejected before walking
// - A failed `map_region` may leave earlier pages of the region mapped
// - Table pages are reached through their physical address, which is valid
//   because the kernel runs identity mapped (and in machine mode)

use bitflags::bitflags;
use spin::Mutex;

use super::FrameAllocator;
use crate::arch;
use crate::config::{MemoryLayout, MAXVA, PAGE_SIZE};
use crate::mm::pmm::PMM;
use crate::util::{is_page_aligned, page_round_down, page_round_up};
use crate::{log_debug, log_error, log_info};

const LOG_ORIGIN: &str = "vmm";

const ENTRIES_PER_TABLE: usize = 512;

/// `satp.MODE` value selecting Sv39.
pub const SATP_SV39: usize = 8 << 60;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PteFlags: u64 {
        const VALID = 1 << 0;
        const READ = 1 << 1;
        const WRITE = 1 << 2;
        const EXECUTE = 1 << 3;
        const USER = 1 << 4;
        const GLOBAL = 1 << 5;
        const ACCESSED = 1 << 6;
        const DIRTY = 1 << 7;

        const RW = Self::READ.bits() | Self::WRITE.bits();
        const RX = Self::READ.bits() | Self::EXECUTE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// `va` or `pa` not page aligned.
    Misaligned,
    /// Virtual address beyond the Sv39 range.
    AddressOutOfRange,
    /// The level-0 slot already holds a valid mapping.
    AlreadyMapped,
    /// A table page could not be allocated.
    OutOfMemory,
}

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Pte(u64);

impl Pte {
    pub const fn empty() -> Self {
        Pte(0)
    }

    pub fn new(pa: usize, flags: PteFlags) -> Self {
        Pte((((pa >> 12) << 10) as u64) | flags.bits())
    }

    pub fn is_valid(&self) -> bool {
        self.flags().contains(PteFlags::VALID)
    }

    pub fn is_leaf(&self) -> bool {
        self.flags()
            .intersects(PteFlags::READ | PteFlags::WRITE | PteFlags::EXECUTE)
    }

    pub fn pa(&self) -> usize {
        ((self.0 >> 10) << 12) as usize
    }

    pub fn flags(&self) -> PteFlags {
        PteFlags::from_bits_truncate(self.0 & 0x3FF)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Debug for Pte {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Pte({:#x}, {:?})", self.pa(), self.flags())
    }
}

#[inline]
pub const fn vpn(va: usize, level: usize) -> usize {
    (va >> (12 + 9 * level)) & 0x1FF
}

/// Handle to a page table rooted at a physical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTable {
    root: usize,
}

impl PageTable {
    /// Allocate an empty (zeroed) root table.
    pub fn create<A: FrameAllocator>(frames: &mut A) -> Option<Self> {
        frames.alloc_page().map(|root| PageTable { root })
    }

    pub const fn root(&self) -> usize {
        self.root
    }

    pub const fn satp(&self) -> usize {
        SATP_SV39 | (self.root >> 12)
    }

    fn entry(table: usize, index: usize) -> *mut Pte {
        debug_assert!(index < ENTRIES_PER_TABLE);
        (table as *mut Pte).wrapping_add(index)
    }

    /// Level-0 slot for `va`, creating intermediate tables when `allocate`.
    ///
    /// Returns `None` for addresses beyond Sv39, for a missing link when not
    /// allocating, and when a table page cannot be allocated.
    pub fn walk<A: FrameAllocator>(
        &mut self,
        va: usize,
        frames: &mut A,
        allocate: bool,
    ) -> Option<&mut Pte> {
        if va >= MAXVA {
            return None;
        }

        let mut table = self.root;
        for level in [2, 1] {
            let slot = Self::entry(table, vpn(va, level));
            let pte = unsafe { *slot };

            if pte.is_valid() {
                table = pte.pa();
                continue;
            }
            if !allocate {
                return None;
            }

            let next = frames.alloc_page()?;
            unsafe { *slot = Pte::new(next, PteFlags::VALID) };
            table = next;
        }

        Some(unsafe { &mut *Self::entry(table, vpn(va, 0)) })
    }

    /// Read-only lookup of the level-0 entry for `va`.
    pub fn lookup(&self, va: usize) -> Option<Pte> {
        if va >= MAXVA {
            return None;
        }

        let mut table = self.root;
        for level in [2, 1] {
            let pte = unsafe { *Self::entry(table, vpn(va, level)) };
            if !pte.is_valid() {
                return None;
            }
            table = pte.pa();
        }

        let leaf = unsafe { *Self::entry(table, vpn(va, 0)) };
        leaf.is_valid().then_some(leaf)
    }

    /// Physical address `va` translates to, if mapped.
    pub fn translate(&self, va: usize) -> Option<usize> {
        self.lookup(va)
            .map(|pte| pte.pa() + (va & (PAGE_SIZE - 1)))
    }

    pub fn map_page<A: FrameAllocator>(
        &mut self,
        va: usize,
        pa: usize,
        perm: PteFlags,
        frames: &mut A,
    ) -> Result<(), VmError> {
        if !is_page_aligned(va) || !is_page_aligned(pa) {
            log_error!(LOG_ORIGIN, "map_page: misaligned va={:#x} pa={:#x}", va, pa);
            return Err(VmError::Misaligned);
        }
        if va >= MAXVA {
            log_error!(LOG_ORIGIN, "map_page: va={:#x} beyond Sv39", va);
            return Err(VmError::AddressOutOfRange);
        }

        let pte = self
            .walk(va, frames, true)
            .ok_or(VmError::OutOfMemory)?;

        if pte.is_valid() {
            log_error!(
                LOG_ORIGIN,
                "map_page: remap of va={:#x} (already -> {:#x})",
                va,
                pte.pa()
            );
            return Err(VmError::AlreadyMapped);
        }

        *pte = Pte::new(pa, perm | PteFlags::VALID);
        Ok(())
    }

    /// Map every page covering `[va, va + size)` to consecutive frames at `pa`.
    pub fn map_region<A: FrameAllocator>(
        &mut self,
        va: usize,
        pa: usize,
        size: usize,
        perm: PteFlags,
        frames: &mut A,
    ) -> Result<(), VmError> {
        if size == 0 {
            return Ok(());
        }

        let last = page_round_down(va.checked_add(size - 1).ok_or(VmError::AddressOutOfRange)?);
        let mut va = page_round_down(va);
        let mut pa = page_round_down(pa);

        loop {
            self.map_page(va, pa, perm, frames)?;
            if va == last {
                return Ok(());
            }
            va += PAGE_SIZE;
            pa += PAGE_SIZE;
        }
    }
}

/// Build the identity-mapped kernel table described by `layout`.
pub fn kvminit<A: FrameAllocator>(
    layout: &MemoryLayout,
    frames: &mut A,
) -> Result<PageTable, VmError> {
    let mut table = PageTable::create(frames).ok_or(VmError::OutOfMemory)?;

    table.map_region(layout.uart_base, layout.uart_base, PAGE_SIZE, PteFlags::RW, frames)?;

    let text_end = page_round_up(layout.text_end);
    table.map_region(
        layout.kernel_base,
        layout.kernel_base,
        text_end - layout.kernel_base,
        PteFlags::RX,
        frames,
    )?;
    table.map_region(
        text_end,
        text_end,
        layout.phys_top - text_end,
        PteFlags::RW,
        frames,
    )?;

    log_debug!(
        LOG_ORIGIN,
        "kvminit: uart={:#x} text=[{:#x}, {:#x}) rx, data=[{:#x}, {:#x}) rw",
        layout.uart_base,
        layout.kernel_base,
        text_end,
        text_end,
        layout.phys_top
    );

    Ok(table)
}

pub static KERNEL_PAGETABLE: Mutex<Option<PageTable>> = Mutex::new(None);

/// Build the kernel table from the global PMM.
pub fn init(layout: &MemoryLayout) -> Result<(), VmError> {
    let table = kvminit(layout, &mut *PMM.lock())?;
    *KERNEL_PAGETABLE.lock() = Some(table);

    log_info!(
        LOG_ORIGIN,
        "kernel page table built: root={:#x} free_pages={}",
        table.root(),
        crate::mm::pmm::stats().free_pages
    );
    Ok(())
}

/// Switch this hart onto the kernel table.
pub fn kvminithart() {
    let Some(table) = *KERNEL_PAGETABLE.lock() else {
        log_error!(LOG_ORIGIN, "kvminithart: kernel page table not built");
        return;
    };

    arch::activate_page_table(table.root() >> 12);
    log_info!(LOG_ORIGIN, "paging enabled: satp={:#x}", table.satp());
}

pub fn kernel_translate(va: usize) -> Option<usize> {
    (*KERNEL_PAGETABLE.lock()).and_then(|table| table.translate(va))
}
