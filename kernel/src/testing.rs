// Host test support: page-aligned heap arenas standing in for RAM.

extern crate std;

use std::alloc::{alloc_zeroed, dealloc, Layout};

use spin::Mutex;

use crate::config::PAGE_SIZE;
use crate::mm::pmm::FreeList;

pub struct Arena {
    ptr: *mut u8,
    layout: Layout,
    frames: FreeList,
}

impl Arena {
    pub fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).expect("arena layout");
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null(), "arena allocation failed");

        let mut frames = FreeList::empty();
        unsafe { frames.init(ptr as usize, ptr as usize + pages * PAGE_SIZE) };

        Self { ptr, layout, frames }
    }

    pub fn frames(&self) -> &FreeList {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FreeList {
        &mut self.frames
    }

    /// Move the free list behind a lock; the arena must outlive the lock.
    pub fn into_locked(&mut self) -> Mutex<FreeList> {
        Mutex::new(core::mem::replace(&mut self.frames, FreeList::empty()))
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr, self.layout) };
    }
}
