// In-Memory File Store
//
// A deliberately tiny file store for exercising the syscall path: a flat
// namespace of at most sixteen files, each backed by one physical page.
//
// Key responsibilities:
// - Create, look up and unlink files by name
// - Hand out descriptors with an independent byte offset each
// - Positional read and write, clamped to the page and the file size
// - Per-file reference counts of open descriptors
//
// Implementation details:
// - Names are at most `NAME_LEN - 1` bytes; empty names are refused
// - Descriptors start at `FIRST_FILE_FD` so they never alias the console
// - Data pages come from the caller's `FrameAllocator` and go back to it
//   on unlink
// - Writes beyond the end of the page are truncated; a write at the page
//   limit moves zero bytes
//
// Limitations:
// - No directories, permissions or persistence
// - A file cannot be unlinked while a descriptor is open on it
// - Open flags other than `O_CREATE` are accepted and ignored

use core::ptr;

use cinder_syscall::fcntl::{NAME_LEN, O_CREATE};
use spin::Mutex;

use crate::config::{FIRST_FILE_FD, NFILE, NOFILE, PAGE_SIZE};
use crate::mm::FrameAllocator;
use crate::{log_debug, log_info};

const LOG_ORIGIN: &str = "fs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    InvalidName,
    AlreadyExists,
    NotFound,
    NoSpace,
    OutOfMemory,
    NoDescriptors,
    BadDescriptor,
    Busy,
}

#[derive(Debug, Clone, Copy)]
struct File {
    used: bool,
    name: [u8; NAME_LEN],
    name_len: usize,
    page: usize,
    size: usize,
    refs: usize,
}

impl File {
    const EMPTY: File = File {
        used: false,
        name: [0; NAME_LEN],
        name_len: 0,
        page: 0,
        size: 0,
        refs: 0,
    };

    fn name(&self) -> &[u8] {
        &self.name[..self.name_len]
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenFile {
    file: usize,
    offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: usize,
    pub refs: usize,
}

pub struct MemFs {
    files: [File; NFILE],
    fds: [Option<OpenFile>; NOFILE],
}

impl MemFs {
    pub const fn new() -> Self {
        Self {
            files: [File::EMPTY; NFILE],
            fds: [None; NOFILE],
        }
    }

    fn lookup(&self, name: &[u8]) -> Option<usize> {
        self.files
            .iter()
            .position(|f| f.used && f.name() == name)
    }

    fn open_file(&self, fd: usize) -> Result<OpenFile, FsError> {
        fd.checked_sub(FIRST_FILE_FD)
            .and_then(|idx| self.fds.get(idx).copied().flatten())
            .ok_or(FsError::BadDescriptor)
    }

    fn set_offset(&mut self, fd: usize, offset: usize) {
        if let Some(Some(open)) = self.fds.get_mut(fd - FIRST_FILE_FD) {
            open.offset = offset;
        }
    }

    pub fn create<A: FrameAllocator>(&mut self, name: &[u8], frames: &mut A) -> Result<usize, FsError> {
        if name.is_empty() || name.len() >= NAME_LEN {
            return Err(FsError::InvalidName);
        }
        if self.lookup(name).is_some() {
            return Err(FsError::AlreadyExists);
        }

        let idx = self
            .files
            .iter()
            .position(|f| !f.used)
            .ok_or(FsError::NoSpace)?;
        let page = frames.alloc_page().ok_or(FsError::OutOfMemory)?;

        let file = &mut self.files[idx];
        *file = File::EMPTY;
        file.used = true;
        file.name[..name.len()].copy_from_slice(name);
        file.name_len = name.len();
        file.page = page;

        log_debug!(LOG_ORIGIN, "created file #{} at page {:#x}", idx, page);
        Ok(idx)
    }

    pub fn open<A: FrameAllocator>(
        &mut self,
        name: &[u8],
        flags: usize,
        frames: &mut A,
    ) -> Result<usize, FsError> {
        let file = match self.lookup(name) {
            Some(idx) => idx,
            None if flags & O_CREATE != 0 => self.create(name, frames)?,
            None => return Err(FsError::NotFound),
        };

        let slot = self
            .fds
            .iter()
            .position(|fd| fd.is_none())
            .ok_or(FsError::NoDescriptors)?;

        self.fds[slot] = Some(OpenFile { file, offset: 0 });
        self.files[file].refs += 1;
        Ok(FIRST_FILE_FD + slot)
    }

    pub fn close(&mut self, fd: usize) -> Result<(), FsError> {
        let open = self.open_file(fd)?;
        self.fds[fd - FIRST_FILE_FD] = None;

        let file = &mut self.files[open.file];
        file.refs = file.refs.saturating_sub(1);
        Ok(())
    }

    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        let open = self.open_file(fd)?;
        let file = &self.files[open.file];

        if open.offset >= file.size {
            return Ok(0);
        }
        let n = buf.len().min(file.size - open.offset);
        unsafe {
            ptr::copy_nonoverlapping((file.page + open.offset) as *const u8, buf.as_mut_ptr(), n);
        }

        self.set_offset(fd, open.offset + n);
        Ok(n)
    }

    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, FsError> {
        let open = self.open_file(fd)?;
        let file = &mut self.files[open.file];

        if open.offset >= PAGE_SIZE {
            return Ok(0);
        }
        let n = buf.len().min(PAGE_SIZE - open.offset);
        unsafe {
            ptr::copy_nonoverlapping(buf.as_ptr(), (file.page + open.offset) as *mut u8, n);
        }

        let end = open.offset + n;
        if end > file.size {
            file.size = end;
        }
        self.set_offset(fd, end);
        Ok(n)
    }

    pub fn unlink<A: FrameAllocator>(&mut self, name: &[u8], frames: &mut A) -> Result<(), FsError> {
        let idx = self.lookup(name).ok_or(FsError::NotFound)?;
        if self.files[idx].refs > 0 {
            return Err(FsError::Busy);
        }

        let _ = frames.free_page(self.files[idx].page);
        self.files[idx] = File::EMPTY;
        Ok(())
    }

    pub fn stat(&self, name: &[u8]) -> Option<FileInfo> {
        self.lookup(name).map(|idx| FileInfo {
            size: self.files[idx].size,
            refs: self.files[idx].refs,
        })
    }

    /// Log every file with its size and open count.
    pub fn dump(&self) {
        let used = self.files.iter().filter(|f| f.used).count();
        log_info!(LOG_ORIGIN, "{} of {} files in use", used, NFILE);

        for (idx, file) in self.files.iter().enumerate().filter(|(_, f)| f.used) {
            log_info!(
                LOG_ORIGIN,
                "  #{:2} {:<24} size={:4} refs={}",
                idx,
                core::str::from_utf8(file.name()).unwrap_or("<binary>"),
                file.size,
                file.refs
            );
        }
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

pub static FILES: Mutex<MemFs> = Mutex::new(MemFs::new());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Arena;

    #[test]
    fn create_refuses_duplicates_and_bad_names() {
        let mut arena = Arena::new(4);
        let mut fs = MemFs::new();

        assert_eq!(fs.create(b"notes", arena.frames_mut()), Ok(0));
        assert_eq!(fs.create(b"notes", arena.frames_mut()), Err(FsError::AlreadyExists));
        assert_eq!(fs.create(b"", arena.frames_mut()), Err(FsError::InvalidName));
        assert_eq!(fs.create(&[b'x'; NAME_LEN], arena.frames_mut()), Err(FsError::InvalidName));
    }

    #[test]
    fn descriptors_start_after_the_console() {
        let mut arena = Arena::new(4);
        let mut fs = MemFs::new();

        let fd = fs.open(b"a", O_CREATE, arena.frames_mut()).unwrap();
        assert_eq!(fd, FIRST_FILE_FD);
        assert_eq!(fs.open(b"missing", 0, arena.frames_mut()), Err(FsError::NotFound));
        assert_eq!(fs.read(0, &mut [0u8; 4]), Err(FsError::BadDescriptor));
        assert_eq!(fs.write(2, b"x"), Err(FsError::BadDescriptor));
    }

    #[test]
    fn write_then_reopen_and_read_back() {
        let mut arena = Arena::new(4);
        let mut fs = MemFs::new();

        let fd = fs.open(b"hello.txt", O_CREATE, arena.frames_mut()).unwrap();
        assert_eq!(fs.write(fd, b"Hello, "), Ok(7));
        assert_eq!(fs.write(fd, b"world"), Ok(5));
        fs.close(fd).unwrap();

        let fd = fs.open(b"hello.txt", 0, arena.frames_mut()).unwrap();
        let mut buf = [0u8; 32];
        assert_eq!(fs.read(fd, &mut buf[..5]), Ok(5));
        assert_eq!(fs.read(fd, &mut buf[5..]), Ok(7));
        assert_eq!(&buf[..12], b"Hello, world");
        assert_eq!(fs.read(fd, &mut buf), Ok(0));
        assert_eq!(fs.stat(b"hello.txt"), Some(FileInfo { size: 12, refs: 1 }));
    }

    #[test]
    fn writes_are_clamped_to_one_page() {
        let mut arena = Arena::new(2);
        let mut fs = MemFs::new();
        let fd = fs.open(b"big", O_CREATE, arena.frames_mut()).unwrap();

        let chunk = [0x5Au8; 3000];
        assert_eq!(fs.write(fd, &chunk), Ok(3000));
        assert_eq!(fs.write(fd, &chunk), Ok(PAGE_SIZE - 3000));
        assert_eq!(fs.write(fd, &chunk), Ok(0));
        assert_eq!(fs.stat(b"big").unwrap().size, PAGE_SIZE);
    }

    #[test]
    fn each_descriptor_has_its_own_offset() {
        let mut arena = Arena::new(2);
        let mut fs = MemFs::new();
        let w = fs.open(b"f", O_CREATE, arena.frames_mut()).unwrap();
        fs.write(w, b"abcdef").unwrap();

        let r1 = fs.open(b"f", 0, arena.frames_mut()).unwrap();
        let r2 = fs.open(b"f", 0, arena.frames_mut()).unwrap();
        let mut a = [0u8; 3];
        let mut b = [0u8; 6];
        fs.read(r1, &mut a).unwrap();
        fs.read(r2, &mut b).unwrap();
        assert_eq!(&a, b"abc");
        assert_eq!(&b, b"abcdef");
        assert_eq!(fs.stat(b"f").unwrap().refs, 3);
    }

    #[test]
    fn unlink_returns_the_page_once_closed() {
        let mut arena = Arena::new(2);
        let mut fs = MemFs::new();
        let fd = fs.open(b"tmp", O_CREATE, arena.frames_mut()).unwrap();
        assert_eq!(arena.frames().stats().free_pages, 1);

        assert_eq!(fs.unlink(b"tmp", arena.frames_mut()), Err(FsError::Busy));
        fs.close(fd).unwrap();
        assert_eq!(fs.close(fd), Err(FsError::BadDescriptor));
        assert_eq!(fs.unlink(b"tmp", arena.frames_mut()), Ok(()));
        assert_eq!(arena.frames().stats().free_pages, 2);
        assert_eq!(fs.stat(b"tmp"), None);
    }

    #[test]
    fn store_and_descriptor_capacity() {
        let mut arena = Arena::new(NFILE + 1);
        let mut fs = MemFs::new();
        let mut name = *b"file-00";

        for i in 0..NFILE {
            name[5] = b'0' + (i / 10) as u8;
            name[6] = b'0' + (i % 10) as u8;
            fs.open(&name, O_CREATE, arena.frames_mut()).unwrap();
        }
        assert_eq!(fs.create(b"one-more", arena.frames_mut()), Err(FsError::NoSpace));
        assert_eq!(fs.open(b"file-00", 0, arena.frames_mut()), Err(FsError::NoDescriptors));
    }
}
