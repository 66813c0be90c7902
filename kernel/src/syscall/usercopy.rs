// Syscall buffer transfer
//
// Cinder has no user address translation: a syscall pointer is accepted
// only if the whole range it names lies inside the caller-supplied
// `AddressWindow`, and is then accessed directly.

use core::ptr;

use crate::config::AddressWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadAddress;

/// Fill `dst` from `src`.
pub fn copy_in(window: &AddressWindow, dst: &mut [u8], src: usize) -> Result<(), BadAddress> {
    if !window.contains_range(src, dst.len()) {
        return Err(BadAddress);
    }
    unsafe { ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) };
    Ok(())
}

/// Store `src` at `dst`.
pub fn copy_out(window: &AddressWindow, dst: usize, src: &[u8]) -> Result<(), BadAddress> {
    if !window.contains_range(dst, src.len()) {
        return Err(BadAddress);
    }
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) };
    Ok(())
}

/// Copy a NUL-terminated string of at most `dst.len() - 1` bytes.
///
/// Returns the string length. Longer strings are truncated.
pub fn copy_in_str(window: &AddressWindow, src: usize, dst: &mut [u8]) -> Result<usize, BadAddress> {
    let max = dst.len().saturating_sub(1);

    for i in 0..max {
        let addr = src.checked_add(i).ok_or(BadAddress)?;
        if !window.contains_range(addr, 1) {
            return Err(BadAddress);
        }
        let byte = unsafe { ptr::read(addr as *const u8) };
        if byte == 0 {
            dst[i] = 0;
            return Ok(i);
        }
        dst[i] = byte;
    }

    if let Some(last) = dst.get_mut(max) {
        *last = 0;
    }
    Ok(max)
}
