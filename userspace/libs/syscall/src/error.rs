// Error codes and result types for syscalls

/// Raw value the kernel places in `a0` for any failed call.
pub const FAILURE: isize = -1;

/// Syscall error codes (the kernel reports a single failure value)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    /// Unknown number, bad argument, bad descriptor or missing process.
    Failed,
}

impl SyscallError {
    /// Convert from raw syscall return value
    pub fn from_raw(value: isize) -> Option<Self> {
        if value < 0 {
            Some(SyscallError::Failed)
        } else {
            None
        }
    }
}

/// Result type for syscall operations
pub type SyscallResult<T> = Result<T, SyscallError>;

/// Map a raw return value onto `Ok(value)` or the decoded error.
#[inline]
pub fn check(value: isize) -> SyscallResult<usize> {
    match SyscallError::from_raw(value) {
        Some(err) => Err(err),
        None => Ok(value as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_decode_as_failure() {
        assert_eq!(check(FAILURE), Err(SyscallError::Failed));
        assert_eq!(check(-7), Err(SyscallError::Failed));
    }

    #[test]
    fn non_negative_values_pass_through() {
        assert_eq!(check(0), Ok(0));
        assert_eq!(check(42), Ok(42));
    }
}
