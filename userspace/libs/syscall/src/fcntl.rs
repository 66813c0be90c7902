// Flags accepted by `open`

pub const O_RDONLY: usize = 0x000;
pub const O_WRONLY: usize = 0x001;
pub const O_RDWR: usize = 0x002;
/// Create the file when the name is not present yet.
pub const O_CREATE: usize = 0x200;

/// Maximum file name length in bytes, including the terminating NUL.
pub const NAME_LEN: usize = 32;

/// Console descriptors; the file store never hands these out.
pub const STDIN: usize = 0;
pub const STDOUT: usize = 1;
pub const STDERR: usize = 2;
