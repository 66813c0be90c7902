// Build Metadata and Versioning
//
// Compile-time identity of the kernel image, used for the boot banner and
// panic diagnostics.
//
// Implementation details:
// - `define_build_meta!` expands into multiple `pub const` string slices
// - Uses `concat!` to build derived strings at compile time
// - The build date is written by hand, keeping builds reproducible

macro_rules! define_build_meta {
    ($kernel_name:literal, $version:literal, $target:literal, $build_date:literal) => {
        #[allow(dead_code)]
        pub const KERNEL_NAME: &str = $kernel_name;
        #[allow(dead_code)]
        pub const VERSION: &str = $version;
        #[allow(dead_code)]
        pub const TARGET: &str = $target;
        #[allow(dead_code)]
        pub const BUILD_DATE: &str = $build_date;

        pub const VERSION_TAG: &str = concat!($kernel_name, " v", $version);
        pub const BOOT_BANNER: &str = concat!(
            $kernel_name,
            " v",
            $version,
            " (",
            $target,
            ", built ",
            $build_date,
            ")"
        );
    };
}

define_build_meta!(
    "Cinder Kernel",
    "0.1.0",
    "riscv64 virt, single hart, Sv39",
    "2026-10-19"
);
