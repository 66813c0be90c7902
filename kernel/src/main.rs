// Kernel entry point and system initialization
//
// QEMU `virt` with `-bios none` jumps to 0x8000_0000 in machine mode on
// every hart. `_entry` parks all harts but hart 0, clears `.bss`, switches
// to the boot stack from `linker.ld` and calls `kmain`.
//
// Initialization order:
// - Console and logging, then the boot banner
// - Physical page allocator, kernel page table, paging on (`satp`)
// - Page allocator self-test
// - Trap vector, first timer deadline, interrupt enables
// - Init process creation
// - Hand-off to the scheduler, which never returns
//
// Failures during memory bring-up or init creation halt the hart. The panic
// handler logs the message and halts as well.

#![cfg_attr(all(target_arch = "riscv64", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "riscv64", target_os = "none"), no_main)]

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod kernel {
    use core::panic::PanicInfo;

    use cinder::config::MemoryLayout;
    use cinder::mm::{self, pmm};
    use cinder::{arch, build_info, console, init_process, interrupts, log, sched};
    use cinder::{log_error, log_info, log_panic};

    const LOG_KERNEL_INIT: &str = "kernel:init";
    const LOG_MM: &str = "mm";
    const LOG_INIT_PROC: &str = "init";

    core::arch::global_asm!(
        ".section .text.entry",
        ".globl _entry",
        "_entry:",
        "    csrr t0, mhartid",
        "    bnez t0, 3f",
        "    la t0, __bss_start",
        "    la t1, __bss_end",
        "1:",
        "    bgeu t0, t1, 2f",
        "    sd zero, 0(t0)",
        "    addi t0, t0, 8",
        "    j 1b",
        "2:",
        "    la sp, __boot_stack_top",
        "    call kmain",
        "3:",
        "    wfi",
        "    j 3b",
    );

    #[no_mangle]
    pub extern "C" fn kmain() -> ! {
        console::init();
        console::clear_screen();
        log::init();

        log_info!(LOG_KERNEL_INIT, "{}", build_info::BOOT_BANNER);

        let layout = MemoryLayout::from_linker();
        log_info!(
            LOG_MM,
            "kernel image [{:#x}, {:#x}), text ends at {:#x}",
            layout.kernel_base,
            layout.kernel_end,
            layout.text_end
        );

        if let Err(err) = unsafe { mm::init(&layout) } {
            log_panic!(LOG_MM, "memory bring-up failed: {:?}", err);
            arch::halt_forever();
        }

        if pmm::self_test() {
            log_info!(LOG_MM, "PMM self-test passed");
        } else {
            log_error!(LOG_MM, "PMM self-test failed");
        }

        let stats = pmm::stats();
        log_info!(LOG_MM, "PMM: {}/{} pages free", stats.free_pages, stats.total_pages);

        interrupts::init();

        match init_process::launch() {
            Ok(pid) => log_info!(LOG_INIT_PROC, "init process created (pid={})", pid),
            Err(err) => {
                log_panic!(LOG_INIT_PROC, "cannot create init: {:?}", err);
                arch::halt_forever();
            }
        }

        log_info!(LOG_KERNEL_INIT, "Handing over to scheduler.");
        sched::run_scheduler()
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        log_panic!("PANIC", "{}", info);
        arch::halt_forever()
    }
}

#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
fn main() {
    println!("{}", cinder::build_info::BOOT_BANNER);
}
