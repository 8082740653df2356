//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor: the
//! PendSV context-switch trampoline, SysTick configuration and handler, and
//! NVIC priority setup. This is the one file in the crate that has to know
//! about the platform's exception-return convention; everything else stays
//! portable.
//!
//! ## Context switch mechanism
//!
//! The Cortex-M4 uses a split-stack model:
//! - **MSP** (Main Stack Pointer): used by the kernel and all exception
//!   handlers.
//! - **PSP** (Process Stack Pointer): used by threads in Thread mode.
//!
//! On exception entry, hardware automatically stacks R0-R3, R12, LR, PC and
//! xPSR onto the active stack (PSP, for a thread-mode interruption). PendSV
//! manually saves and restores R4-R11, completing the full register file
//! save/restore around the scheduling decision.
//!
//! ## Interrupt priorities
//!
//! Per spec: PendSV is set to the lowest priority in the system, so it only
//! ever runs once every higher-priority interrupt — including SysTick —
//! has drained. SysTick is set one priority tier above PendSV so the tick
//! handler always completes atomically with respect to a context switch in
//! progress (`kernel::launch` sets both explicitly; the original left
//! SysTick's priority to the NVIC reset default, which this port fixes
//! explicitly rather than preserving it).

use core::arch::asm;
use cortex_m::peripheral::syst::SystClkSource;

use crate::config::TICK_HZ;

/// Lowest possible priority on a Cortex-M4 with an 8-bit priority field.
const LOWEST_PRIORITY: u8 = 0xFF;

/// One tier above the lowest priority — used for SysTick so it always
/// completes before PendSV can run.
const SYSTICK_PRIORITY: u8 = 0xF0;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the scheduler's 1 kHz (by default) tick,
/// given the system clock frequency in Hz.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST, system_clock_hz: u32) {
    let reload = system_clock_hz / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Reschedule request
// ---------------------------------------------------------------------------

/// Request a context switch by setting PENDSVSET in the Interrupt Control
/// and State Register (`0xE000_ED04`, bit 28). This is the mechanism
/// `kernel::sleep`, `kernel::unblock`, and the SysTick handler all use to
/// defer the actual register save/restore to PendSV.
#[inline]
pub fn request_reschedule() {
    const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
    unsafe {
        core::ptr::write_volatile(ICSR, 1 << 28);
    }
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set PendSV to the lowest interrupt priority and SysTick one tier above
/// it, via System Handler Priority Register 3 (`SHPR3`, `0xE000_ED20`):
/// bits `[23:16]` hold the PendSV priority, bits `[31:24]` hold SysTick's.
pub fn set_interrupt_priorities() {
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    unsafe {
        let mut val = core::ptr::read_volatile(SHPR3);
        val &= !(0xFFu32 << 16);
        val &= !(0xFFu32 << 24);
        val |= (LOWEST_PRIORITY as u32) << 16;
        val |= (SYSTICK_PRIORITY as u32) << 24;
        core::ptr::write_volatile(SHPR3, val);
    }
}

// ---------------------------------------------------------------------------
// First task launch
// ---------------------------------------------------------------------------

/// Start the first thread by switching Thread mode onto PSP and branching
/// into its entry point via a fake exception return. Called exactly once,
/// from `kernel::launch`, and never returns.
///
/// `psp` must point at the bottom of a 16-word synthetic frame laid out the
/// way `task::ThreadControlBlock::init_stack` builds it: 8 software-saved
/// words (R4-R11, discarded here) followed by the 8-word hardware frame
/// (R0-R3, R12, LR, PC, xPSR).
///
/// # Safety
/// Must only be called once, with a valid stack pointer into an admitted
/// thread's stack, before interrupts are enabled.
pub unsafe fn start_first_task(psp: *const u32) -> ! {
    asm!(
        // Skip the 8 software-saved words; land on the hardware frame.
        "adds r0, #32",
        "msr psp, r0",

        // Thread mode now runs on PSP (CONTROL.SPSEL = 1).
        "movs r0, #2",
        "msr control, r0",
        "isb",

        // Manually pop the hardware frame — we aren't really returning from
        // an exception, there's no real one to return from yet.
        "pop {{r0-r3, r12}}",
        "pop {{r4}}",          // LR — discarded, thread entry is `-> !`
        "pop {{r5}}",          // PC — thread entry point
        "pop {{r6}}",          // xPSR — discarded, hardware sets this itself

        "cpsie i",
        "bx r5",

        in("r0") psp,
        options(noreturn)
    );
}

// ---------------------------------------------------------------------------
// PendSV handler (context switch)
// ---------------------------------------------------------------------------

/// PendSV exception handler — the context-switch trampoline.
///
/// 1. Push R4-R11 onto the outgoing thread's stack (PSP).
/// 2. Store the updated PSP into the outgoing TCB.
/// 3. Call `Scheduler::schedule` to pick the next TCB.
/// 4. Load the incoming TCB's saved PSP.
/// 5. Pop R4-R11 from the incoming thread's stack.
/// 6. Exception-return; hardware pops R0-R3, R12, LR, PC, xPSR and resumes
///    in Thread mode at the incoming thread's PC.
///
/// # Safety
/// Naked function called directly by the NVIC. Must follow the exact
/// Cortex-M4 exception entry/exit convention — there is no prologue/epilogue
/// to rely on.
#[no_mangle]
#[naked]
pub unsafe extern "C" fn PendSV() {
    asm!(
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11}}",

        "bl {save_context}",
        "bl {do_schedule}",

        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",

        "ldr r0, =0xFFFFFFFD",
        "bx r0",

        save_context = sym save_current_context,
        do_schedule = sym do_context_switch,
        options(noreturn)
    );
}

/// Store the outgoing thread's updated stack pointer into its TCB. Called
/// from `PendSV`'s assembly with interrupts already disabled (PendSV is the
/// lowest-priority exception, so nothing else can run concurrently here).
///
/// # Safety
/// Called only from the `PendSV` assembly, with a valid saved-context
/// pointer in `r0`.
#[no_mangle]
unsafe extern "C" fn save_current_context(psp: *mut u32) {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    let current = scheduler.current_task;
    scheduler.tasks[current].sp = psp;
}

/// Run the scheduler and return the incoming thread's saved stack pointer.
/// Called from `PendSV`'s assembly.
///
/// # Safety
/// Called only from the `PendSV` assembly.
#[no_mangle]
unsafe extern "C" fn do_context_switch() -> *mut u32 {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    let next = scheduler.schedule();
    scheduler.tasks[next].sp
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler — the scheduler's tick entry point. Advances
/// system time, dispatches periodic events, wakes sleeping threads, and
/// unconditionally requests a reschedule (spec §4.3 step 4 — this kernel has
/// no `needs_reschedule` gate to skip it).
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    scheduler.tick();
    request_reschedule();
}
