//! # Kernel
//!
//! Top-level kernel initialization and public API. Manages the global
//! scheduler instance and coordinates system startup. Every public function
//! here that touches shared state does so inside a critical section.
//!
//! ## Startup sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()             ← zero scheduler state
//!         ├─► kernel::add_thread()       ← admit threads (×N)
//!         ├─► kernel::add_periodic_event() ← admit periodic events (×M)
//!         └─► kernel::launch()           ← never returns on success
//!               ├─► configure SysTick
//!               ├─► set PendSV/SysTick priorities
//!               └─► arch::cortex_m4::start_first_task()
//! ```

use crate::arch::cortex_m4;
use crate::error::KernelError;
use crate::scheduler::Scheduler;
use crate::sync;

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// The global scheduler instance.
///
/// # Safety
/// Accessed via `SCHEDULER_PTR`, set once by `init()`. All access from
/// thread mode goes through a critical section; access from the SysTick/
/// PendSV handlers is implicitly serialized by their interrupt priorities.
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the global scheduler, used by the arch layer (PendSV,
/// SysTick) which cannot easily hold a safe reference across an `extern "C"`
/// boundary.
///
/// # Safety
/// Set once by `init()`, read from ISR context thereafter.
#[no_mangle]
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel: zero `SystemTime`, the thread count, and the
/// periodic-event count, and publish `SCHEDULER_PTR` for ISR access. Must be
/// called exactly once, before any other kernel function.
pub fn init() {
    unsafe {
        SCHEDULER = Scheduler::new();
        SCHEDULER_PTR = &mut SCHEDULER as *mut Scheduler;
    }
    log::info!("kernel initialized");
}

/// Admit a new thread, to be scheduled round robin alongside every other
/// admitted thread. `entry` must never return — returning from a thread's
/// entry procedure is undefined behavior (spec §7).
///
/// Must only be called before `launch()`.
///
/// # Errors
/// `KernelError::ThreadTableFull` if `config::MAX_THREADS` threads are
/// already admitted. The table is left unmodified on failure.
pub fn add_thread(entry: extern "C" fn() -> !) -> Result<usize, KernelError> {
    let result = sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).create_thread(entry) });
    match result {
        Ok(id) => log::debug!("thread {id} admitted"),
        Err(e) => log::warn!("add_thread failed: {e}"),
    }
    result
}

/// Admit a new periodic event. `handler` runs in SysTick-interrupt context
/// every `period` ticks — it must not block, sleep, or call `add_thread`,
/// `sleep`, or `block_current` (there is no thread context to suspend in an
/// ISR).
///
/// Must only be called before `launch()`.
///
/// # Errors
/// `KernelError::PeriodicTableFull` if `config::MAX_PTHREADS` events are
/// already admitted.
pub fn add_periodic_event(handler: extern "C" fn(), period: u32) -> Result<usize, KernelError> {
    let result =
        sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).create_periodic_event(handler, period) });
    match result {
        Ok(id) => log::debug!("periodic event {id} admitted, period {period}"),
        Err(e) => log::warn!("add_periodic_event failed: {e}"),
    }
    result
}

/// Put the calling thread to sleep for `duration_ticks` ticks and
/// immediately request a reschedule. The calling thread resumes exactly
/// where it yielded once `SystemTime` reaches its wake deadline (subject to
/// the documented wake-equality hazard — see `scheduler::Scheduler::tick`).
pub fn sleep(duration_ticks: u32) {
    sync::critical_section(|_cs| unsafe {
        (*SCHEDULER_PTR).sleep_current(duration_ticks);
    });
    cortex_m4::request_reschedule();
}

/// Mark the calling thread blocked. This is the narrow interface external
/// blocking primitives (semaphores, FIFOs) are built on — the scheduler
/// never inspects *why* a thread is blocked, only that it is. Requests a
/// reschedule immediately, same as `sleep`.
pub fn block_current() {
    sync::critical_section(|_cs| unsafe {
        (*SCHEDULER_PTR).block_current();
    });
    cortex_m4::request_reschedule();
}

/// Clear a thread's blocked flag, making it eligible for scheduling again.
/// Called by external blocking primitives when the condition a thread was
/// waiting on becomes true. Requests a reschedule so the newly-runnable
/// thread is considered promptly.
pub fn unblock(thread_id: usize) {
    sync::critical_section(|_cs| unsafe {
        (*SCHEDULER_PTR).unblock(thread_id);
    });
    cortex_m4::request_reschedule();
}

/// Start the kernel. **Does not return**, except on the one detectable
/// failure: no threads were ever admitted.
///
/// Configures SysTick from `system_clock_hz`, sets PendSV and SysTick to
/// their required NVIC priorities, and launches the first admitted thread.
///
/// # Safety
/// `init()` must have been called, and this must be called from thread mode
/// before interrupts that touch the scheduler are otherwise active.
pub fn launch(mut core_peripherals: cortex_m::Peripherals, system_clock_hz: u32) -> KernelError {
    let first_sp = sync::critical_section(|_cs| unsafe {
        let scheduler = &mut *SCHEDULER_PTR;
        if scheduler.thread_count == 0 {
            return None;
        }
        scheduler.current_task = 0;
        scheduler.tasks[0].sp as *const u32
    });

    let Some(first_sp) = first_sp else {
        log::warn!("launch called with no threads admitted");
        return KernelError::NoThreadsAdmitted;
    };

    cortex_m4::configure_systick(&mut core_peripherals.SYST, system_clock_hz);
    cortex_m4::set_interrupt_priorities();

    log::info!("launching scheduler, {system_clock_hz} Hz system clock");

    unsafe {
        cortex_m4::start_first_task(first_sp);
    }
}
