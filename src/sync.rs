//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstraction for the Cortex-M4. All shared
//! scheduler state must be accessed within a critical section from thread
//! mode to prevent data races with the SysTick/PendSV handlers.

use cortex_m::interrupt;

/// Execute a closure within a critical section (interrupts disabled).
///
/// This is the primary mechanism for safely accessing shared mutable kernel
/// state from thread mode. Interrupts are disabled on entry and restored on
/// exit, making the enclosed operation atomic with respect to SysTick and
/// PendSV.
///
/// # Performance
/// Keep critical sections short — every tick spent here is a tick the
/// SysTick handler is delayed, and SysTick must still fire at `TICK_HZ`.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
