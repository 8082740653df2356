//! # Kernel configuration
//!
//! Compile-time constants governing the scheduler. All table sizes are fixed
//! at build time — there is no heap and no dynamic allocation anywhere in
//! this crate.

/// Maximum number of threads the scheduler can admit.
///
/// Bounds the static TCB table (`[ThreadControlBlock; MAX_THREADS]`). Each
/// slot carries its own `STACK_SIZE`-word stack, so raising this costs RAM
/// linearly. Threads may only be admitted before `launch()`.
pub const MAX_THREADS: usize = 8;

/// Maximum number of periodic events the scheduler can admit.
pub const MAX_PTHREADS: usize = 4;

/// Per-thread stack size in 32-bit words.
///
/// Must be large enough for the deepest call chain the thread makes plus the
/// 16-word synthetic exception frame written at creation (see
/// `task::init_stack`).
pub const STACK_SIZE: usize = 256;

/// SysTick frequency in Hz. One tick is one period of this timer; `Sleep`
/// durations and periodic-event periods are expressed in ticks, which are
/// milliseconds at the default 1 kHz rate.
pub const TICK_HZ: u32 = 1000;
