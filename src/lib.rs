//! # A preemptive round-robin RTOS kernel for ARM Cortex-M4
//!
//! ## Overview
//!
//! A single-core, memory-unprotected, priority-less real-time kernel: a
//! fixed-size table of cooperatively round-robin-scheduled threads, a
//! staggered periodic-event dispatcher, and `Sleep`, all driven by a 1 kHz
//! SysTick tick and a PendSV context-switch trampoline.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Threads                  │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   init() · add_thread() · add_periodic_event()          │
//! │   sleep() · block_current() · unblock() · launch()      │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │  Periodic events   │  Sync primitives  │
//! │  scheduler.rs│  periodic.rs       │  sync.rs          │
//! │  ─ tick()    │  ─ is_due()        │  ─ critical_section│
//! │  ─ schedule()│  ─ reschedule()    │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │            Thread model (task.rs)                       │
//! │    ThreadControlBlock · ready ring · synthetic frame     │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch port (arch/cortex_m4.rs)                │
//! │    PendSV · SysTick · context switch · stack init       │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 hardware (Thumb-2)                 │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling model
//!
//! There is no priority and no time slice. `Scheduler::schedule` always
//! advances to the next TCB in the ready ring and skips it only if it is
//! asleep or blocked. A thread's only two states beyond "running" are
//! `asleep` (set by `sleep`, cleared by the tick handler at the exact wake
//! tick) and `blocked` (set/cleared only by an external collaborator, e.g. a
//! semaphore — out of this crate's scope; see `kernel::block_current`).
//!
//! At least one admitted thread must always be runnable. If every thread is
//! asleep or blocked at once, `Scheduler::schedule` spins forever — this
//! invariant is the application's responsibility, not the kernel's.
//!
//! ## Memory model
//!
//! - No heap, no `alloc` — pure `core`, static tables only.
//! - `[ThreadControlBlock; MAX_THREADS]`, each with an inline
//!   `[u32; STACK_SIZE]` stack.
//! - `[PeriodicControlBlock; MAX_PTHREADS]`.
//! - All admission happens before `launch()`; nothing is ever freed.
//!
//! ## Cargo features
//!
//! - `harden_wake_check` (default off): changes the tick handler's sleep
//!   wake condition from `sleep_count == SystemTime` to
//!   `sleep_count <= SystemTime`, hardening against a long interrupt service
//!   routine causing a missed wake tick, at the cost of diverging from the
//!   documented original behavior. See `scheduler::Scheduler::tick`.

#![no_std]

pub mod arch;
pub mod config;
pub mod error;
pub mod kernel;
pub mod periodic;
pub mod scheduler;
pub mod sync;
pub mod task;
