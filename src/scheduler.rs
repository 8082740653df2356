//! # Scheduler
//!
//! Core scheduling and tick-handling logic. Plain cooperative round robin:
//! no priority, no aging, no time slices. The scheduler's only job is to
//! find the next TCB in the ring that is neither asleep nor blocked.
//!
//! ## Tick sequence
//!
//! Called from the SysTick handler every tick (1 ms by default):
//! 1. Advance `system_time`.
//! 2. Dispatch any periodic event whose `execute_time <= system_time`.
//! 3. Wake any sleeping thread whose `sleep_count == system_time` exactly
//!    (see the module docs on `harden_wake_check` below for the documented
//!    hazard this encodes).
//! 4. Request a reschedule (the caller raises PendSV unconditionally).
//!
//! ## Scheduling algorithm
//!
//! `schedule()` advances `current_task` to its `next` ring neighbour,
//! skipping over any TCB that is asleep or blocked, and stops at the first
//! runnable one. At least one TCB in the ring must always be runnable, or
//! this loops forever — that invariant is the caller's responsibility to
//! maintain (see crate docs).

use crate::config::{MAX_PTHREADS, MAX_THREADS};
use crate::error::KernelError;
use crate::periodic::PeriodicControlBlock;
use crate::task::ThreadControlBlock;

/// The central scheduler state: both static tables, the ready-ring cursor,
/// and the monotonic tick counter. Held as a single global `static mut`
/// (see `kernel.rs`) so that the PendSV/SysTick handlers can reach it
/// without indirection.
pub struct Scheduler {
    /// Fixed-size table of TCBs. Only the first `thread_count` slots
    /// participate in the ring.
    pub tasks: [ThreadControlBlock; MAX_THREADS],

    /// Fixed-size table of PTCBs. Only the first `periodic_count` slots are
    /// live; periodic dispatch iterates this table in order, not via the
    /// ring links.
    pub periodics: [PeriodicControlBlock; MAX_PTHREADS],

    /// Index of the currently running (or, in ISR context, most recently
    /// running) TCB.
    pub current_task: usize,

    /// Number of admitted threads. Monotonic from `init()` to `launch()`;
    /// frozen thereafter.
    pub thread_count: usize,

    /// Number of admitted periodic events. Monotonic from `init()` to
    /// `launch()`; frozen thereafter.
    pub periodic_count: usize,

    /// Monotonically increasing tick counter. Wraparound is unspecified
    /// (spec §7/§9) — this kernel does not guard against it.
    pub system_time: u32,
}

impl Scheduler {
    /// Build a scheduler with empty TCB/PTCB tables and zeroed counters.
    pub const fn new() -> Self {
        Self {
            tasks: [ThreadControlBlock::EMPTY; MAX_THREADS],
            periodics: [PeriodicControlBlock::empty(); MAX_PTHREADS],
            current_task: 0,
            thread_count: 0,
            periodic_count: 0,
            system_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------

    /// Admit a new thread. Appends at index `thread_count` and splices it
    /// into the ring between the current tail (`thread_count - 1`) and head
    /// (`0`); the first thread admitted forms a self-loop.
    ///
    /// Must only be called before `launch()` — admission mutates ring
    /// structure with no synchronization beyond the caller's critical
    /// section, and the running system assumes the ring is stable.
    pub fn create_thread(&mut self, entry: extern "C" fn() -> !) -> Result<usize, KernelError> {
        if self.thread_count >= MAX_THREADS {
            return Err(KernelError::ThreadTableFull);
        }

        let id = self.thread_count;

        if id == 0 {
            self.tasks[id].prev = 0;
            self.tasks[id].next = 0;
        } else {
            self.tasks[id].prev = (id - 1) as u8;
            self.tasks[id].next = 0;
            self.tasks[id - 1].next = id as u8;
            self.tasks[0].prev = id as u8;
        }

        self.tasks[id].asleep = false;
        self.tasks[id].sleep_count = 0;
        self.tasks[id].blocked = false;
        self.tasks[id].init_stack(entry);

        self.thread_count += 1;
        Ok(id)
    }

    /// Admit a new periodic event. `current_time` is set to the creation
    /// index so that events admitted together stagger rather than all
    /// firing on the same tick; `execute_time` is seeded to
    /// `period + current_time` accordingly.
    pub fn create_periodic_event(
        &mut self,
        handler: extern "C" fn(),
        period: u32,
    ) -> Result<usize, KernelError> {
        if self.periodic_count >= MAX_PTHREADS {
            return Err(KernelError::PeriodicTableFull);
        }

        let id = self.periodic_count;
        let current_time = id as u32;

        self.periodics[id] = PeriodicControlBlock {
            handler,
            period,
            execute_time: period + current_time,
            current_time,
            prev: if id == 0 { 0 } else { (id - 1) as u8 },
            next: 0,
        };

        if id == 0 {
            self.periodics[id].next = 0;
        } else {
            self.periodics[id - 1].next = id as u8;
            self.periodics[0].prev = id as u8;
        }

        self.periodic_count += 1;
        Ok(id)
    }

    // -----------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------

    /// Select the next runnable TCB and make it `current_task`. Called
    /// exclusively from the PendSV trampoline, with the outgoing thread's
    /// context already saved.
    ///
    /// O(k) in the number of consecutively non-runnable TCBs encountered.
    /// If every TCB in the ring is asleep or blocked, this never returns —
    /// the invariant that at least one TCB is always runnable must be
    /// upheld by admitted threads (spec §3/§9).
    pub fn schedule(&mut self) -> usize {
        loop {
            let next = self.tasks[self.current_task].next as usize;
            self.current_task = next;
            if self.tasks[next].is_runnable() {
                return next;
            }
        }
    }

    /// Advance system time by one tick, dispatch due periodic events, wake
    /// threads whose sleep deadline has arrived. Called from the SysTick
    /// handler; the caller is responsible for raising PendSV afterwards
    /// (spec §4.3 step 4 is unconditional — unlike a priority scheduler,
    /// this kernel does not skip rescheduling just because nothing looks
    /// different).
    pub fn tick(&mut self) {
        self.system_time += 1;

        self.dispatch_periodic_events();
        self.wake_sleeping_threads();
    }

    fn dispatch_periodic_events(&mut self) {
        for i in 0..self.periodic_count {
            if self.periodics[i].is_due(self.system_time) {
                self.periodics[i].reschedule(self.system_time);
                (self.periodics[i].handler)();
            }
        }
    }

    /// Starting at `current_task`, walk `next` exactly `thread_count` times,
    /// waking any asleep TCB whose `sleep_count` equals `system_time`
    /// exactly.
    ///
    /// This equality check is deliberate, not a bug we forgot to fix: a
    /// tick missed by a long ISR would leave an equality-based sleeper
    /// stranded forever (spec §9, scenario S5). Enable the
    /// `harden_wake_check` feature to switch to `sleep_count <= system_time`
    /// instead, which self-corrects after a missed tick at the cost of
    /// diverging from the original's documented behavior.
    fn wake_sleeping_threads(&mut self) {
        let mut idx = self.current_task;
        for _ in 0..self.thread_count {
            if self.tasks[idx].asleep && Self::wake_due(self.tasks[idx].sleep_count, self.system_time) {
                self.tasks[idx].asleep = false;
                self.tasks[idx].sleep_count = 0;
            }
            idx = self.tasks[idx].next as usize;
        }
    }

    #[cfg(not(feature = "harden_wake_check"))]
    #[inline]
    fn wake_due(sleep_count: u32, system_time: u32) -> bool {
        sleep_count == system_time
    }

    #[cfg(feature = "harden_wake_check")]
    #[inline]
    fn wake_due(sleep_count: u32, system_time: u32) -> bool {
        sleep_count <= system_time
    }

    // -----------------------------------------------------------------
    // Sleep / block
    // -----------------------------------------------------------------

    /// Put the current thread to sleep for `duration` ticks. The caller
    /// (`kernel::sleep`) is responsible for requesting a reschedule
    /// afterwards.
    pub fn sleep_current(&mut self, duration: u32) {
        let current = self.current_task;
        self.tasks[current].sleep_count = self.system_time + duration;
        self.tasks[current].asleep = true;
    }

    /// Mark the current thread blocked. Used by external blocking
    /// primitives (semaphores, FIFOs — out of this kernel's scope); the
    /// scheduler only ever tests the flag this sets.
    pub fn block_current(&mut self) {
        let current = self.current_task;
        self.tasks[current].blocked = true;
    }

    /// Clear a thread's blocked flag, making it runnable again.
    pub fn unblock(&mut self, thread_id: usize) {
        if thread_id < self.thread_count {
            self.tasks[thread_id].blocked = false;
        }
    }

    /// The current task's TCB.
    pub fn current_tcb(&self) -> &ThreadControlBlock {
        &self.tasks[self.current_task]
    }

    /// The current task's TCB, mutably.
    pub fn current_tcb_mut(&mut self) -> &mut ThreadControlBlock {
        &mut self.tasks[self.current_task]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn entry() -> ! {
        loop {}
    }
    extern "C" fn handler() {}

    fn three_thread_scheduler() -> Scheduler {
        let mut s = Scheduler::new();
        s.create_thread(entry).unwrap();
        s.create_thread(entry).unwrap();
        s.create_thread(entry).unwrap();
        s
    }

    // --- Testable property 1/2: ring reachability and symmetry ---

    #[test]
    fn ring_is_symmetric_and_reachable_within_thread_count_steps() {
        let s = three_thread_scheduler();
        for t in 0..s.thread_count {
            assert_eq!(s.tasks[s.tasks[t].next as usize].prev as usize, t);
            assert_eq!(s.tasks[s.tasks[t].prev as usize].next as usize, t);
        }

        let mut idx = 0usize;
        let mut seen = 0;
        loop {
            seen += 1;
            idx = s.tasks[idx].next as usize;
            if idx == 0 {
                break;
            }
            assert!(seen <= s.thread_count, "ring did not close within thread_count steps");
        }
        assert_eq!(seen, s.thread_count);
    }

    #[test]
    fn single_thread_self_loops() {
        let mut s = Scheduler::new();
        s.create_thread(entry).unwrap();
        assert_eq!(s.tasks[0].next, 0);
        assert_eq!(s.tasks[0].prev, 0);
    }

    // --- S1: three-thread round robin ---

    #[test]
    fn three_thread_round_robin_visits_each_exactly_once_per_cycle() {
        let mut s = three_thread_scheduler();
        s.current_task = 0;
        let order = [s.schedule(), s.schedule(), s.schedule()];
        assert_eq!(order, [1, 2, 0]);
        // Testable property 5: fairness — second full cycle repeats exactly.
        let order2 = [s.schedule(), s.schedule(), s.schedule()];
        assert_eq!(order2, [1, 2, 0]);
    }

    // --- S2: sleep correctness ---

    #[test]
    fn sleeping_thread_is_skipped_until_exact_wake_tick() {
        let mut s = three_thread_scheduler();
        s.current_task = 0;
        s.system_time = 5;

        // Thread 0 sleeps for 10 ticks at t=5 -> wakes at t=15.
        s.sleep_current(10);
        assert!(s.tasks[0].asleep);
        assert_eq!(s.tasks[0].sleep_count, 15);

        // Thread 0 must not be selected again until it wakes.
        for t in 6..15 {
            s.system_time = t;
            s.wake_sleeping_threads();
            let next = s.schedule();
            assert_ne!(next, 0, "thread 0 must stay asleep at tick {t}");
            s.current_task = 1; // pretend the other thread is running
        }

        s.system_time = 15;
        s.wake_sleeping_threads();
        assert!(!s.tasks[0].asleep);
        assert_eq!(s.tasks[0].sleep_count, 0);
    }

    // --- S5: wake-equality hazard ---

    #[test]
    #[cfg(not(feature = "harden_wake_check"))]
    fn missed_tick_strands_sleeper_under_default_equality_check() {
        let mut s = three_thread_scheduler();
        s.current_task = 0;
        s.sleep_current(5);
        assert_eq!(s.tasks[0].sleep_count, 5);

        // Simulate a long ISR: system_time jumps from 4 straight to 6,
        // skipping 5 entirely.
        s.system_time = 6;
        s.wake_sleeping_threads();
        assert!(
            s.tasks[0].asleep,
            "default equality check must strand a sleeper past a missed tick"
        );
    }

    #[test]
    #[cfg(feature = "harden_wake_check")]
    fn missed_tick_still_wakes_sleeper_under_hardened_check() {
        let mut s = three_thread_scheduler();
        s.current_task = 0;
        s.sleep_current(5);

        s.system_time = 6;
        s.wake_sleeping_threads();
        assert!(
            !s.tasks[0].asleep,
            "hardened `<=` check must self-correct past a missed tick"
        );
    }

    // --- Testable property 6: SystemTime increments exactly once per tick ---

    #[test]
    fn tick_increments_system_time_exactly_once() {
        let mut s = three_thread_scheduler();
        assert_eq!(s.system_time, 0);
        s.tick();
        assert_eq!(s.system_time, 1);
        s.tick();
        assert_eq!(s.system_time, 2);
    }

    // --- S3: periodic staggering ---

    #[test]
    fn periodic_events_stagger_and_advance_monotonically() {
        let mut s = Scheduler::new();
        s.create_periodic_event(handler, 100).unwrap();
        s.create_periodic_event(handler, 100).unwrap();

        assert_eq!(s.periodics[0].execute_time, 100);
        assert_eq!(s.periodics[1].execute_time, 101);

        for _ in 0..100 {
            s.tick();
        }
        assert_eq!(s.system_time, 100);
        assert_eq!(s.periodics[0].execute_time, 200);
        // P1 hasn't fired yet at t=100 (due at 101).
        assert_eq!(s.periodics[1].execute_time, 101);

        s.tick();
        assert_eq!(s.system_time, 101);
        assert_eq!(s.periodics[1].execute_time, 202);
    }

    // --- S4: admission limits ---

    #[test]
    fn thread_table_full_does_not_mutate_ring() {
        let mut s = Scheduler::new();
        for _ in 0..MAX_THREADS {
            s.create_thread(entry).unwrap();
        }
        let snapshot: [(u8, u8); MAX_THREADS] =
            core::array::from_fn(|i| (s.tasks[i].prev, s.tasks[i].next));

        let result = s.create_thread(entry);
        assert_eq!(result, Err(KernelError::ThreadTableFull));
        for i in 0..MAX_THREADS {
            assert_eq!((s.tasks[i].prev, s.tasks[i].next), snapshot[i]);
        }
    }

    #[test]
    fn periodic_table_full_returns_error() {
        let mut s = Scheduler::new();
        for _ in 0..MAX_PTHREADS {
            s.create_periodic_event(handler, 10).unwrap();
        }
        assert_eq!(
            s.create_periodic_event(handler, 10),
            Err(KernelError::PeriodicTableFull)
        );
    }

    // --- blocked threads are skipped just like asleep ones ---

    #[test]
    fn blocked_thread_is_skipped_until_unblocked() {
        let mut s = three_thread_scheduler();
        s.current_task = 0;
        s.block_current();

        let next = s.schedule();
        assert_ne!(next, 0);

        s.unblock(0);
        assert!(!s.tasks[0].blocked);
    }
}
