//! # Periodic Event Table
//!
//! A periodic event is a zero-argument handler invoked from tick-interrupt
//! context at a fixed period. Periodic handlers run to completion inside the
//! SysTick ISR — they must not block, sleep, or yield, since there is no
//! thread context to suspend there.

/// Periodic Thread Control Block — the per-periodic-event kernel record.
#[derive(Clone, Copy)]
pub struct PeriodicControlBlock {
    /// Zero-argument handler invoked when this event comes due. Runs in
    /// tick-interrupt context.
    pub handler: extern "C" fn(),

    /// Inter-execution interval, in ticks.
    pub period: u32,

    /// Absolute tick at which this event is next due.
    pub execute_time: u32,

    /// Creation-order index, fixed at admission time. Used only to offset
    /// `execute_time` at creation so that events admitted together first
    /// fire on staggered ticks instead of all at once.
    pub current_time: u32,

    /// Index of the previous PTCB in the periodic ring.
    pub prev: u8,

    /// Index of the next PTCB in the periodic ring.
    ///
    /// Maintained for structural symmetry with the TCB ring, but never
    /// walked: the tick handler dispatches periodic events in table order,
    /// not by following this link.
    pub next: u8,
}

impl PeriodicControlBlock {
    extern "C" fn noop() {}

    /// An empty, unlinked PTCB. Used to fill the static table before any
    /// periodic event is admitted.
    pub const fn empty() -> Self {
        Self {
            handler: Self::noop,
            period: 0,
            execute_time: 0,
            current_time: 0,
            prev: 0,
            next: 0,
        }
    }

    /// Whether this event is due: `execute_time <= now`. `<=` rather than
    /// `==` so that transient tick-handler lateness self-corrects instead of
    /// permanently missing the event (contrast with the TCB wake check in
    /// `scheduler::Scheduler::tick`, which intentionally uses `==`).
    #[inline]
    pub fn is_due(&self, now: u32) -> bool {
        self.execute_time <= now
    }

    /// Advance `execute_time` by one period, anchored to the tick at which
    /// this dispatch happened: `execute_time' = period + now + current_time`.
    /// Matches the original scheduler's arithmetic — it is *not*
    /// `execute_time + period`, so a late dispatch does not compound: the
    /// next deadline is computed from `now`, not from the missed deadline.
    #[inline]
    pub fn reschedule(&mut self, now: u32) {
        self.execute_time = self.period + now + self.current_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn handler() {}

    fn make(period: u32, current_time: u32) -> PeriodicControlBlock {
        let mut p = PeriodicControlBlock::empty();
        p.handler = handler;
        p.period = period;
        p.current_time = current_time;
        p.execute_time = period + current_time;
        p
    }

    #[test]
    fn stagger_offsets_first_invocation() {
        // S3: P0(period=100, current_time=0), P1(period=100, current_time=1)
        let p0 = make(100, 0);
        let p1 = make(100, 1);
        assert_eq!(p0.execute_time, 100);
        assert_eq!(p1.execute_time, 101);
    }

    #[test]
    fn reschedule_advances_monotonically_from_dispatch_tick() {
        let mut p0 = make(100, 0);
        assert!(p0.is_due(100));
        p0.reschedule(100);
        assert_eq!(p0.execute_time, 200);

        let mut p1 = make(100, 1);
        assert!(p1.is_due(101));
        p1.reschedule(101);
        assert_eq!(p1.execute_time, 202);
    }

    #[test]
    fn due_uses_less_equal_and_self_corrects_after_lateness() {
        let mut p = make(1, 0);
        assert!(p.is_due(1));
        // Tick handler runs late; by the time it checks, `now` has already
        // jumped past `execute_time` by more than one period.
        p.reschedule(5);
        assert_eq!(p.execute_time, 6);
        assert!(!p.is_due(5));
        assert!(p.is_due(6));
    }
}
