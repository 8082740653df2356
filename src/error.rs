//! # Kernel error type
//!
//! The kernel distinguishes exactly two admission failures: the thread table
//! is full, or the periodic-event table is full. There is no broader error
//! taxonomy — everything else the kernel cannot detect (entry-procedure
//! return, stack overflow, `SystemTime` wraparound, ...) is simply
//! unspecified behavior, not a reported error.

use core::fmt;

/// Failure returned by the admission calls (`kernel::add_thread`,
/// `kernel::add_periodic_event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// `add_thread` was called with `MAX_THREADS` threads already admitted.
    ThreadTableFull,
    /// `add_periodic_event` was called with `MAX_PTHREADS` events already
    /// admitted.
    PeriodicTableFull,
    /// `launch` was called with no threads admitted. There is nothing for
    /// the scheduler to run.
    NoThreadsAdmitted,
}

impl KernelError {
    /// The legacy numeric code callers historically polled with
    /// `result + 1 == 0`: `ERROR` is `-1`.
    pub const fn as_legacy_code(self) -> i32 {
        RESULT_ERROR
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            KernelError::ThreadTableFull => "thread table is full",
            KernelError::PeriodicTableFull => "periodic event table is full",
            KernelError::NoThreadsAdmitted => "launch called with no threads admitted",
        };
        f.write_str(msg)
    }
}

/// Legacy `SUCCESS` value: numerically `0`.
pub const RESULT_SUCCESS: i32 = 0;

/// Legacy `ERROR` value: numerically `-1`, so that `result + 1 == 0` holds.
pub const RESULT_ERROR: i32 = -1;

/// Convert a kernel `Result` into the legacy numeric convention.
pub fn to_legacy_code<T>(result: Result<T, KernelError>) -> i32 {
    match result {
        Ok(_) => RESULT_SUCCESS,
        Err(e) => e.as_legacy_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_code_matches_polling_convention() {
        assert_eq!(RESULT_SUCCESS + 1, 1);
        assert_eq!(RESULT_ERROR + 1, 0);
    }

    #[test]
    fn to_legacy_code_roundtrips() {
        let ok: Result<usize, KernelError> = Ok(3);
        let err: Result<usize, KernelError> = Err(KernelError::ThreadTableFull);
        assert_eq!(to_legacy_code(ok), RESULT_SUCCESS);
        assert_eq!(to_legacy_code(err), RESULT_ERROR);
    }
}
