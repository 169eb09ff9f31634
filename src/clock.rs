//! Monotonic time source
//!
//! Receive windows and the join-accept wait are bounded busy-waits measured
//! against a [`Clock`]. On hardware this wraps a free-running timer; in tests
//! a simulated clock makes the same loops deterministic.

use core::time::Duration;

/// Monotonic clock
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin. Must never go backwards.
    fn now(&self) -> Duration;

    /// Time elapsed since `since`
    fn elapsed(&self, since: Duration) -> Duration {
        self.now().saturating_sub(since)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Busy-wait until `ready` reports true or `deadline` (measured from `start`)
/// passes. Returns whether `ready` fired before the deadline.
pub fn wait_until<C, E, F>(
    clock: &C,
    start: Duration,
    deadline: Duration,
    mut ready: F,
) -> Result<bool, E>
where
    C: Clock + ?Sized,
    F: FnMut() -> Result<bool, E>,
{
    loop {
        if ready()? {
            return Ok(true);
        }
        if clock.elapsed(start) >= deadline {
            return Ok(false);
        }
        core::hint::spin_loop();
    }
}
