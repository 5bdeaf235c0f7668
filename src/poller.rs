//! Bounded data-ready polling.

use embedded_hal::delay::DelayNs;

use crate::config::Polling;
use crate::error::Result;

/// Outcome of [`wait_for_data_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// The device reported data ready on the given (1-based) check.
    Ready {
        /// Number of readiness checks performed.
        attempts: u16,
    },
    /// The retry budget ran out; channel registers may hold stale data.
    TimedOut,
}

impl PollOutcome {
    /// Returns `true` when fresh data is available.
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Calls `is_ready` up to `polling.data_ready_attempts` times, sleeping
/// `polling.data_ready_interval_ms` after every negative answer.
///
/// Returns as soon as the device is ready. Worst case wall time is
/// `attempts × interval` plus the bus time of the checks themselves.
pub fn wait_for_data_ready<D, F, CommE>(
    delay: &mut D,
    polling: &Polling,
    mut is_ready: F,
) -> Result<PollOutcome, CommE>
where
    D: DelayNs + ?Sized,
    F: FnMut() -> Result<bool, CommE>,
{
    for attempt in 1..=polling.data_ready_attempts {
        if is_ready()? {
            trace!("data ready after {} checks", attempt);
            return Ok(PollOutcome::Ready { attempts: attempt });
        }
        delay.delay_ms(polling.data_ready_interval_ms);
    }

    warn!(
        "data not ready after {} checks of {} ms",
        polling.data_ready_attempts, polling.data_ready_interval_ms
    );
    Ok(PollOutcome::TimedOut)
}
