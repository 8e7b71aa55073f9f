//! Monotonic time source used to bound every busy-wait on the chip.
//!
//! Polls are limited by wall-clock deadlines rather than iteration counts, so
//! timeouts do not depend on the MCU or SPI clock speed.

/// Microsecond instant.
pub type Instant = fugit::TimerInstantU64<1_000_000>;
/// Microsecond duration.
pub type Duration = fugit::MicrosDurationU64;

/// A monotonic microsecond clock.
pub trait Clock {
    fn now(&mut self) -> Instant;
}

impl<F> Clock for F
where
    F: FnMut() -> Instant,
{
    fn now(&mut self) -> Instant {
        self()
    }
}

/// Point in time after which a poll gives up.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    expires: Instant,
}

impl Deadline {
    pub fn after<C: Clock>(clock: &mut C, timeout: Duration) -> Self {
        Deadline {
            expires: clock.now() + timeout,
        }
    }

    pub fn expired<C: Clock>(&self, clock: &mut C) -> bool {
        clock.now() >= self.expires
    }
}
