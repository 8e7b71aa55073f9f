use arduino_hal::pac::TC1;
use rc522_iso14443a::{Clock, Instant};

/// 16 MHz / 64: one TC1 tick every 4 us
const MICROS_PER_TICK: u64 = 4;

/// Free-running TC1 widened to 64 bits.
///
/// Overflows are counted when `now` notices the counter went backwards, so it
/// has to be read at least every 262 ms. The driver polls far more often.
pub struct Tc1Clock {
    tc1: TC1,
    last: u16,
    wraps: u64,
}

impl Tc1Clock {
    pub fn new(tc1: TC1) -> Self {
        tc1.tccr1b.write(|w| w.cs1().prescale_64());
        Tc1Clock {
            tc1,
            last: 0,
            wraps: 0,
        }
    }
}

impl Clock for Tc1Clock {
    fn now(&mut self) -> Instant {
        let count = self.tc1.tcnt1.read().bits();
        if count < self.last {
            self.wraps += 1;
        }
        self.last = count;
        Instant::from_ticks(((self.wraps << 16) | u64::from(count)) * MICROS_PER_TICK)
    }
}
