use std::{
    cell::Cell,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

pub const TICKS_PER_SECOND: u64 = 60;

/// Source of the interpreter's 60 Hz tick count.
pub trait Clock {
    fn ticks(&self) -> u32;
}

/// Wall-clock ticks counted from the Unix epoch, wrapping at `u32::MAX`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn ticks(&self) -> u32 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis());
        (millis * TICKS_PER_SECOND as u128 / 1000) as u32
    }
}

/// A clock advanced by hand. Clones share the same tick count.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    ticks: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks: Rc::new(Cell::new(ticks)),
        }
    }

    pub fn set(&self, ticks: u32) {
        self.ticks.set(ticks);
    }

    pub fn advance(&self, ticks: u32) {
        self.ticks.set(self.ticks.get().wrapping_add(ticks));
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u32 {
        self.ticks.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared() {
        let clock = ManualClock::new(5);
        let handle = clock.clone();
        handle.advance(10);
        assert_eq!(clock.ticks(), 15);
        clock.set(2);
        assert_eq!(handle.ticks(), 2);
    }

    #[test]
    fn system_clock_counts_from_epoch() {
        // Right after start-up the count is already far from the fresh-palette timestamp.
        let clock = SystemClock::new();
        assert_ne!(clock.ticks(), 0);
    }
}
