use crate::palette::Palette;

/// Number of steps between the origin and the target palette.
pub const VARY_STEPS: i16 = 64;

/// An active palette vary: a timed blend from the palette at start-up to a target palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarySession {
    pub(crate) resource_id: u16,
    pub(crate) origin: Palette,
    pub(crate) target: Palette,
    pub(crate) step: i16,
    pub(crate) step_stop: i16,
    pub(crate) direction: i16,
    pub(crate) ticks: u16,
    pub(crate) paused: i32,
    pub(crate) signal: i32,
    /// Whether the tick source should keep raising the signal.
    pub(crate) timer_armed: bool,
}

impl VarySession {
    pub(crate) fn new(
        resource_id: u16,
        origin: Palette,
        target: Palette,
        ticks: u16,
        step_stop: u16,
        direction: i16,
    ) -> Self {
        Self {
            resource_id,
            origin,
            target,
            step: 1,
            step_stop: step_stop as i16,
            // Without ticks the blend jumps straight to its end.
            direction: if ticks == 0 {
                step_stop as i16
            } else {
                direction
            },
            ticks,
            paused: 0,
            signal: 0,
            timer_armed: true,
        }
    }

    pub fn resource_id(&self) -> u16 {
        self.resource_id
    }

    pub fn step(&self) -> i16 {
        self.step
    }

    pub fn step_stop(&self) -> i16 {
        self.step_stop
    }

    pub fn direction(&self) -> i16 {
        self.direction
    }

    pub fn is_paused(&self) -> bool {
        self.paused != 0
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// The step as scripts see it, negative while moving backwards.
    pub fn current_step(&self) -> i16 {
        if self.direction >= 0 {
            self.step
        } else {
            -self.step
        }
    }

    /// Ticks between signal increments while the timer is armed.
    pub fn timer_interval(&self) -> u16 {
        self.ticks.max(1)
    }

    /// Moves `signal` steps in the current direction, clamped at the stop step.
    pub(crate) fn advance(&mut self, signal: i32) {
        let step_change = (signal as i16).wrapping_mul(self.direction);

        self.step = self.step.wrapping_add(step_change);
        if step_change > 0 {
            if self.step > self.step_stop {
                self.step = self.step_stop;
            }
        } else if self.step < self.step_stop && signal != 0 {
            self.step = self.step_stop;
        }

        if self.step == self.step_stop {
            self.timer_armed = false;
        }
    }

    pub(crate) fn increase_signal(&mut self) {
        if self.timer_armed && self.paused == 0 {
            self.signal += 1;
        }
    }

    pub(crate) fn take_signal(&mut self) -> i32 {
        std::mem::take(&mut self.signal)
    }

    pub(crate) fn pause(&mut self, pause: bool) {
        // Pauses nest: each pause needs its own resume.
        if pause {
            self.paused += 1;
        } else if self.paused > 0 {
            self.paused -= 1;
        }
    }

    pub(crate) fn reverse(&mut self, ticks: i16, step_stop: u16, direction: i16) {
        if self.step > VARY_STEPS {
            self.step = VARY_STEPS;
        }
        if ticks != -1 {
            self.ticks = ticks as u16;
        }
        self.step_stop = step_stop as i16;
        self.direction = if direction != -1 {
            -direction
        } else {
            -self.direction
        };

        if self.ticks == 0 {
            self.direction = self.step_stop - self.step;
        }
        self.timer_armed = true;
    }

    pub(crate) fn change_ticks(&mut self, ticks: u16) {
        self.ticks = ticks;
        if self.step != self.step_stop {
            self.timer_armed = true;
        }
    }

    /// Writes the blend for the current step into slots 1-254 of `palette`.
    ///
    /// Returns whether any slot changed.
    pub(crate) fn blend_into(&self, palette: &mut Palette) -> bool {
        let mut changed = false;

        for slot in 1..255 {
            let origin = &self.origin.colors[slot];
            let target = &self.target.colors[slot];
            let current = &mut palette.colors[slot];

            let mut inbetween = *current;
            inbetween.r = blend_channel(origin.r, target.r, self.step);
            inbetween.g = blend_channel(origin.g, target.g, self.step);
            inbetween.b = blend_channel(origin.b, target.b, self.step);

            if inbetween != *current {
                *current = inbetween;
                changed = true;
            }
        }

        changed
    }
}

fn blend_channel(origin: u8, target: u8, step: i16) -> u8 {
    let difference = target as i32 - origin as i32;
    (difference * step as i32 / VARY_STEPS as i32 + origin as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Color;

    fn session(ticks: u16, step_stop: u16, direction: i16) -> VarySession {
        let mut origin = Palette::system();
        let mut target = Palette::system();
        origin.colors[1] = Color::used(0, 100, 200);
        target.colors[1] = Color::used(64, 36, 200);
        VarySession::new(1, origin, target, ticks, step_stop, direction)
    }

    #[test]
    fn channel_blend() {
        assert_eq!(blend_channel(0, 64, 0), 0);
        assert_eq!(blend_channel(0, 64, 32), 32);
        assert_eq!(blend_channel(0, 64, 64), 64);
        // Truncates toward zero in both directions.
        assert_eq!(blend_channel(100, 0, 1), 99);
        assert_eq!(blend_channel(0, 100, 1), 1);
        assert_eq!(blend_channel(255, 0, 64), 0);
    }

    #[test]
    fn advance_clamps_at_stop() {
        let mut vary = session(1, 64, 1);
        assert_eq!(vary.step(), 1);
        let mut previous = vary.step();
        for _ in 0..10 {
            vary.advance(8);
            assert!(vary.step() >= previous);
            assert!(vary.step() <= 64);
            previous = vary.step();
        }
        assert_eq!(vary.step(), 64);
        assert!(!vary.is_timer_armed());
    }

    #[test]
    fn retracting_snaps_to_stop() {
        let mut vary = session(1, 64, 1);
        vary.advance(64);
        vary.reverse(-1, 0, -1);
        assert_eq!(vary.direction(), -1);
        assert_eq!(vary.current_step(), -64);
        vary.advance(60);
        assert_eq!(vary.step(), 4);
        vary.advance(60);
        assert_eq!(vary.step(), 0);
        assert!(!vary.is_timer_armed());
    }

    #[test]
    fn zero_signal_keeps_step() {
        let mut vary = session(1, 10, 1);
        vary.advance(0);
        assert_eq!(vary.step(), 1);
        assert!(vary.is_timer_armed());
    }

    #[test]
    fn no_ticks_jumps_to_end() {
        let mut vary = session(0, 48, 1);
        assert_eq!(vary.direction(), 48);
        vary.advance(1);
        assert_eq!(vary.step(), 48);
        assert_eq!(vary.timer_interval(), 1);
    }

    #[test]
    fn pause_nests() {
        let mut vary = session(1, 64, 1);
        vary.pause(true);
        vary.pause(true);
        vary.increase_signal();
        vary.pause(false);
        assert!(vary.is_paused());
        vary.pause(false);
        vary.pause(false);
        assert!(!vary.is_paused());
        vary.increase_signal();
        vary.increase_signal();
        assert_eq!(vary.take_signal(), 2);
        assert_eq!(vary.take_signal(), 0);
    }

    #[test]
    fn blend_leaves_reserved_slots() {
        let mut vary = session(1, 64, 1);
        vary.step = 32;
        let mut palette = Palette::system();
        palette.colors[1] = Color::used(0, 100, 200);

        assert!(vary.blend_into(&mut palette));
        assert_eq!(palette.colors[1], Color::used(32, 68, 200));
        assert_eq!(palette.colors[0], Color::used(0, 0, 0));
        assert_eq!(palette.colors[255], Color::used(255, 255, 255));
        assert!(!vary.blend_into(&mut palette));
    }
}
